//! Selection & transform: handle attachment, corner resize, step moves.
//!
//! Resize is computed from the geometry captured when the gesture began plus
//! the total pointer delta, never by accumulating per-frame deltas, so a long
//! drag cannot drift. With an aspect lock the dominant axis wins and the
//! other is derived from the ratio captured when the handles were attached.
//! Dragging a left/top anchor compensates the position so the opposite edge
//! stays fixed.

use crate::input::InputEvent;
use crate::sync::{GraphMutation, SyncEngine};
use crate::tools::Tool;
use stage_core::id::NodeId;
use stage_core::model::*;
use stage_core::{SceneError, SceneResult};

/// Direction of a step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit delta in stage coordinates (y grows downward).
    pub fn delta(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// New bounds after dragging `anchor` of `start` by (dx, dy).
///
/// `ratio` is `Some(width / height)` when the aspect ratio is locked.
pub fn resize_from_anchor(
    start: Bounds,
    anchor: Anchor,
    dx: f32,
    dy: f32,
    ratio: Option<f32>,
) -> Bounds {
    let (sx, sy) = anchor.signs();
    let raw_dw = dx * sx;
    let raw_dh = dy * sy;
    let mut w = start.width + raw_dw;
    let mut h = start.height + raw_dh;

    if let Some(r) = ratio.filter(|r| r.is_finite() && *r > 0.0) {
        // Dominant axis wins; compare in width units.
        if raw_dw.abs() >= (raw_dh * r).abs() {
            h = w / r;
        } else {
            w = h * r;
        }
        // Smallest box with this ratio whose short side is MIN_DIMENSION.
        let (min_w, min_h) = if r >= 1.0 {
            (MIN_DIMENSION * r, MIN_DIMENSION)
        } else {
            (MIN_DIMENSION, MIN_DIMENSION / r)
        };
        if w < min_w || h < min_h {
            w = min_w;
            h = min_h;
        }
    } else {
        w = w.max(MIN_DIMENSION);
        h = h.max(MIN_DIMENSION);
    }

    let x = if sx < 0.0 { start.x + start.width - w } else { start.x };
    let y = if sy < 0.0 { start.y + start.height - h } else { start.y };
    Bounds::new(x, y, w, h)
}

// ─── Resize Tool ─────────────────────────────────────────────────────────

/// Text being resized: its height follows the font size.
#[derive(Debug, Clone)]
struct TextResize {
    content: String,
    font_size: f32,
}

/// A corner-drag gesture on the attached handles.
pub struct ResizeTool {
    owner: NodeId,
    anchor: Anchor,
    origin: (f32, f32),
    start: Bounds,
    ratio: Option<f32>,
    text: Option<TextResize>,
}

impl ResizeTool {
    /// Begin dragging `anchor` of the handles' owner from (px, py).
    pub fn begin(
        graph: &SceneGraph,
        handles: &TransformHandles,
        anchor: Anchor,
        px: f32,
        py: f32,
    ) -> SceneResult<Self> {
        let node = graph
            .get_by_id(handles.owner)
            .ok_or(SceneError::NodeNotFound(handles.owner))?;
        let text = match &node.kind {
            NodeKind::Text { content, font_size } => Some(TextResize {
                content: content.clone(),
                font_size: *font_size,
            }),
            _ => None,
        };
        log::debug!("resize @{} from {}", handles.owner, anchor.name());
        Ok(Self {
            owner: handles.owner,
            anchor,
            origin: (px, py),
            start: node.bounds(),
            ratio: handles
                .options
                .keep_aspect_ratio
                .then_some(handles.ratio),
            text,
        })
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    fn resize_to(&self, px: f32, py: f32) -> Vec<GraphMutation> {
        let (dx, dy) = (px - self.origin.0, py - self.origin.1);
        let target = resize_from_anchor(self.start, self.anchor, dx, dy, self.ratio);

        match &self.text {
            None => vec![GraphMutation::SetGeometry {
                id: self.owner,
                geometry: PartialGeometry::from_bounds(target),
            }],
            Some(text) => {
                let scale = target.height / self.start.height.max(MIN_DIMENSION);
                let font_size = (text.font_size * scale).max(MIN_FONT_SIZE);
                let size = estimate_text_size(&text.content, font_size);
                let (sx, sy) = self.anchor.signs();
                let x = if sx < 0.0 {
                    self.start.x + self.start.width - size.width
                } else {
                    self.start.x
                };
                let y = if sy < 0.0 {
                    self.start.y + self.start.height - size.height
                } else {
                    self.start.y
                };
                vec![
                    GraphMutation::SetFontSize {
                        id: self.owner,
                        size: font_size,
                    },
                    GraphMutation::SetGeometry {
                        id: self.owner,
                        geometry: PartialGeometry::at(x, y),
                    },
                ]
            }
        }
    }
}

impl Tool for ResizeTool {
    fn handle(&mut self, event: &InputEvent, _hit_node: Option<NodeId>) -> Vec<GraphMutation> {
        match event {
            InputEvent::PointerMove { x, y, .. } | InputEvent::PointerUp { x, y } => {
                self.resize_to(*x, *y)
            }
            _ => vec![],
        }
    }
}

// ─── Controller ──────────────────────────────────────────────────────────

/// Attaches handles to the selected node and performs step moves.
#[derive(Debug, Default)]
pub struct TransformController;

impl TransformController {
    /// Attach handles to `id`, replacing any existing set.
    pub fn attach(
        &self,
        engine: &mut SyncEngine,
        id: NodeId,
        options: HandleOptions,
    ) -> SceneResult<()> {
        engine.apply_mutation(GraphMutation::AttachHandles { id, options })
    }

    /// Remove the handles; no-op when none are attached.
    pub fn detach(&self, engine: &mut SyncEngine) {
        // DetachHandles cannot fail.
        let _ = engine.apply_mutation(GraphMutation::DetachHandles);
    }

    /// Select `id`: attach the handles it was mounted with, or detach when
    /// it has none.
    pub fn select(&self, engine: &mut SyncEngine, id: NodeId) -> SceneResult<()> {
        match engine.node(id)?.handles.clone() {
            Some(options) => self.attach(engine, id, options),
            None => {
                self.detach(engine);
                Ok(())
            }
        }
    }

    /// Move `id` one step. If `id` carries the handles they are re-attached
    /// to the new geometry; the selection itself never changes.
    /// Returns the new position.
    pub fn step_move(
        &self,
        engine: &mut SyncEngine,
        id: NodeId,
        direction: Direction,
        step: f32,
    ) -> SceneResult<Point> {
        let (ux, uy) = direction.delta();
        engine.apply_mutation(GraphMutation::MoveNode {
            id,
            dx: ux * step,
            dy: uy * step,
        })?;
        let owned = engine
            .graph
            .handles()
            .filter(|h| h.owner == id)
            .map(|h| h.options.clone());
        if let Some(options) = owned {
            self.attach(engine, id, options)?;
        }
        engine.node(id).map(|n| n.position)
    }
}
