//! Scene graph → Vello drawing commands.
//!
//! Walks the root's children in paint order and emits Vello fills and
//! strokes: asset frames for image and video nodes, then the transform
//! handles on top. Bitmap and video pixels are supplied by the host's own
//! drawing backend; this painter only lays out the retained scene.

use kurbo::{Affine, Rect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use stage_core::host::DrawSurface;
use stage_core::model::{Bounds, NodeKind, SceneNode, Size, Style, TransformHandles};
use stage_core::SceneGraph;
use vello::Scene;

const IMAGE_PLACEHOLDER: Color = Color::from_rgba8(0xE5, 0xE5, 0xEA, 0xFF);
const VIDEO_PLACEHOLDER: Color = Color::from_rgba8(0x1C, 0x1C, 0x1E, 0xFF);
const HANDLE_STROKE: Color = Color::from_rgba8(0x4F, 0xC3, 0xF7, 0xFF);
const HANDLE_FILL: Color = Color::from_rgba8(0xFF, 0xFF, 0xFF, 0xFF);

/// Paint the whole scene to a Vello scene.
///
/// Call once per frame with a freshly-reset `Scene`. Returns the number of
/// nodes painted (hidden nodes are skipped).
pub fn paint_scene(scene: &mut Scene, graph: &SceneGraph, handle_size: f32) -> usize {
    let mut painted = 0;
    for node in graph.nodes().filter(|n| n.visible) {
        paint_node(scene, node);
        painted += 1;
    }
    if let Some(handles) = graph.handles() {
        paint_handles(scene, handles, handle_size);
    }
    painted
}

fn paint_node(scene: &mut Scene, node: &SceneNode) {
    let rect = to_rect(&node.bounds());
    match &node.kind {
        NodeKind::Root => {}
        NodeKind::Image { .. } => {
            scene.fill(Fill::NonZero, Affine::IDENTITY, IMAGE_PLACEHOLDER, None, &rect);
        }
        NodeKind::VideoSurface { .. } => {
            scene.fill(Fill::NonZero, Affine::IDENTITY, VIDEO_PLACEHOLDER, None, &rect);
        }
        NodeKind::Text { content, font_size } => {
            log::trace!(
                "TEXT @{} {:?} {}px at ({}, {})",
                node.id,
                content,
                font_size,
                node.position.x,
                node.position.y
            );
        }
    }
    stroke_frame(scene, &rect, &node.style);
}

fn stroke_frame(scene: &mut Scene, rect: &Rect, style: &Style) {
    if let Some(stroke) = &style.stroke {
        let color = to_color(stroke.color, style.opacity);
        let vello_stroke = KurboStroke::new(stroke.width as f64);
        scene.stroke(&vello_stroke, Affine::IDENTITY, color, None, rect);
    }
}

fn paint_handles(scene: &mut Scene, handles: &TransformHandles, handle_size: f32) {
    let frame = to_rect(&handles.frame);
    let outline = KurboStroke::new(1.0);
    scene.stroke(&outline, Affine::IDENTITY, HANDLE_STROKE, None, &frame);

    let half = handle_size as f64 / 2.0;
    for (_, p) in handles.anchor_points() {
        let (cx, cy) = (p.x as f64, p.y as f64);
        let square = Rect::new(cx - half, cy - half, cx + half, cy + half);
        scene.fill(Fill::NonZero, Affine::IDENTITY, HANDLE_FILL, None, &square);
        scene.stroke(&outline, Affine::IDENTITY, HANDLE_STROKE, None, &square);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn to_rect(b: &Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

fn to_color(c: stage_core::model::Color, opacity: Option<f32>) -> Color {
    let alpha = opacity.unwrap_or(1.0).clamp(0.0, 1.0);
    let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::from_rgba8(to8(c.r), to8(c.g), to8(c.b), to8(c.a * alpha))
}

// ─── Surface ─────────────────────────────────────────────────────────────────

/// A drawing surface backed by a retained `vello::Scene`.
///
/// The host presents `scene()` through its own wgpu renderer.
pub struct VelloSurface {
    scene: Scene,
    size: Size,
    handle_size: f32,
    frames: u64,
    last_painted: usize,
}

impl VelloSurface {
    pub fn new(size: Size, handle_size: f32) -> Self {
        Self {
            scene: Scene::new(),
            size,
            handle_size,
            frames: 0,
            last_painted: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Number of batched redraws performed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Nodes painted by the most recent redraw.
    pub fn last_painted(&self) -> usize {
        self.last_painted
    }
}

impl DrawSurface for VelloSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn batch_draw(&mut self, graph: &SceneGraph) {
        self.scene.reset();
        self.last_painted = paint_scene(&mut self.scene, graph, self.handle_size);
        self.frames += 1;
    }

    fn release(&mut self) {
        self.scene.reset();
        self.last_painted = 0;
    }
}
