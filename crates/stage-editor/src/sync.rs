//! Sync engine: scene graph ↔ drawing surface.
//!
//! Gestures and commands never touch the surface directly. They produce
//! `GraphMutation`s, the engine applies them to the single long-lived
//! `SceneGraph`, and the graph's dirty flag is flushed into one batched
//! redraw when the caller is done with the current event:
//!
//! - **Mutate**: `apply_mutation` / `apply_all` update nodes, handles and
//!   content in place. No node is ever rebuilt to reflect a change.
//! - **Flush**: `flush` hands the graph to the surface once, no matter how
//!   many mutations preceded it.

use stage_core::host::DrawSurface;
use stage_core::id::NodeId;
use stage_core::model::*;
use stage_core::{SceneError, SceneResult};

/// The sync engine holds the authoritative scene graph and keeps the surface
/// in step with it.
pub struct SyncEngine {
    /// The current scene graph (single source of truth).
    pub graph: SceneGraph,

    /// Redraws flushed so far.
    redraws: u64,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEngine {
    /// Create an engine with an empty scene.
    pub fn new() -> Self {
        Self {
            graph: SceneGraph::new(),
            redraws: 0,
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply one mutation. A failed mutation leaves the graph untouched.
    pub fn apply_mutation(&mut self, mutation: GraphMutation) -> SceneResult<()> {
        log::trace!("apply {mutation:?}");
        match mutation {
            GraphMutation::AddNode { node } => {
                self.graph.insert_node(*node);
            }
            GraphMutation::RemoveNode { id } => {
                self.graph.destroy_node(id)?;
            }
            GraphMutation::MoveNode { id, dx, dy } => {
                self.graph.translate(id, dx, dy)?;
            }
            GraphMutation::SetGeometry { id, geometry } => {
                if !geometry.is_empty() {
                    self.graph.update_geometry(id, geometry)?;
                }
            }
            GraphMutation::SetText { id, content } => {
                self.graph.update_content(id, &content)?;
            }
            GraphMutation::SetFontSize { id, size } => {
                self.graph.set_font_size(id, size)?;
            }
            GraphMutation::AttachHandles { id, options } => {
                self.graph.attach_handles(id, options)?;
            }
            GraphMutation::DetachHandles => {
                self.graph.detach_handles();
            }
        }
        Ok(())
    }

    /// Apply a batch in order, stopping at the first failure.
    pub fn apply_all(
        &mut self,
        mutations: impl IntoIterator<Item = GraphMutation>,
    ) -> SceneResult<()> {
        for mutation in mutations {
            self.apply_mutation(mutation)?;
        }
        Ok(())
    }

    // ─── Flush ───────────────────────────────────────────────────────────

    /// Whether the graph changed since the last flush.
    pub fn needs_redraw(&self) -> bool {
        self.graph.is_dirty()
    }

    /// Force the next flush to redraw (e.g. a new video frame is available).
    pub fn request_redraw(&mut self) {
        self.graph.mark_dirty();
    }

    /// Redraw the surface once if anything changed. Returns whether it drew.
    pub fn flush(&mut self, surface: &mut dyn DrawSurface) -> bool {
        if !self.graph.take_dirty() {
            return false;
        }
        surface.batch_draw(&self.graph);
        self.redraws += 1;
        log::trace!("flushed redraw #{}", self.redraws);
        true
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Look up a node, reporting a miss as `NodeNotFound`.
    pub fn node(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.graph.get_by_id(id).ok_or(SceneError::NodeNotFound(id))
    }
}

/// A mutation that can be applied to the scene graph from gestures or
/// commands.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddNode {
        node: Box<SceneNode>,
    },
    RemoveNode {
        id: NodeId,
    },
    MoveNode {
        id: NodeId,
        dx: f32,
        dy: f32,
    },
    /// Write the `Some` fields of a partial geometry.
    SetGeometry {
        id: NodeId,
        geometry: PartialGeometry,
    },
    SetText {
        id: NodeId,
        content: String,
    },
    SetFontSize {
        id: NodeId,
        size: f32,
    },
    /// Attach handles, replacing any existing set.
    AttachHandles {
        id: NodeId,
        options: HandleOptions,
    },
    DetachHandles,
}
