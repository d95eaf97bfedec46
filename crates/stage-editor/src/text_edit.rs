//! Text edit mediator: keeps the native input overlay bound to the text node.
//!
//! The overlay only becomes visible through `on_node_clicked`. While it is
//! visible its box tracks the text node's screen geometry and its value equals
//! the node's content; every input event is written through to the node
//! before anything else happens.

use crate::sync::{GraphMutation, SyncEngine};
use serde::Serialize;
use stage_core::host::OverlayControl;
use stage_core::id::NodeId;
use stage_core::model::{Bounds, SceneGraph};
use stage_core::{SceneError, SceneResult};

/// What the overlay currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayInputState {
    pub visible: bool,
    #[serde(rename = "boundingBox")]
    pub bounds: Bounds,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct TextEditMediator {
    state: OverlayInputState,
    /// Text node the overlay is editing.
    bound: Option<NodeId>,
}

impl TextEditMediator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayInputState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn bound(&self) -> Option<NodeId> {
        self.bound
    }

    /// Show the overlay over text node `id`, populated with its content.
    pub fn on_node_clicked(
        &mut self,
        graph: &SceneGraph,
        id: NodeId,
        overlay: &mut dyn OverlayControl,
    ) -> SceneResult<()> {
        let node = graph.get_by_id(id).ok_or(SceneError::NodeNotFound(id))?;
        let (Some(content), Some(font_size)) = (node.text_content(), node.font_size()) else {
            return Err(SceneError::InvalidNodeKind {
                id,
                expected: "text",
                found: node.kind.name(),
            });
        };

        self.bound = Some(id);
        self.state = OverlayInputState {
            visible: true,
            bounds: node.bounds(),
            value: content.to_owned(),
        };
        overlay.set_bounds(self.state.bounds, font_size);
        overlay.set_value(&self.state.value);
        overlay.set_visible(true);
        overlay.focus();
        log::debug!("overlay editing @{id}");
        Ok(())
    }

    /// Write the overlay's new value into the text node immediately.
    pub fn on_overlay_input(
        &mut self,
        engine: &mut SyncEngine,
        value: &str,
        overlay: &mut dyn OverlayControl,
    ) -> SceneResult<()> {
        let Some(id) = self.bound.filter(|_| self.state.visible) else {
            log::trace!("overlay input while hidden ignored");
            return Ok(());
        };
        if let Err(err) = engine.apply_mutation(GraphMutation::SetText {
            id,
            content: value.to_owned(),
        }) {
            self.hide(overlay);
            return Err(err);
        }
        value.clone_into(&mut self.state.value);
        self.resync(&engine.graph, overlay);
        Ok(())
    }

    /// Commit the overlay's current value and hide it.
    pub fn on_overlay_blur(
        &mut self,
        engine: &mut SyncEngine,
        overlay: &mut dyn OverlayControl,
    ) -> SceneResult<()> {
        let Some(id) = self.bound.filter(|_| self.state.visible) else {
            return Ok(());
        };
        let value = overlay.value();
        let unchanged = engine
            .node(id)
            .map(|n| n.text_content() == Some(value.as_str()));
        let committed = match unchanged {
            Ok(true) => Ok(()),
            Ok(false) => engine.apply_mutation(GraphMutation::SetText { id, content: value }),
            Err(err) => Err(err),
        };
        self.hide(overlay);
        committed
    }

    /// Hide the overlay and drop its binding.
    pub fn hide(&mut self, overlay: &mut dyn OverlayControl) {
        if let Some(id) = self.bound.take() {
            log::debug!("overlay released @{id}");
        }
        if self.state.visible {
            self.state.visible = false;
            overlay.set_visible(false);
        }
    }

    /// Re-align the overlay box with the bound node's current geometry.
    /// Hides the overlay if the node is gone.
    pub fn resync(&mut self, graph: &SceneGraph, overlay: &mut dyn OverlayControl) {
        if !self.state.visible {
            return;
        }
        let Some(node) = self.bound.and_then(|id| graph.get_by_id(id)) else {
            self.hide(overlay);
            return;
        };
        let bounds = node.bounds();
        let font_size = node.font_size().unwrap_or_default();
        if bounds != self.state.bounds {
            self.state.bounds = bounds;
            overlay.set_bounds(bounds, font_size);
        }
    }
}
