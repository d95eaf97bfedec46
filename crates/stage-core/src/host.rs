//! Capabilities the editor consumes from its host.
//!
//! The editor never touches a rasterizer, a media element, or a native input
//! widget directly. Hosts (the wasm bridge, or test fakes) implement these
//! traits and hand them to the editor.

use crate::model::{Bounds, SceneGraph, Size};

/// A retained-draw surface that can repaint the whole scene in one batch.
pub trait DrawSurface {
    fn size(&self) -> Size;

    /// Repaint every visible node and the handles.
    fn batch_draw(&mut self, graph: &SceneGraph);

    /// Drop any backing resources. Called once on teardown.
    fn release(&mut self) {}
}

/// The native media element backing the video surface.
pub trait MediaElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);

    /// Detach from the page and stop any decoding. Called once on teardown.
    fn release(&mut self) {}
}

/// The native editable text control overlaid on the stage.
pub trait OverlayControl {
    fn set_visible(&mut self, visible: bool);
    fn set_bounds(&mut self, bounds: Bounds, font_size: f32);
    fn set_value(&mut self, value: &str);
    fn value(&self) -> String;
    fn focus(&mut self);
}
