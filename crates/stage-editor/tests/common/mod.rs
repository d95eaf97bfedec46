//! Recording fakes for the host capabilities.

#![allow(dead_code)]

use stage_core::host::{DrawSurface, MediaElement, OverlayControl};
use stage_core::model::{Bounds, SceneGraph, Size};
use stage_core::EditorConfig;
use stage_editor::{AssetSlot, Editor, LoadedAsset};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub draws: usize,
    pub released: bool,
    /// Node count seen by the most recent draw.
    pub last_node_count: usize,
}

pub struct RecordingSurface(pub Rc<RefCell<SurfaceLog>>);

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Size {
        Size::new(700.0, 600.0)
    }

    fn batch_draw(&mut self, graph: &SceneGraph) {
        let mut log = self.0.borrow_mut();
        log.draws += 1;
        log.last_node_count = graph.len();
    }

    fn release(&mut self) {
        self.0.borrow_mut().released = true;
    }
}

#[derive(Debug, Default)]
pub struct OverlayLog {
    pub visible: bool,
    pub bounds: Option<Bounds>,
    pub font_size: f32,
    pub value: String,
    pub focus_count: usize,
}

pub struct RecordingOverlay(pub Rc<RefCell<OverlayLog>>);

impl OverlayControl for RecordingOverlay {
    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    fn set_bounds(&mut self, bounds: Bounds, font_size: f32) {
        let mut log = self.0.borrow_mut();
        log.bounds = Some(bounds);
        log.font_size = font_size;
    }

    fn set_value(&mut self, value: &str) {
        self.0.borrow_mut().value = value.to_owned();
    }

    fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    fn focus(&mut self) {
        self.0.borrow_mut().focus_count += 1;
    }
}

#[derive(Debug, Default)]
pub struct MediaLog {
    pub playing: bool,
    pub time: f64,
    pub released: bool,
}

pub struct RecordingMedia(pub Rc<RefCell<MediaLog>>);

impl MediaElement for RecordingMedia {
    fn play(&mut self) {
        self.0.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.0.borrow_mut().time = seconds;
    }

    fn release(&mut self) {
        self.0.borrow_mut().released = true;
    }
}

pub struct Harness {
    pub editor: Editor,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub overlay: Rc<RefCell<OverlayLog>>,
    pub media: Rc<RefCell<MediaLog>>,
}

impl Harness {
    /// An editor with nothing loaded yet.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let surface = Rc::new(RefCell::new(SurfaceLog::default()));
        let overlay = Rc::new(RefCell::new(OverlayLog::default()));
        let media = Rc::new(RefCell::new(MediaLog::default()));
        let editor = Editor::new(
            config,
            Box::new(RecordingSurface(surface.clone())),
            Box::new(RecordingOverlay(overlay.clone())),
        );
        Self {
            editor,
            surface,
            overlay,
            media,
        }
    }

    /// Mount and complete every asset load successfully.
    pub fn mounted() -> Self {
        let mut h = Self::new();
        for request in h.editor.mount() {
            let asset = match request.slot {
                AssetSlot::Image => LoadedAsset::Image,
                AssetSlot::Video => {
                    LoadedAsset::Video(Box::new(RecordingMedia(h.media.clone())))
                }
            };
            h.editor.on_asset_loaded(request.ticket, Ok(asset));
        }
        h
    }

    pub fn draws(&self) -> usize {
        self.surface.borrow().draws
    }

    /// Simulate the user typing into the overlay: the native control's value
    /// changes, then the input event fires.
    pub fn type_into_overlay(&mut self, value: &str) {
        self.overlay.borrow_mut().value = value.to_owned();
        self.editor.overlay_input(value);
    }

    /// Press and release on the same spot.
    pub fn click(&mut self, x: f32, y: f32) {
        self.editor
            .pointer_down(x, y, stage_editor::Modifiers::NONE);
        self.editor.pointer_up(x, y);
    }

    /// Click the centre of the text node.
    pub fn click_text(&mut self) {
        let (x, y) = self
            .editor
            .text_node()
            .map(|n| n.bounds().center())
            .unwrap_or_default();
        self.click(x, y);
    }
}
