//! DOM adapters and the browser event plumbing.
//!
//! Every callback the browser holds (asset loads, overlay events, animation
//! frames) captures only a `Weak<Bridge>` and borrows the editor with
//! `try_borrow_mut`, so a callback firing during teardown or re-entrantly
//! from inside another editor call is dropped instead of panicking.

use stage_core::host::{MediaElement, OverlayControl};
use stage_core::model::Bounds;
use stage_editor::{AssetRequest, Editor, LoadedAsset};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlImageElement, HtmlInputElement, HtmlVideoElement};

// ─── Shared state ────────────────────────────────────────────────────────

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

/// The editor plus the JS callbacks that reach into it.
pub(crate) struct Bridge {
    editor: RefCell<Editor>,
    frame: RefCell<Option<Closure<dyn FnMut()>>>,
    frame_id: Cell<Option<i32>>,
    listeners: RefCell<Vec<Listener>>,
}

impl Bridge {
    pub fn new(editor: Editor) -> Rc<Self> {
        Rc::new(Self {
            editor: RefCell::new(editor),
            frame: RefCell::new(None),
            frame_id: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Run `f` on the editor unless it is already borrowed.
    pub fn with_editor<R>(&self, op: &str, f: impl FnOnce(&mut Editor) -> R) -> Option<R> {
        match self.editor.try_borrow_mut() {
            Ok(mut editor) => Some(f(&mut editor)),
            Err(_) => {
                log::warn!("{op}: editor busy, event dropped");
                None
            }
        }
    }

    /// Tear the editor down and unhook every browser callback.
    pub fn shutdown(&self) {
        self.with_editor("teardown", Editor::teardown);
        if let Some(id) = self.frame_id.take()
            && let Ok(window) = window()
        {
            let _ = window.cancel_animation_frame(id);
        }
        for l in self.listeners.borrow_mut().drain(..) {
            let _ = l
                .target
                .remove_event_listener_with_callback(l.event, callback(&l.closure));
        }
        self.frame.borrow_mut().take();
    }
}

pub(crate) fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn callback<T: ?Sized + wasm_bindgen::closure::WasmClosure>(closure: &Closure<T>) -> &js_sys::Function {
    closure.as_ref().unchecked_ref()
}

/// Request an animation frame if the editor asked for one.
pub(crate) fn pump(bridge: &Rc<Bridge>) {
    if bridge
        .with_editor("pump", Editor::take_frame_request)
        .unwrap_or(false)
    {
        schedule_frame(bridge);
    }
}

fn schedule_frame(bridge: &Rc<Bridge>) {
    if bridge.frame_id.get().is_some() {
        return;
    }
    if bridge.frame.borrow().is_none() {
        let weak: Weak<Bridge> = Rc::downgrade(bridge);
        let tick = Closure::<dyn FnMut()>::new(move || {
            let Some(bridge) = weak.upgrade() else {
                return;
            };
            bridge.frame_id.set(None);
            if bridge.with_editor("tick", Editor::tick).unwrap_or(false) {
                schedule_frame(&bridge);
            }
        });
        *bridge.frame.borrow_mut() = Some(tick);
    }

    let requested = match (window(), bridge.frame.borrow().as_ref()) {
        (Ok(window), Some(tick)) => window.request_animation_frame(callback(tick)),
        (Err(err), _) => Err(err),
        (_, None) => return,
    };
    match requested {
        Ok(id) => bridge.frame_id.set(Some(id)),
        Err(err) => log::warn!("requestAnimationFrame failed: {err:?}"),
    }
}

/// Register `handler` for `event` on `target` for the bridge's lifetime.
pub(crate) fn listen(
    bridge: &Rc<Bridge>,
    target: &EventTarget,
    event: &'static str,
    mut handler: impl FnMut(&Rc<Bridge>, Event) + 'static,
) -> Result<(), JsValue> {
    let weak = Rc::downgrade(bridge);
    let closure = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
        if let Some(bridge) = weak.upgrade() {
            handler(&bridge, e);
        }
    });
    target.add_event_listener_with_callback(event, callback(&closure))?;
    bridge.listeners.borrow_mut().push(Listener {
        target: target.clone(),
        event,
        closure,
    });
    Ok(())
}

// ─── Asset loading ───────────────────────────────────────────────────────

/// Start fetching the image; its node appears when `load` fires.
pub(crate) fn load_image(
    bridge: &Rc<Bridge>,
    image: &HtmlImageElement,
    request: &AssetRequest,
) -> Result<(), JsValue> {
    let ticket = request.ticket;
    listen(bridge, image.as_ref(), "load", move |bridge, _| {
        bridge.with_editor("image load", |ed| ed.on_asset_loaded(ticket, Ok(LoadedAsset::Image)));
    })?;
    listen(bridge, image.as_ref(), "error", move |bridge, _| {
        bridge.with_editor("image error", |ed| {
            ed.on_asset_loaded(ticket, Err("image failed to load".into()))
        });
    })?;
    image.set_src(&request.url);
    Ok(())
}

/// Start fetching the video; its node appears once the first frame decodes.
pub(crate) fn load_video(
    bridge: &Rc<Bridge>,
    video: &HtmlVideoElement,
    request: &AssetRequest,
) -> Result<(), JsValue> {
    let ticket = request.ticket;
    let element = video.clone();
    listen(bridge, video.as_ref(), "loadeddata", move |bridge, _| {
        let media = DomVideo(element.clone());
        bridge.with_editor("video load", |ed| {
            ed.on_asset_loaded(ticket, Ok(LoadedAsset::Video(Box::new(media))))
        });
    })?;
    listen(bridge, video.as_ref(), "error", move |bridge, _| {
        bridge.with_editor("video error", |ed| {
            ed.on_asset_loaded(ticket, Err("video failed to load".into()))
        });
    })?;
    listen(bridge, video.as_ref(), "play", |bridge, _| {
        bridge.with_editor("video play", Editor::on_video_play_event);
        pump(bridge);
    })?;
    for event in ["pause", "ended"] {
        listen(bridge, video.as_ref(), event, |bridge, _| {
            bridge.with_editor("video pause", Editor::on_video_pause_event);
        })?;
    }
    video.set_autoplay(false);
    video.set_controls(false);
    video.set_preload("auto");
    video.set_src(&request.url);
    Ok(())
}

/// Forward the overlay's `input` and `blur` events to the editor.
pub(crate) fn wire_overlay(bridge: &Rc<Bridge>, input: &HtmlInputElement) -> Result<(), JsValue> {
    let element = input.clone();
    listen(bridge, input.as_ref(), "input", move |bridge, _| {
        let value = element.value();
        bridge.with_editor("overlay input", |ed| ed.overlay_input(&value));
    })?;
    listen(bridge, input.as_ref(), "blur", |bridge, _| {
        bridge.with_editor("overlay blur", Editor::overlay_blur);
    })?;
    Ok(())
}

// ─── Capabilities ────────────────────────────────────────────────────────

/// The `<video>` element driving the video surface.
pub(crate) struct DomVideo(pub HtmlVideoElement);

impl MediaElement for DomVideo {
    fn play(&mut self) {
        // The returned promise rejects on autoplay policy; `play` never fires then.
        let _ = self.0.play();
    }

    fn pause(&mut self) {
        let _ = self.0.pause();
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn release(&mut self) {
        let _ = self.0.pause();
        let _ = self.0.remove_attribute("src");
        self.0.load();
    }
}

/// The `<input>` element overlaid on the canvas for text editing.
pub(crate) struct DomOverlay {
    input: HtmlInputElement,
    canvas: HtmlCanvasElement,
}

impl DomOverlay {
    pub fn new(input: HtmlInputElement, canvas: HtmlCanvasElement) -> Self {
        let style = input.style();
        let _ = style.set_property("position", "absolute");
        let _ = style.set_property("display", "none");
        let _ = style.set_property("z-index", "1000");
        Self { input, canvas }
    }
}

impl OverlayControl for DomOverlay {
    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "block" } else { "none" };
        let _ = self.input.style().set_property("display", display);
    }

    fn set_bounds(&mut self, bounds: Bounds, font_size: f32) {
        // Stage coordinates are relative to the canvas' offset parent box.
        let left = self.canvas.offset_left() as f32 + bounds.x;
        let top = self.canvas.offset_top() as f32 + bounds.y;
        let style = self.input.style();
        let _ = style.set_property("left", &format!("{left}px"));
        let _ = style.set_property("top", &format!("{top}px"));
        let _ = style.set_property("width", &format!("{}px", bounds.width));
        let _ = style.set_property("font-size", &format!("{font_size}px"));
    }

    fn set_value(&mut self, value: &str) {
        self.input.set_value(value);
    }

    fn value(&self) -> String {
        self.input.value()
    }

    fn focus(&mut self) {
        let _ = self.input.focus();
    }
}
