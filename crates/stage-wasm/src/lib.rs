//! WASM bridge for Stage: exposes the Rust editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns a `<canvas>`
//! and an `<input>`; everything else (image and video elements, listeners,
//! the animation loop) is created and torn down here.

mod dom;
mod render2d;

use dom::{Bridge, DomOverlay};
use render2d::{DomSurface, MediaSources};
use serde::Serialize;
use stage_core::config::{EditorConfig, Viewport};
use stage_core::model::{Bounds, SceneNode};
use stage_editor::{AssetSlot, CommandDispatcher, Editor, Modifiers, OverlayInputState, PlaybackState};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, HtmlInputElement, HtmlVideoElement};

/// The main WASM-facing editor handle.
///
/// All interaction from the page goes through this struct: pointer and key
/// events, named commands from the buttons, and state queries.
#[wasm_bindgen]
pub struct StageCanvas {
    bridge: Rc<Bridge>,
    dispatcher: CommandDispatcher,
}

#[wasm_bindgen]
impl StageCanvas {
    /// Mount the editor on `canvas`, sized from the viewport.
    ///
    /// `config_json` overrides any subset of the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        overlay: HtmlInputElement,
        viewport_width: f32,
        viewport_height: f32,
        config_json: Option<String>,
    ) -> Result<StageCanvas, JsValue> {
        // Set up panic hook for better error messages in console
        console_error_panic_hook_setup();

        let config = match config_json.as_deref() {
            Some(json) => EditorConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => EditorConfig::default(),
        };
        let size = config.stage.stage_size(Viewport {
            width: viewport_width,
            height: viewport_height,
        });
        canvas.set_width(size.width as u32);
        canvas.set_height(size.height as u32);

        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let document = dom::window()?
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let image = HtmlImageElement::new()?;
        let video = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()?;

        let sources = MediaSources {
            image: image.clone(),
            video: video.clone(),
        };
        let surface = DomSurface::new(ctx, size, sources, config.handle_size);
        let overlay_control = DomOverlay::new(overlay.clone(), canvas);
        let editor = Editor::new(config, Box::new(surface), Box::new(overlay_control));
        let bridge = Bridge::new(editor);

        dom::wire_overlay(&bridge, &overlay)?;
        let requests = bridge
            .with_editor("mount", Editor::mount)
            .unwrap_or_default();
        for request in &requests {
            match request.slot {
                AssetSlot::Image => dom::load_image(&bridge, &image, request)?,
                AssetSlot::Video => dom::load_video(&bridge, &video, request)?,
            }
        }
        dom::pump(&bridge);
        log::info!("stage mounted at {}x{}", size.width, size.height);

        Ok(Self {
            bridge,
            dispatcher: CommandDispatcher::with_defaults(),
        })
    }

    /// Run a named command (`"toggle-text"`, `"play-pause"`, ...).
    ///
    /// Returns `false` if no handler is registered under `name`.
    pub fn command(&mut self, name: &str) -> bool {
        let dispatcher = &self.dispatcher;
        let ok = self
            .bridge
            .with_editor("command", |ed| dispatcher.dispatch(name, ed).is_ok())
            .unwrap_or(false);
        dom::pump(&self.bridge);
        ok
    }

    /// Handle pointer down event. Returns true if the stage was redrawn.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.redrawn_by(|ed| ed.pointer_down(x, y, modifiers))
    }

    /// Handle pointer move event. Returns true if the stage was redrawn.
    pub fn handle_pointer_move(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.redrawn_by(|ed| ed.pointer_move(x, y, modifiers))
    }

    /// Handle pointer up event. Returns true if the stage was redrawn.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.redrawn_by(|ed| ed.pointer_up(x, y))
    }

    /// Handle a keyboard event and run the bound command, if any.
    ///
    /// Returns JSON: `{"handled":bool,"command":"name"}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        let command = self
            .bridge
            .with_editor("key", |ed| ed.shortcut(key, modifiers))
            .flatten();
        let Some(command) = command else {
            return r#"{"handled":false,"command":"none"}"#.to_string();
        };

        let handled = self.command(command.name());
        let name = command.name();
        let handled = if handled { "true" } else { "false" };
        format!(r#"{{"handled":{handled},"command":"{name}"}}"#)
    }

    /// Snapshot of nodes, selection, overlay and playback as JSON.
    pub fn get_state_json(&self) -> String {
        self.bridge
            .with_editor("state", |ed| state_json(ed))
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Tear the editor down: stop playback, drop listeners, release media.
    ///
    /// Safe to call more than once; later calls on this handle are no-ops.
    pub fn destroy(&mut self) {
        self.bridge.shutdown();
        log::info!("stage destroyed");
    }
}

impl StageCanvas {
    fn redrawn_by(&mut self, f: impl FnOnce(&mut Editor)) -> bool {
        let redrawn = self
            .bridge
            .with_editor("pointer", |ed| {
                let before = ed.redraws();
                f(ed);
                ed.redraws() != before
            })
            .unwrap_or(false);
        dom::pump(&self.bridge);
        redrawn
    }
}

// ─── State snapshot ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct NodeSnapshot<'a> {
    id: &'a str,
    kind: &'static str,
    bounds: Bounds,
    visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "fontSize", skip_serializing_if = "Option::is_none")]
    font_size: Option<f32>,
}

impl<'a> From<&'a SceneNode> for NodeSnapshot<'a> {
    fn from(node: &'a SceneNode) -> Self {
        Self {
            id: node.id.as_str(),
            kind: node.kind.name(),
            bounds: node.bounds(),
            visible: node.visible,
            text: node.text_content(),
            font_size: node.font_size(),
        }
    }
}

#[derive(Serialize)]
struct StateSnapshot<'a> {
    nodes: Vec<NodeSnapshot<'a>>,
    selected: Option<&'a str>,
    overlay: &'a OverlayInputState,
    playback: PlaybackState,
}

fn state_json(editor: &Editor) -> String {
    let snapshot = StateSnapshot {
        nodes: editor.graph().nodes().map(NodeSnapshot::from).collect(),
        selected: editor.handles().map(|h| h.owner.as_str()),
        overlay: editor.overlay_state(),
        playback: editor.playback_state(),
    };
    serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Stage WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
