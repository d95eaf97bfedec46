//! The editor: one long-lived scene plus the controllers that mutate it.
//!
//! `Editor` owns the host capabilities (surface, overlay, media element) and
//! routes every gesture and command to the matching controller. Each public
//! entry point ends with at most one batched redraw. Failures are logged and
//! swallowed here; none of them reach the host.
//!
//! After `teardown` every entry point is inert: late asset completions,
//! animation-frame ticks and DOM events cannot mutate anything.

use crate::commands::EditorCommand;
use crate::input::{InputEvent, Modifiers};
use crate::playback::{PlaybackController, PlaybackState};
use crate::shortcuts::ShortcutMap;
use crate::sync::{GraphMutation, SyncEngine};
use crate::text_edit::{OverlayInputState, TextEditMediator};
use crate::tools::{SelectTool, Tool};
use crate::transform::{Direction, ResizeTool, TransformController};
use stage_core::config::{AssetConfig, EditorConfig};
use stage_core::host::{DrawSurface, MediaElement, OverlayControl};
use stage_core::id::NodeId;
use stage_core::model::*;
use stage_core::{SceneError, SceneResult};
use stage_render::{hit_test, hit_test_handle};
use std::collections::HashMap;

/// Which asset-backed node a load fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSlot {
    Image,
    Video,
}

/// Identifies one asset request. Completions are matched by ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// An asset the host must fetch, then report via `Editor::on_asset_loaded`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub ticket: LoadTicket,
    pub slot: AssetSlot,
    pub url: String,
}

/// A successfully fetched asset.
pub enum LoadedAsset {
    Image,
    Video(Box<dyn MediaElement>),
}

impl std::fmt::Debug for LoadedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadedAsset::Image => f.write_str("Image"),
            LoadedAsset::Video(_) => f.write_str("Video(..)"),
        }
    }
}

pub struct Editor {
    config: EditorConfig,
    engine: SyncEngine,
    select: SelectTool,
    resize: Option<ResizeTool>,
    transform: TransformController,
    mediator: TextEditMediator,
    playback: PlaybackController,

    surface: Box<dyn DrawSurface>,
    overlay: Box<dyn OverlayControl>,
    media: Option<Box<dyn MediaElement>>,

    image_id: Option<NodeId>,
    video_id: Option<NodeId>,
    text_id: Option<NodeId>,
    /// Text content and font size restored on the next toggle-on.
    text_content: String,
    font_size: f32,

    pending: HashMap<LoadTicket, AssetSlot>,
    next_ticket: u64,
    frame_requested: bool,
    alive: bool,
}

impl Editor {
    pub fn new(
        config: EditorConfig,
        surface: Box<dyn DrawSurface>,
        overlay: Box<dyn OverlayControl>,
    ) -> Self {
        Self {
            select: SelectTool::new(config.click_slop),
            text_content: config.text.content.clone(),
            font_size: config.text.font_size,
            config,
            engine: SyncEngine::new(),
            resize: None,
            transform: TransformController,
            mediator: TextEditMediator::new(),
            playback: PlaybackController::new(),
            surface,
            overlay,
            media: None,
            image_id: None,
            video_id: None,
            text_id: None,
            pending: HashMap::new(),
            next_ticket: 0,
            frame_requested: false,
            alive: true,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Request the video and image assets (in paint order) and show the text
    /// label if configured to. Returns the loads the host must perform.
    pub fn mount(&mut self) -> Vec<AssetRequest> {
        if !self.is_live("mount") {
            return Vec::new();
        }
        let requests = vec![
            self.request_asset(AssetSlot::Video),
            self.request_asset(AssetSlot::Image),
        ];
        if self.config.text.visible_on_mount && self.text_id.is_none() {
            self.toggle_text();
        }
        self.flush();
        requests
    }

    /// Issue a ticket for loading the asset configured for `slot`.
    pub fn request_asset(&mut self, slot: AssetSlot) -> AssetRequest {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        if self.alive {
            self.pending.insert(ticket, slot);
        }
        let url = self.asset_config(slot).url.clone();
        log::debug!("requested {slot:?} #{} from {url}", ticket.0);
        AssetRequest { ticket, slot, url }
    }

    /// Complete a load. Stale or unknown tickets (including every ticket after
    /// teardown) are ignored; a failed load leaves the node absent.
    pub fn on_asset_loaded(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedAsset, String>,
    ) -> Option<NodeId> {
        if !self.alive {
            log::trace!("asset #{} completed after teardown", ticket.0);
            return None;
        }
        let Some(slot) = self.pending.remove(&ticket) else {
            log::trace!("asset #{} has no pending request", ticket.0);
            return None;
        };
        let url = self.asset_config(slot).url.clone();
        let created = match (slot, result) {
            (AssetSlot::Image, Ok(LoadedAsset::Image)) => Ok(self.insert_image()),
            (AssetSlot::Video, Ok(LoadedAsset::Video(media))) => Ok(self.insert_video(media)),
            (_, Ok(other)) => Err(SceneError::asset_load(
                url,
                format!("{slot:?} slot received {other:?}"),
            )),
            (_, Err(reason)) => Err(SceneError::asset_load(url, reason)),
        };
        let id = report("asset load", created);
        self.flush();
        id
    }

    /// Stop the redraw loop and release the surface and the media element.
    /// Idempotent.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.playback.cancel_loop();
        self.frame_requested = false;
        self.pending.clear();
        self.resize = None;
        self.mediator.hide(self.overlay.as_mut());
        if let Some(mut media) = self.media.take() {
            media.pause();
            media.release();
        }
        self.surface.release();
        log::debug!("editor torn down");
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Run one named UI command.
    pub fn execute(&mut self, command: EditorCommand) {
        log::debug!("command {}", command.name());
        let step = self.config.font_step;
        match command {
            EditorCommand::ToggleText => self.toggle_text(),
            EditorCommand::PlayPause => self.toggle_play_pause(),
            EditorCommand::Stop => self.stop(),
            EditorCommand::MoveUp => self.move_text(Direction::Up),
            EditorCommand::MoveDown => self.move_text(Direction::Down),
            EditorCommand::MoveLeft => self.move_text(Direction::Left),
            EditorCommand::MoveRight => self.move_text(Direction::Right),
            EditorCommand::IncreaseTextSize => self.increment_font_size(step),
            EditorCommand::DecreaseTextSize => self.increment_font_size(-step),
        }
    }

    /// Create the text node if absent, destroy it if present.
    pub fn toggle_text(&mut self) {
        if !self.is_live("toggle-text") {
            return;
        }
        match self.text_id.take() {
            Some(id) => self.destroy_text(id),
            None => self.create_text(),
        }
        self.flush();
    }

    /// Move the text node one step in `direction`; no-op without text.
    pub fn move_text(&mut self, direction: Direction) {
        if !self.is_live("move") {
            return;
        }
        let Some(id) = self.text_id else {
            log::debug!("move {direction:?}: no text node");
            return;
        };
        self.move_node(id, direction);
    }

    /// Move any node one step in `direction`.
    pub fn move_node(&mut self, id: NodeId, direction: Direction) {
        if !self.is_live("move") {
            return;
        }
        let step = self.config.move_step;
        report(
            "move",
            self.transform
                .step_move(&mut self.engine, id, direction, step),
        );
        self.mediator.resync(&self.engine.graph, self.overlay.as_mut());
        self.flush();
    }

    /// Change the text node's font size by `delta`, never below the minimum.
    /// No-op without a text node.
    pub fn increment_font_size(&mut self, delta: f32) {
        if !self.is_live("font size") {
            return;
        }
        let Some(id) = self.text_id else {
            log::debug!("font size {delta:+}: no text node");
            return;
        };
        let Some(current) = self.engine.graph.get_by_id(id).and_then(SceneNode::font_size) else {
            log::warn!("font size: text node @{id} is gone");
            self.text_id = None;
            return;
        };
        let target = (current + delta).max(self.config.min_font_size);
        if let Some(applied) = report("font size", self.engine.graph.set_font_size(id, target)) {
            self.font_size = applied;
        }
        self.mediator.resync(&self.engine.graph, self.overlay.as_mut());
        self.flush();
    }

    /// Stopped/Paused → Playing, Playing → Paused. No-op without video.
    pub fn toggle_play_pause(&mut self) {
        if !self.is_live("play-pause") {
            return;
        }
        let Some(media) = self.media.as_deref_mut() else {
            log::debug!("play-pause: no video mounted");
            return;
        };
        if self.playback.toggle_play_pause(media) {
            self.frame_requested = true;
        }
    }

    /// Pause and rewind to 0. No-op without video.
    pub fn stop(&mut self) {
        if !self.is_live("stop") {
            return;
        }
        let Some(media) = self.media.as_deref_mut() else {
            log::debug!("stop: no video mounted");
            return;
        };
        self.playback.stop(media);
        // Show the rewound frame.
        self.engine.request_redraw();
        self.flush();
    }

    /// The native video element fired `play`.
    pub fn on_video_play_event(&mut self) {
        if !self.is_live("play event") || self.media.is_none() {
            return;
        }
        if self.playback.on_play_event() {
            self.frame_requested = true;
        }
    }

    /// The native video element fired `pause` or `ended`.
    pub fn on_video_pause_event(&mut self) {
        if !self.is_live("pause event") {
            return;
        }
        if let Some(media) = self.media.as_deref() {
            self.playback.on_pause_event(media);
        }
    }

    /// Whether the host must request an animation frame. Clears the request.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// One animation-frame tick. Redraws at most once and returns whether
    /// the host should request another frame.
    pub fn tick(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let Some(media) = self.media.as_deref() else {
            self.playback.cancel_loop();
            return false;
        };
        let tick = self.playback.on_animation_frame(media);
        if tick.redraw {
            self.engine.request_redraw();
            self.flush();
        }
        tick.reschedule
    }

    // ─── Pointer gestures ────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        if !self.is_live("pointer down") {
            return;
        }
        if let Some(handles) = self.engine.graph.handles()
            && let Some(anchor) = hit_test_handle(handles, x, y, self.config.handle_size)
        {
            match ResizeTool::begin(&self.engine.graph, handles, anchor, x, y) {
                Ok(tool) => {
                    self.resize = Some(tool);
                    return;
                }
                Err(err) => log::warn!("resize: {err}"),
            }
        }

        let hit = hit_test(&self.engine.graph, x, y);
        log::trace!("pointer down ({x}, {y}) hit {hit:?}");
        let event = InputEvent::from_pointer_down(x, y, modifiers);
        self.select.handle(&event, hit);
        match hit {
            Some(id) => {
                report("select", self.transform.select(&mut self.engine, id));
            }
            None => self.transform.detach(&mut self.engine),
        }
        self.flush();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        if !self.is_live("pointer move") {
            return;
        }
        let event = InputEvent::from_pointer_move(x, y, modifiers);
        let mutations = match self.resize.as_mut() {
            Some(tool) => tool.handle(&event, None),
            None => {
                let selected = self.select.selected;
                self.select.handle(&event, selected)
            }
        };
        self.apply_gesture(mutations);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        if !self.is_live("pointer up") {
            return;
        }
        let event = InputEvent::from_pointer_up(x, y);
        if let Some(mut tool) = self.resize.take() {
            let mutations = tool.handle(&event, None);
            self.apply_gesture(mutations);
            return;
        }

        let selected = self.select.selected;
        self.select.handle(&event, selected);
        if let Some(id) = self.select.take_click()
            && self.text_id == Some(id)
        {
            report(
                "text click",
                self.mediator
                    .on_node_clicked(&self.engine.graph, id, self.overlay.as_mut()),
            );
        }
        self.flush();
    }

    // ─── Overlay events ──────────────────────────────────────────────────

    pub fn overlay_input(&mut self, value: &str) {
        if !self.is_live("overlay input") {
            return;
        }
        report(
            "overlay input",
            self.mediator
                .on_overlay_input(&mut self.engine, value, self.overlay.as_mut()),
        );
        self.flush();
    }

    pub fn overlay_blur(&mut self) {
        if !self.is_live("overlay blur") {
            return;
        }
        report(
            "overlay blur",
            self.mediator
                .on_overlay_blur(&mut self.engine, self.overlay.as_mut()),
        );
        self.flush();
    }

    /// Resolve a key press to a command. Shortcuts are suppressed while the
    /// overlay is editing so typing never triggers them.
    pub fn shortcut(&self, key: &str, modifiers: Modifiers) -> Option<EditorCommand> {
        if !self.alive || self.mediator.is_visible() {
            return None;
        }
        ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.engine.graph
    }

    pub fn text_id(&self) -> Option<NodeId> {
        self.text_id
    }

    pub fn image_id(&self) -> Option<NodeId> {
        self.image_id
    }

    pub fn video_id(&self) -> Option<NodeId> {
        self.video_id
    }

    pub fn text_node(&self) -> Option<&SceneNode> {
        self.text_id.and_then(|id| self.engine.graph.get_by_id(id))
    }

    pub fn handles(&self) -> Option<&TransformHandles> {
        self.engine.graph.handles()
    }

    pub fn overlay_state(&self) -> &OverlayInputState {
        self.mediator.state()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Font size the next toggle-on will use.
    pub fn remembered_font_size(&self) -> f32 {
        self.font_size
    }

    pub fn redraws(&self) -> u64 {
        self.engine.redraws()
    }

    /// Redraw the surface if anything changed since the last flush.
    pub fn flush(&mut self) -> bool {
        self.engine.flush(self.surface.as_mut())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn is_live(&self, op: &str) -> bool {
        if !self.alive {
            log::trace!("{op} ignored after teardown");
        }
        self.alive
    }

    fn asset_config(&self, slot: AssetSlot) -> &AssetConfig {
        match slot {
            AssetSlot::Image => &self.config.image,
            AssetSlot::Video => &self.config.video,
        }
    }

    fn create_text(&mut self) {
        let defaults = &self.config.text;
        let kind = NodeKind::Text {
            content: self.text_content.clone(),
            font_size: self.font_size,
        };
        let node = SceneNode::new(
            NodeId::with_prefix(kind.name()),
            kind,
            Bounds::new(defaults.x, defaults.y, 0.0, 0.0),
        )
        .with_style(Style {
            fill: Some(defaults.fill_color()),
            ..Style::default()
        })
        .with_handles(HandleOptions::corners());
        let id = node.id;

        if report(
            "toggle-text",
            self.engine.apply_mutation(GraphMutation::AddNode {
                node: Box::new(node),
            }),
        )
        .is_none()
        {
            return;
        }
        self.text_id = Some(id);
        report("toggle-text", self.transform.select(&mut self.engine, id));
        log::debug!("text on @{id}");
    }

    fn destroy_text(&mut self, id: NodeId) {
        self.mediator.hide(self.overlay.as_mut());
        if let Some(node) = self.engine.graph.get_by_id(id)
            && let NodeKind::Text { content, font_size } = &node.kind
        {
            self.text_content.clone_from(content);
            self.font_size = *font_size;
        }
        self.forget_node(id);
        report(
            "toggle-text",
            self.engine.apply_mutation(GraphMutation::RemoveNode { id }),
        );
        log::debug!("text off @{id}");
    }

    fn insert_image(&mut self) -> NodeId {
        if let Some(old) = self.image_id.take() {
            self.replace_node(old);
        }
        let cfg = &self.config.image;
        let node = asset_node(
            NodeKind::Image {
                source: AssetRef::new(cfg.url.clone()),
            },
            cfg,
        );
        let id = self.engine.graph.insert_node(node);
        self.image_id = Some(id);
        id
    }

    fn insert_video(&mut self, media: Box<dyn MediaElement>) -> NodeId {
        if let Some(old) = self.video_id.take() {
            self.replace_node(old);
        }
        if let Some(mut previous) = self.media.replace(media) {
            previous.release();
        }
        let cfg = &self.config.video;
        let node = asset_node(
            NodeKind::VideoSurface {
                source: AssetRef::new(cfg.url.clone()),
            },
            cfg,
        )
        .with_style(Style {
            stroke: Some(Stroke {
                color: Color::BLACK,
                width: 1.0,
            }),
            ..Style::default()
        });
        let id = self.engine.graph.insert_node(node);
        self.video_id = Some(id);
        id
    }

    fn replace_node(&mut self, old: NodeId) {
        self.forget_node(old);
        report("replace asset", self.engine.graph.destroy_node(old));
    }

    /// Drop gesture state that refers to `id`.
    fn forget_node(&mut self, id: NodeId) {
        self.select.forget(id);
        if self.resize.as_ref().is_some_and(|t| t.owner() == id) {
            self.resize = None;
        }
    }

    fn apply_gesture(&mut self, mutations: Vec<GraphMutation>) {
        for mutation in mutations {
            if let GraphMutation::MoveNode { id, .. } = &mutation
                && !self
                    .engine
                    .graph
                    .get_by_id(*id)
                    .is_some_and(|n| n.draggable)
            {
                continue;
            }
            if report("gesture", self.engine.apply_mutation(mutation)).is_none() {
                break;
            }
        }
        self.mediator.resync(&self.engine.graph, self.overlay.as_mut());
        self.flush();
    }
}

fn asset_node(kind: NodeKind, cfg: &AssetConfig) -> SceneNode {
    let node = SceneNode::new(NodeId::with_prefix(kind.name()), kind, cfg.bounds());
    if !cfg.resizable {
        return node;
    }
    node.with_handles(if cfg.keep_aspect_ratio {
        HandleOptions::corners_locked()
    } else {
        HandleOptions::corners()
    })
}

/// Log and swallow a failure.
fn report<T>(op: &str, result: SceneResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("{op}: {err}");
            None
        }
    }
}
