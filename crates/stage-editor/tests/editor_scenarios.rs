//! Integration tests: the editor facade driven end to end (stage-editor ↔
//! stage-core ↔ stage-render) through recording host capabilities.

mod common;

use common::Harness;
use pretty_assertions::assert_eq;
use stage_core::model::*;
use stage_editor::{
    AssetSlot, CommandDispatcher, DispatchError, EditorCommand, LoadedAsset, Modifiers,
    PlaybackState, PlaybackStatus,
};

fn text_count(h: &Harness) -> usize {
    h.editor.graph().nodes().filter(|n| n.kind.is_text()).count()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

// ─── Toggle text ────────────────────────────────────────────────────────

#[test]
fn toggle_text_parity() {
    let mut h = Harness::mounted();
    let dispatcher = CommandDispatcher::with_defaults();

    for calls in 1..=7 {
        dispatcher.dispatch("toggle-text", &mut h.editor).unwrap();
        assert_eq!(text_count(&h), calls % 2, "after {calls} toggles");
        if let Some(handles) = h.editor.handles() {
            assert!(
                h.editor.graph().contains(handles.owner),
                "handles must never outlive their owner"
            );
        }
    }
}

#[test]
fn toggle_on_uses_defaults_and_remembers_last_state() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    let text = h.editor.text_node().unwrap();
    assert_eq!(text.text_content(), Some("Hello Konva"));
    assert_eq!(text.font_size(), Some(30.0));
    assert_eq!(text.position, Point::new(100.0, 100.0));
    assert_eq!(text.style.fill, Some(Color::BLACK));

    h.editor.increment_font_size(2.0);
    h.editor.toggle_text();
    h.editor.toggle_text();
    assert_eq!(h.editor.text_node().unwrap().font_size(), Some(32.0));
    assert_eq!(
        h.editor.text_node().unwrap().position,
        Point::new(100.0, 100.0)
    );
}

// ─── Move & font scenario ───────────────────────────────────────────────

#[test]
fn hello_konva_move_and_font_scenario() {
    let mut h = Harness::mounted();
    let dispatcher = CommandDispatcher::with_defaults();
    dispatcher
        .dispatch_command(EditorCommand::ToggleText, &mut h.editor)
        .unwrap();

    dispatcher.dispatch("move-right", &mut h.editor).unwrap();
    dispatcher.dispatch("move-down", &mut h.editor).unwrap();
    assert_eq!(
        h.editor.text_node().unwrap().position,
        Point::new(110.0, 110.0)
    );

    dispatcher.dispatch("increase-text-size", &mut h.editor).unwrap();
    dispatcher.dispatch("increase-text-size", &mut h.editor).unwrap();
    assert_eq!(h.editor.text_node().unwrap().font_size(), Some(34.0));

    h.editor.increment_font_size(-100.0);
    assert_eq!(h.editor.text_node().unwrap().font_size(), Some(1.0));
}

#[test]
fn step_move_is_reversible() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    let start = h.editor.text_node().unwrap().position;

    for (there, back) in [
        (EditorCommand::MoveUp, EditorCommand::MoveDown),
        (EditorCommand::MoveLeft, EditorCommand::MoveRight),
        (EditorCommand::MoveDown, EditorCommand::MoveUp),
        (EditorCommand::MoveRight, EditorCommand::MoveLeft),
    ] {
        h.editor.execute(there);
        assert_ne!(h.editor.text_node().unwrap().position, start);
        h.editor.execute(back);
        assert_eq!(h.editor.text_node().unwrap().position, start);
    }

    let handles = h.editor.handles().unwrap();
    assert_eq!(handles.owner, h.editor.text_id().unwrap());
    assert_eq!(handles.frame, h.editor.text_node().unwrap().bounds());
}

#[test]
fn moving_text_keeps_image_selected() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    h.click(60.0, 60.0);
    let image = h.editor.image_id().unwrap();
    assert_eq!(h.editor.handles().unwrap().owner, image);

    h.editor.execute(EditorCommand::MoveRight);

    assert_eq!(h.editor.text_node().unwrap().position, Point::new(110.0, 100.0));
    let handles = h.editor.handles().unwrap();
    assert_eq!(handles.owner, image);
    assert_eq!(handles.frame, Bounds::new(50.0, 50.0, 200.0, 200.0));
}

#[test]
fn moving_deselected_text_does_not_reselect_it() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    h.click(680.0, 580.0);
    assert!(h.editor.handles().is_none());

    h.editor.execute(EditorCommand::MoveRight);

    assert_eq!(h.editor.text_node().unwrap().position, Point::new(110.0, 100.0));
    assert!(h.editor.handles().is_none());
}

#[test]
fn font_and_move_commands_without_text_are_no_ops() {
    let mut h = Harness::mounted();
    let draws = h.draws();
    let remembered = h.editor.remembered_font_size();

    h.editor.execute(EditorCommand::IncreaseTextSize);
    h.editor.execute(EditorCommand::MoveLeft);

    assert_eq!(text_count(&h), 0);
    assert_eq!(h.editor.remembered_font_size(), remembered);
    assert_eq!(h.draws(), draws);
}

// ─── Click / type / blur ────────────────────────────────────────────────

#[test]
fn click_type_blur_scenario() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();

    h.click_text();
    assert!(h.overlay.borrow().visible);
    assert_eq!(h.overlay.borrow().value, "Hello Konva");
    assert_eq!(h.overlay.borrow().focus_count, 1);
    assert_eq!(h.editor.overlay_state().value, "Hello Konva");

    h.type_into_overlay("Hello KonvaX");
    assert_eq!(
        h.editor.text_node().unwrap().text_content(),
        Some("Hello KonvaX")
    );

    h.editor.overlay_blur();
    assert!(!h.overlay.borrow().visible);
    assert!(!h.editor.overlay_state().visible);
    assert_eq!(
        h.editor.text_node().unwrap().text_content(),
        Some("Hello KonvaX")
    );
}

#[test]
fn overlay_value_equals_content_after_every_event() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    h.click_text();

    let check = |h: &Harness| {
        let state = h.editor.overlay_state();
        let text = h.editor.text_node().unwrap();
        assert!(state.visible);
        assert_eq!(Some(state.value.as_str()), text.text_content());
        assert_eq!(state.bounds, text.bounds());
        assert_eq!(h.overlay.borrow().bounds, Some(text.bounds()));
    };

    for value in ["H", "He", "", "Hello, stage", "ünïcödé ✓"] {
        h.type_into_overlay(value);
        check(&h);
    }
    for command in [
        EditorCommand::MoveRight,
        EditorCommand::IncreaseTextSize,
        EditorCommand::MoveUp,
        EditorCommand::DecreaseTextSize,
    ] {
        h.editor.execute(command);
        check(&h);
        assert!(approx(
            h.overlay.borrow().font_size,
            h.editor.text_node().unwrap().font_size().unwrap()
        ));
    }
}

#[test]
fn clicking_image_does_not_open_overlay() {
    let mut h = Harness::mounted();
    h.click(60.0, 60.0);
    assert!(!h.overlay.borrow().visible);
    assert_eq!(h.editor.handles().unwrap().owner, h.editor.image_id().unwrap());
}

#[test]
fn toggle_off_while_editing_cleans_up() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    h.click_text();
    let text_id = h.editor.text_id().unwrap();
    assert_eq!(h.editor.handles().unwrap().owner, text_id);

    h.editor.toggle_text();
    assert!(!h.overlay.borrow().visible);
    assert!(!h.editor.overlay_state().visible);
    assert!(h.editor.text_node().is_none());
    assert!(!h.editor.graph().contains(text_id));
    assert!(h.editor.handles().is_none());

    // Late events aimed at the destroyed node change nothing.
    h.type_into_overlay("ghost");
    h.editor.overlay_blur();
    assert_eq!(text_count(&h), 0);
}

#[test]
fn shortcuts_are_suppressed_while_editing() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    assert_eq!(
        h.editor.shortcut("t", Modifiers::NONE),
        Some(EditorCommand::ToggleText)
    );

    h.click_text();
    assert_eq!(h.editor.shortcut("t", Modifiers::NONE), None);
    assert_eq!(h.editor.shortcut("ArrowUp", Modifiers::NONE), None);

    h.editor.overlay_blur();
    assert_eq!(
        h.editor.shortcut("ArrowUp", Modifiers::NONE),
        Some(EditorCommand::MoveUp)
    );
}

// ─── Direct manipulation ────────────────────────────────────────────────

#[test]
fn corner_drag_keeps_image_aspect_ratio() {
    let mut h = Harness::mounted();
    let image = h.editor.image_id().unwrap();
    h.click(100.0, 200.0);
    assert!(h.editor.handles().unwrap().options.keep_aspect_ratio);

    h.editor.pointer_down(250.0, 250.0, Modifiers::NONE);
    h.editor.pointer_move(270.0, 252.0, Modifiers::NONE);
    h.editor.pointer_move(297.0, 261.0, Modifiers::NONE);
    h.editor.pointer_up(301.0, 266.0);

    let node = h.editor.graph().get_by_id(image).unwrap();
    assert!(approx(node.size.width / node.size.height, 1.0));
    assert!(approx(node.size.width, 251.0));
    assert_eq!(node.position, Point::new(50.0, 50.0));
    assert_eq!(h.editor.handles().unwrap().frame, node.bounds());
}

#[test]
fn top_left_drag_keeps_bottom_right_fixed() {
    let mut h = Harness::mounted();
    let image = h.editor.image_id().unwrap();
    h.click(100.0, 200.0);

    h.editor.pointer_down(50.0, 50.0, Modifiers::NONE);
    h.editor.pointer_up(90.0, 70.0);

    let b = h.editor.graph().get_by_id(image).unwrap().bounds();
    assert!(approx(b.x + b.width, 250.0));
    assert!(approx(b.y + b.height, 250.0));
    assert!(approx(b.width, b.height));
}

#[test]
fn drag_moves_node_relative_to_pointer() {
    let mut h = Harness::mounted();
    let video = h.editor.video_id().unwrap();
    h.editor.pointer_down(400.0, 100.0, Modifiers::NONE);
    assert!(h.editor.handles().is_none(), "video has no resize handles");

    h.editor.pointer_move(410.0, 105.0, Modifiers::NONE);
    h.editor.pointer_move(430.0, 125.0, Modifiers::NONE);
    h.editor.pointer_up(430.0, 125.0);

    let node = h.editor.graph().get_by_id(video).unwrap();
    assert!(approx(node.position.x, 330.0));
    assert!(approx(node.position.y, 75.0));
    assert!(!h.overlay.borrow().visible);
}

#[test]
fn pointer_down_on_background_deselects() {
    let mut h = Harness::mounted();
    h.click(100.0, 200.0);
    assert!(h.editor.handles().is_some());

    h.click(680.0, 580.0);
    assert!(h.editor.handles().is_none());
}

// ─── Playback ───────────────────────────────────────────────────────────

#[test]
fn play_pause_twice_restores_status() {
    let mut h = Harness::mounted();
    let dispatcher = CommandDispatcher::with_defaults();

    dispatcher.dispatch("play-pause", &mut h.editor).unwrap();
    assert_eq!(h.editor.playback_state().status, PlaybackStatus::Playing);
    assert!(h.media.borrow().playing);
    let playing = h.editor.playback_state().status;

    dispatcher.dispatch("play-pause", &mut h.editor).unwrap();
    dispatcher.dispatch("play-pause", &mut h.editor).unwrap();
    assert_eq!(h.editor.playback_state().status, playing);
}

#[test]
fn stop_from_any_status_rewinds() {
    for presses in 0..3 {
        let mut h = Harness::mounted();
        for _ in 0..presses {
            h.editor.execute(EditorCommand::PlayPause);
        }
        h.media.borrow_mut().time = 7.25;

        h.editor.execute(EditorCommand::Stop);
        assert_eq!(
            h.editor.playback_state(),
            PlaybackState {
                status: PlaybackStatus::Stopped,
                current_time: 0.0,
            }
        );
        assert_eq!(h.media.borrow().time, 0.0);
        assert!(!h.media.borrow().playing);
    }
}

#[test]
fn redraw_loop_runs_only_while_playing() {
    let mut h = Harness::mounted();
    h.editor.toggle_play_pause();
    assert!(h.editor.take_frame_request());
    assert!(!h.editor.take_frame_request());

    let before = h.draws();
    for frame in 1..=3 {
        h.media.borrow_mut().time = frame as f64 / 60.0;
        assert!(h.editor.tick(), "playing loop reschedules");
        assert_eq!(h.draws(), before + frame, "exactly one redraw per tick");
    }
    assert!(h.editor.playback_state().current_time > 0.0);

    h.editor.toggle_play_pause();
    assert!(!h.editor.tick(), "paused loop ends itself");
    assert_eq!(h.draws(), before + 3);
}

#[test]
fn clip_end_stops_the_redraw_loop() {
    let mut h = Harness::mounted();
    h.editor.toggle_play_pause();
    assert!(h.editor.tick());

    {
        let mut media = h.media.borrow_mut();
        media.playing = false;
        media.time = 10.0;
    }
    h.editor.on_video_pause_event();

    assert_eq!(
        h.editor.playback_state(),
        PlaybackState {
            status: PlaybackStatus::Paused,
            current_time: 10.0,
        }
    );
    let draws = h.draws();
    assert!(!h.editor.tick(), "ended clip must not keep redrawing");
    assert_eq!(h.draws(), draws);

    h.editor.toggle_play_pause();
    assert_eq!(h.editor.playback_state().status, PlaybackStatus::Playing);
    assert!(h.media.borrow().playing);
}

#[test]
fn play_event_kicks_loop_once() {
    let mut h = Harness::mounted();
    h.editor.on_video_play_event();
    assert!(h.editor.take_frame_request());
    h.editor.on_video_play_event();
    assert!(!h.editor.take_frame_request());
    assert_eq!(h.editor.playback_state().status, PlaybackStatus::Playing);
}

#[test]
fn playback_without_video_is_a_no_op() {
    let mut h = Harness::new();
    h.editor.toggle_play_pause();
    h.editor.stop();
    assert_eq!(h.editor.playback_state(), PlaybackState::default());
    assert!(!h.editor.take_frame_request());
}

// ─── Asset loading & teardown ───────────────────────────────────────────

#[test]
fn assets_paint_video_then_image() {
    let h = Harness::mounted();
    let kinds: Vec<&str> = h.editor.graph().nodes().map(|n| n.kind.name()).collect();
    assert_eq!(kinds, vec!["video", "image"]);

    let video = h.editor.graph().video_node().unwrap();
    assert_eq!(video.bounds(), Bounds::new(300.0, 50.0, 300.0, 200.0));
    assert_eq!(video.style.stroke.map(|s| s.width), Some(1.0));
}

#[test]
fn late_assets_paint_under_text() {
    let mut h = Harness::new();
    let requests = h.editor.mount();
    h.editor.toggle_text();

    // Image finishes before the video, both after the text exists.
    for request in requests.into_iter().rev() {
        let asset = match request.slot {
            AssetSlot::Image => LoadedAsset::Image,
            AssetSlot::Video => {
                LoadedAsset::Video(Box::new(common::RecordingMedia(h.media.clone())))
            }
        };
        h.editor.on_asset_loaded(request.ticket, Ok(asset));
    }

    let kinds: Vec<&str> = h.editor.graph().nodes().map(|n| n.kind.name()).collect();
    assert_eq!(kinds, vec!["video", "image", "text"]);
}

#[test]
fn failed_asset_is_never_created() {
    let mut h = Harness::new();
    let requests = h.editor.mount();
    let image = requests
        .iter()
        .find(|r| r.slot == AssetSlot::Image)
        .unwrap();
    assert!(image.url.ends_with("lion.png"));

    assert_eq!(
        h.editor
            .on_asset_loaded(image.ticket, Err("404 Not Found".into())),
        None
    );
    assert!(h.editor.image_id().is_none());
    assert!(h.editor.graph().is_empty());

    // The ticket is consumed; a retry completion is ignored.
    assert_eq!(
        h.editor.on_asset_loaded(image.ticket, Ok(LoadedAsset::Image)),
        None
    );
}

#[test]
fn teardown_makes_late_callbacks_inert() {
    let mut h = Harness::new();
    let requests = h.editor.mount();
    let video = requests
        .iter()
        .find(|r| r.slot == AssetSlot::Video)
        .unwrap()
        .ticket;
    h.editor.on_asset_loaded(
        video,
        Ok(LoadedAsset::Video(Box::new(common::RecordingMedia(
            h.media.clone(),
        )))),
    );
    h.editor.toggle_play_pause();
    let draws = h.draws();

    h.editor.teardown();
    assert!(!h.editor.is_alive());
    assert!(h.surface.borrow().released);
    assert!(h.media.borrow().released);
    assert!(!h.media.borrow().playing);

    for request in &requests {
        assert_eq!(
            h.editor.on_asset_loaded(request.ticket, Ok(LoadedAsset::Image)),
            None
        );
    }
    assert!(!h.editor.tick());
    h.editor.toggle_text();
    h.editor.pointer_down(400.0, 100.0, Modifiers::NONE);
    assert_eq!(h.draws(), draws);
    assert_eq!(text_count(&h), 0);
    assert!(h.editor.image_id().is_none());
}

// ─── Dispatch ───────────────────────────────────────────────────────────

#[test]
fn unknown_command_is_reported() {
    let mut h = Harness::mounted();
    let dispatcher = CommandDispatcher::with_defaults();
    assert_eq!(
        dispatcher.dispatch("toggleText", &mut h.editor),
        Err(DispatchError::UnknownCommand("toggleText".into()))
    );
}

#[test]
fn custom_handlers_receive_the_editor() {
    let mut h = Harness::mounted();
    let mut dispatcher = CommandDispatcher::empty();
    dispatcher.register("double-toggle", |editor| {
        editor.toggle_text();
        editor.toggle_text();
    });
    dispatcher.dispatch("double-toggle", &mut h.editor).unwrap();
    assert_eq!(text_count(&h), 0);
    assert!(dispatcher.dispatch("stop", &mut h.editor).is_err());
}

#[test]
fn each_command_flushes_one_redraw() {
    let mut h = Harness::mounted();
    h.editor.toggle_text();
    let before = h.draws();
    h.editor.execute(EditorCommand::MoveRight);
    assert_eq!(h.draws(), before + 1);
    h.editor.execute(EditorCommand::IncreaseTextSize);
    assert_eq!(h.draws(), before + 2);
    assert_eq!(h.surface.borrow().last_node_count, 3);
}
