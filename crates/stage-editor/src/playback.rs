//! Playback controller: drives the native video element and the redraw loop.
//!
//! State machine: `Stopped → Playing → Paused → Playing …`; `stop` is
//! reachable from every state. The redraw loop is cooperative: each
//! animation-frame tick redraws once and asks to be rescheduled only while
//! still `Playing`, so pausing ends the loop without cancelling anything.

use serde::Serialize;
use stage_core::host::MediaElement;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    #[serde(rename = "currentTime")]
    pub current_time: f64,
}

/// Outcome of one animation-frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Redraw the surface presenting the video frame.
    pub redraw: bool,
    /// Request another animation frame.
    pub reschedule: bool,
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    /// An animation frame is pending.
    loop_scheduled: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.status == PlaybackStatus::Playing
    }

    pub fn loop_scheduled(&self) -> bool {
        self.loop_scheduled
    }

    /// Stopped/Paused → Playing, Playing → Paused.
    ///
    /// Returns `true` when the caller must request an animation frame to
    /// start the redraw loop.
    pub fn toggle_play_pause(&mut self, media: &mut dyn MediaElement) -> bool {
        match self.state.status {
            PlaybackStatus::Stopped | PlaybackStatus::Paused => {
                media.play();
                self.state.status = PlaybackStatus::Playing;
                log::debug!("playback: playing from {:.3}s", self.state.current_time);
                self.kick_loop()
            }
            PlaybackStatus::Playing => {
                media.pause();
                self.state.status = PlaybackStatus::Paused;
                self.state.current_time = media.current_time();
                log::debug!("playback: paused at {:.3}s", self.state.current_time);
                false
            }
        }
    }

    /// Pause, rewind to 0, and transition to Stopped.
    pub fn stop(&mut self, media: &mut dyn MediaElement) {
        media.pause();
        media.set_current_time(0.0);
        self.state = PlaybackState {
            status: PlaybackStatus::Stopped,
            current_time: 0.0,
        };
        log::debug!("playback: stopped");
    }

    /// The native element reported `play`. Starts the loop unless one is
    /// already scheduled; returns `true` when a frame must be requested.
    pub fn on_play_event(&mut self) -> bool {
        if !self.is_playing() {
            log::debug!("playback: native play event");
            self.state.status = PlaybackStatus::Playing;
        }
        self.kick_loop()
    }

    /// The native element paused on its own (`pause` or `ended`). Playing
    /// becomes Paused so the loop winds down; other states are kept.
    pub fn on_pause_event(&mut self, media: &dyn MediaElement) {
        if !self.is_playing() {
            return;
        }
        self.state.status = PlaybackStatus::Paused;
        self.state.current_time = media.current_time();
        log::debug!("playback: native pause at {:.3}s", self.state.current_time);
    }

    /// One animation-frame tick.
    pub fn on_animation_frame(&mut self, media: &dyn MediaElement) -> FrameTick {
        self.loop_scheduled = false;
        if !self.is_playing() {
            log::trace!("playback: loop ends ({:?})", self.state.status);
            return FrameTick {
                redraw: false,
                reschedule: false,
            };
        }
        self.state.current_time = media.current_time();
        self.loop_scheduled = true;
        FrameTick {
            redraw: true,
            reschedule: true,
        }
    }

    /// Drop any pending frame; ticks after this do nothing until restarted.
    pub fn cancel_loop(&mut self) {
        self.loop_scheduled = false;
        if self.is_playing() {
            self.state.status = PlaybackStatus::Paused;
        }
    }

    fn kick_loop(&mut self) -> bool {
        if self.loop_scheduled {
            return false;
        }
        self.loop_scheduled = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct FakeMedia {
        playing: bool,
        time: f64,
        plays: usize,
        pauses: usize,
    }

    impl MediaElement for FakeMedia {
        fn play(&mut self) {
            self.playing = true;
            self.plays += 1;
        }
        fn pause(&mut self) {
            self.playing = false;
            self.pauses += 1;
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn set_current_time(&mut self, seconds: f64) {
            self.time = seconds;
        }
    }

    #[test]
    fn toggle_twice_restores_status() {
        let mut media = FakeMedia::default();
        let mut ctl = PlaybackController::new();

        assert!(ctl.toggle_play_pause(&mut media));
        assert_eq!(ctl.state().status, PlaybackStatus::Playing);
        assert!(media.playing);

        assert!(!ctl.toggle_play_pause(&mut media));
        assert_eq!(ctl.state().status, PlaybackStatus::Paused);
        assert!(!media.playing);

        ctl.toggle_play_pause(&mut media);
        ctl.toggle_play_pause(&mut media);
        assert_eq!(ctl.state().status, PlaybackStatus::Paused);

        ctl.toggle_play_pause(&mut media);
        let playing = ctl.state().status;
        ctl.toggle_play_pause(&mut media);
        ctl.toggle_play_pause(&mut media);
        assert_eq!(ctl.state().status, playing);
        assert_eq!((media.plays, media.pauses), (4, 3));
    }

    #[test]
    fn stop_from_any_status_resets() {
        for toggles in 0..3 {
            let mut media = FakeMedia::default();
            let mut ctl = PlaybackController::new();
            for _ in 0..toggles {
                ctl.toggle_play_pause(&mut media);
            }
            media.time = 12.5;

            ctl.stop(&mut media);
            assert_eq!(
                ctl.state(),
                PlaybackState {
                    status: PlaybackStatus::Stopped,
                    current_time: 0.0,
                }
            );
            assert_eq!(media.time, 0.0);
            assert!(!media.playing);
        }
    }

    #[test]
    fn loop_reschedules_only_while_playing() {
        let mut media = FakeMedia::default();
        let mut ctl = PlaybackController::new();
        ctl.toggle_play_pause(&mut media);

        media.time = 0.5;
        let tick = ctl.on_animation_frame(&media);
        assert_eq!(
            tick,
            FrameTick {
                redraw: true,
                reschedule: true,
            }
        );
        assert_eq!(ctl.state().current_time, 0.5);

        ctl.toggle_play_pause(&mut media);
        let tick = ctl.on_animation_frame(&media);
        assert!(!tick.redraw && !tick.reschedule);
        assert!(!ctl.loop_scheduled());
    }

    #[test]
    fn clip_end_pauses_and_ends_loop() {
        let mut media = FakeMedia::default();
        let mut ctl = PlaybackController::new();
        ctl.toggle_play_pause(&mut media);
        ctl.on_animation_frame(&media);

        media.playing = false;
        media.time = 10.0;
        ctl.on_pause_event(&media);
        assert_eq!(
            ctl.state(),
            PlaybackState {
                status: PlaybackStatus::Paused,
                current_time: 10.0,
            }
        );
        assert!(!ctl.on_animation_frame(&media).reschedule);

        ctl.stop(&mut media);
        ctl.on_pause_event(&media);
        assert_eq!(ctl.state().status, PlaybackStatus::Stopped);
    }

    #[test]
    fn play_event_does_not_duplicate_loop() {
        let mut media = FakeMedia::default();
        let mut ctl = PlaybackController::new();

        assert!(ctl.toggle_play_pause(&mut media));
        assert!(!ctl.on_play_event(), "loop already scheduled");

        ctl.on_animation_frame(&media);
        ctl.toggle_play_pause(&mut media);
        ctl.on_animation_frame(&media);
        assert!(ctl.on_play_event(), "stopped loop restarts");
        assert!(ctl.is_playing());
    }
}
