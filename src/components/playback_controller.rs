use crate::playback::{MediaCommand, PlaybackState};
use dioxus::prelude::*;
use log::debug;

/// Shared handle every track view uses to read and change the playback state.
///
/// It only writes the state; each view reconciles its own media element.
#[derive(Clone, Copy, PartialEq)]
pub struct PlaybackController {
    state: Signal<PlaybackState>,
}

impl PlaybackController {
    pub fn new(state: Signal<PlaybackState>) -> Self {
        Self { state }
    }

    pub fn current(&self) -> PlaybackState {
        (self.state)()
    }

    pub fn peek(&self) -> PlaybackState {
        self.state.peek().clone()
    }

    /// Reactive read of the command a given track's element should follow.
    pub fn command_for(&self, track_id: &str) -> MediaCommand {
        self.state.read().command_for(track_id)
    }

    pub fn request_play(&mut self, track_id: &str) {
        if self.state.peek().is_playing_track(track_id) {
            return;
        }
        debug!("request_play {track_id}");
        self.state.with_mut(|state| {
            state.request_play(track_id);
        });
    }

    pub fn request_pause(&mut self) {
        let state = self.state.peek();
        if state.active_track_id.is_none() || !state.is_playing {
            return;
        }
        drop(state);
        debug!("request_pause");
        self.state.with_mut(|state| {
            state.request_pause();
        });
    }

    pub fn report_progress(&mut self, track_id: &str, current_time: f64, duration: f64) {
        if !self.state.peek().is_active(track_id) {
            debug!("dropping progress from inactive track {track_id}");
            return;
        }
        self.state.with_mut(|state| {
            state.report_progress(track_id, current_time, duration);
        });
    }

    pub fn report_failure(&mut self, track_id: &str) {
        if self.state.peek().is_playing_track(track_id) {
            debug!("media failed for active track {track_id}");
            self.state.with_mut(|state| {
                state.report_failure(track_id);
            });
        }
    }

    pub fn report_ended(&mut self, track_id: &str) {
        if self.state.peek().is_playing_track(track_id) {
            self.state.with_mut(|state| {
                state.report_ended(track_id);
            });
        }
    }

    pub fn stop(&mut self) {
        debug!("stop");
        self.state.with_mut(PlaybackState::stop);
    }

    /// Hand out the state for a mutation that must happen together with another one.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut PlaybackState) -> R) -> R {
        self.state.with_mut(f)
    }
}
