//! Single-active-track playback state.
//!
//! The state never touches a media element. Each rendered track derives a
//! [`MediaCommand`] from it and applies that to its own element, so every
//! transition here only has to keep the record consistent.

use log::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub active_track_id: Option<String>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
}

/// What a track view should do with its media element right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

impl PlaybackState {
    pub fn is_active(&self, track_id: &str) -> bool {
        self.active_track_id.as_deref() == Some(track_id)
    }

    pub fn is_playing_track(&self, track_id: &str) -> bool {
        self.is_playing && self.is_active(track_id)
    }

    /// Reconciliation rule shared by every view.
    pub fn command_for(&self, track_id: &str) -> MediaCommand {
        if self.is_playing_track(track_id) {
            MediaCommand::Play
        } else {
            MediaCommand::Pause
        }
    }

    /// Make `track_id` the active track and mark it playing. Returns false when nothing changed.
    pub fn request_play(&mut self, track_id: &str) -> bool {
        if self.is_playing_track(track_id) {
            return false;
        }
        if !self.is_active(track_id) {
            debug!(
                "playback: switching active track {:?} -> {track_id}",
                self.active_track_id
            );
            self.active_track_id = Some(track_id.to_string());
            self.current_time = 0.0;
            self.duration = 0.0;
        }
        self.is_playing = true;
        true
    }

    /// Pause the active track. A no-op when nothing is active or already paused.
    pub fn request_pause(&mut self) -> bool {
        if self.active_track_id.is_none() || !self.is_playing {
            return false;
        }
        self.is_playing = false;
        true
    }

    /// Accept a position report only from the active track's view.
    pub fn report_progress(&mut self, track_id: &str, current_time: f64, duration: f64) -> bool {
        if !self.is_active(track_id) {
            debug!("playback: ignoring stale progress from {track_id}");
            return false;
        }
        self.current_time = finite_or_zero(current_time);
        self.duration = finite_or_zero(duration);
        true
    }

    /// Media start failed. Only the active track can pull `is_playing` back down.
    pub fn report_failure(&mut self, track_id: &str) -> bool {
        if !self.is_active(track_id) {
            return false;
        }
        self.request_pause()
    }

    /// The element ran to the end on its own; position is kept.
    pub fn report_ended(&mut self, track_id: &str) -> bool {
        if !self.is_active(track_id) {
            return false;
        }
        self.request_pause()
    }

    pub fn stop(&mut self) {
        *self = PlaybackState::default();
    }

    /// Position a seek to `fraction` of the track lands on; `None` for inactive tracks.
    pub fn seek_target(&self, track_id: &str, fraction: f64) -> Option<f64> {
        if !self.is_active(track_id) || self.duration <= 0.0 || !fraction.is_finite() {
            return None;
        }
        Some(fraction.clamp(0.0, 1.0) * self.duration)
    }

    /// Percentage of the track that has played, for the progress bar.
    pub fn progress_percent(&self, track_id: &str) -> f64 {
        if !self.is_active(track_id) || self.duration <= 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_views<'a>(state: &PlaybackState, ids: &[&'a str]) -> Vec<&'a str> {
        ids.iter()
            .copied()
            .filter(|id| state.command_for(id) == MediaCommand::Play)
            .collect()
    }

    #[test]
    fn starts_idle() {
        let state = PlaybackState::default();
        assert_eq!(state.active_track_id, None);
        assert!(!state.is_playing);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
    }

    #[test]
    fn switching_tracks_pauses_the_previous_view() {
        let ids = ["1", "2", "3"];
        let mut state = PlaybackState::default();

        state.request_play("1");
        assert_eq!(playing_views(&state, &ids), vec!["1"]);

        state.request_play("2");
        assert_eq!(state.active_track_id.as_deref(), Some("2"));
        assert!(state.is_playing);
        assert_eq!(playing_views(&state, &ids), vec!["2"]);
        assert_eq!(state.command_for("1"), MediaCommand::Pause);
    }

    #[test]
    fn at_most_one_view_plays_across_any_sequence() {
        #[derive(Clone, Copy)]
        enum Op {
            Play(&'static str),
            Pause,
            Stop,
        }
        let ids = ["a", "b", "c"];
        let ops = [
            Op::Play("a"),
            Op::Play("b"),
            Op::Pause,
            Op::Play("b"),
            Op::Play("c"),
            Op::Stop,
            Op::Pause,
            Op::Play("a"),
            Op::Play("a"),
            Op::Stop,
        ];
        let mut state = PlaybackState::default();
        for op in ops {
            match op {
                Op::Play(id) => {
                    state.request_play(id);
                }
                Op::Pause => {
                    state.request_pause();
                }
                Op::Stop => {
                    state.stop();
                    assert_eq!(state.active_track_id, None);
                }
            }
            assert!(playing_views(&state, &ids).len() <= 1);
            if state.is_playing {
                assert!(state.active_track_id.is_some());
            }
        }
    }

    #[test]
    fn play_is_idempotent_for_the_playing_track() {
        let mut state = PlaybackState::default();
        assert!(state.request_play("1"));
        state.report_progress("1", 12.0, 90.0);
        assert!(!state.request_play("1"));
        assert_eq!(state.current_time, 12.0);
    }

    #[test]
    fn resuming_keeps_position_but_switching_resets_it() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.report_progress("1", 30.0, 120.0);
        state.request_pause();
        state.request_play("1");
        assert_eq!(state.current_time, 30.0);

        state.request_play("2");
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
    }

    #[test]
    fn pause_with_nothing_active_is_a_no_op() {
        let mut state = PlaybackState::default();
        assert!(!state.request_pause());
        assert_eq!(state, PlaybackState::default());
    }

    #[test]
    fn pause_keeps_track_and_position() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.report_progress("1", 5.0, 60.0);
        assert!(state.request_pause());
        assert_eq!(state.active_track_id.as_deref(), Some("1"));
        assert_eq!(state.current_time, 5.0);
        assert_eq!(state.duration, 60.0);
        assert_eq!(state.command_for("1"), MediaCommand::Pause);
    }

    #[test]
    fn stale_progress_reports_are_ignored() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.report_progress("1", 3.0, 100.0);
        state.request_play("2");

        assert!(!state.report_progress("1", 4.0, 100.0));
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);

        assert!(state.report_progress("2", 1.0, 50.0));
        assert_eq!(state.current_time, 1.0);
    }

    #[test]
    fn progress_after_stop_is_ignored() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.stop();
        assert!(!state.report_progress("1", 9.0, 10.0));
        assert_eq!(state, PlaybackState::default());
    }

    #[test]
    fn unknown_duration_is_stored_as_zero() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.report_progress("1", 2.0, f64::NAN);
        assert_eq!(state.duration, 0.0);
        assert_eq!(state.progress_percent("1"), 0.0);
    }

    #[test]
    fn failure_on_active_track_stops_playing_flag() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        assert!(!state.report_failure("2"));
        assert!(state.is_playing);
        assert!(state.report_failure("1"));
        assert!(!state.is_playing);
        assert_eq!(state.active_track_id.as_deref(), Some("1"));
    }

    #[test]
    fn ended_track_shows_play_again() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        state.report_progress("1", 60.0, 60.0);
        assert!(state.report_ended("1"));
        assert_eq!(state.command_for("1"), MediaCommand::Pause);
        assert_eq!(state.progress_percent("1"), 100.0);
    }

    #[test]
    fn only_the_active_track_can_seek() {
        let mut state = PlaybackState::default();
        state.request_play("1");
        assert_eq!(state.seek_target("1", 0.5), None);
        state.report_progress("1", 0.0, 200.0);
        assert_eq!(state.seek_target("1", 0.25), Some(50.0));
        assert_eq!(state.seek_target("1", 1.5), Some(200.0));
        assert_eq!(state.seek_target("2", 0.5), None);
    }
}
