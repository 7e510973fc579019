//! Playhead state shared by the engine and the controller.

use serde::{Deserialize, Serialize};

/// Transport state machine: Stopped <-> Playing <-> Paused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Playhead position, duration and rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    /// Playhead in timeline seconds.
    pub current_time: f64,
    /// Timeline length in seconds (max clip end).
    pub duration: f64,
    pub state: PlaybackState,
    /// Timeline seconds advanced per wall-clock second.
    pub playback_rate: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self { current_time: 0.0, duration: 0.0, state: PlaybackState::Stopped, playback_rate: 1.0 }
    }
}

impl Transport {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Advance the playhead by `dt` wall-clock seconds.
    ///
    /// Returns `true` when the playhead reached the end, in which case the
    /// transport is stopped and rewound to zero.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.current_time += dt * self.playback_rate;
        if self.current_time >= self.duration {
            self.state = PlaybackState::Stopped;
            self.current_time = 0.0;
            return true;
        }
        false
    }

    /// Move the playhead, clamped to `[0, duration]`.
    pub fn seek(&mut self, time: f64) -> f64 {
        let t = if time.is_finite() { time } else { 0.0 };
        self.current_time = t.clamp(0.0, self.duration.max(0.0));
        self.current_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(duration: f64) -> Transport {
        Transport { duration, state: PlaybackState::Playing, ..Transport::default() }
    }

    #[test]
    fn advance_scales_by_rate() {
        let mut t = playing(10.0);
        t.playback_rate = 2.0;
        assert!(!t.advance(0.5));
        assert!((t.current_time - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reaching_end_stops_and_rewinds() {
        let mut t = playing(1.0);
        t.current_time = 0.99;
        assert!(t.advance(0.05));
        assert_eq!(t.state, PlaybackState::Stopped);
        assert_eq!(t.current_time, 0.0);
    }

    #[test]
    fn paused_does_not_advance() {
        let mut t = playing(5.0);
        t.state = PlaybackState::Paused;
        t.current_time = 2.0;
        assert!(!t.advance(1.0));
        assert_eq!(t.current_time, 2.0);
    }

    #[test]
    fn seek_clamps() {
        let mut t = Transport { duration: 4.0, ..Transport::default() };
        assert_eq!(t.seek(-1.0), 0.0);
        assert_eq!(t.seek(9.0), 4.0);
        assert_eq!(t.seek(f64::NAN), 0.0);
        assert_eq!(t.seek(1.5), 1.5);
    }
}
