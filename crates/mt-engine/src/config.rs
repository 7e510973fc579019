//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the engine and the controller that owns it.
///
/// Every field has a default so a partial TOML table is enough.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Transport ticks per second.
    pub tick_hz: u32,
    /// Maximum number of tracks in a project.
    pub max_tracks: usize,
    /// Maximum number of undo snapshots kept.
    pub history_capacity: usize,
    /// Master output volume (linear).
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            tick_hz: 60,
            max_tracks: mt_ir::MAX_TRACKS,
            history_capacity: 50,
            master_volume: 0.8,
        }
    }
}

impl EngineConfig {
    /// Output frames rendered per transport tick.
    pub fn frames_per_tick(&self) -> usize {
        (self.sample_rate / self.tick_hz.max(1)) as usize
    }
}
