//! Tracks and the clips placed on them.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::asset::FileId;
use crate::effects::EffectChainState;
use crate::mix::MixFlags;

/// Maximum number of live tracks.
pub const MAX_TRACKS: usize = 30;

/// Default linear volume of a new track.
pub const DEFAULT_TRACK_VOLUME: f32 = 0.8;

/// Display colors, assigned cyclically by creation order.
pub const TRACK_PALETTE: [&str; 8] = [
    "#D4A574", "#A0855B", "#B88A5F", "#C9A882", "#E8C9A1", "#D6B892", "#BFA078", "#C8B299",
];

/// Track identifier. Monotonic, starts at 1, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

/// Clip identifier. Monotonic, starts at 1, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Palette color for the `n`-th created track (0-based).
pub fn palette_color(creation_index: usize) -> &'static str {
    TRACK_PALETTE[creation_index % TRACK_PALETTE.len()]
}

/// Convert decibels to a linear amplitude multiplier.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    libm::powf(10.0, db / 20.0)
}

/// Convert a linear amplitude multiplier to decibels.
#[inline]
pub fn linear_to_db(gain: f32) -> f32 {
    20.0 * libm::log10f(gain)
}

/// A bounded placement of an audio asset on a track's timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub file_id: FileId,
    /// Display name, taken from the asset.
    pub name: String,
    /// Timeline position in seconds.
    pub start_time: f64,
    /// Length in seconds.
    pub duration: f64,
    /// Seconds into the source where playback begins.
    pub offset: f64,
    /// Gain in dB.
    pub gain: f32,
    /// Fade-in length in seconds.
    pub fade_in: f64,
    /// Fade-out length in seconds.
    pub fade_out: f64,
}

impl Clip {
    pub fn new(id: ClipId, file_id: FileId, name: &str, start_time: f64, duration: f64) -> Self {
        Self {
            id,
            file_id,
            name: String::from(name),
            start_time,
            duration,
            offset: 0.0,
            gain: 0.0,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    /// Timeline position where the clip stops sounding.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Sustain level of the clip's gain envelope.
    pub fn gain_linear(&self) -> f32 {
        db_to_linear(self.gain)
    }

    /// Time relative to the clip start, if `time` falls inside the clip.
    pub fn local_time(&self, time: f64) -> Option<f64> {
        let rel = time - self.start_time;
        (rel >= 0.0 && rel <= self.duration).then_some(rel)
    }
}

/// A mixer channel holding an ordered list of clips.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub color: &'static str,
    /// Linear volume, 0..=1.
    pub volume: f32,
    pub mute: bool,
    pub solo: bool,
    /// Stereo position, -1 (left) ..= 1 (right).
    pub pan: f32,
    pub effects: EffectChainState,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(id: TrackId, name: &str, color: &'static str) -> Self {
        Self {
            id,
            name: String::from(name),
            color,
            volume: DEFAULT_TRACK_VOLUME,
            mute: false,
            solo: false,
            pan: 0.0,
            effects: EffectChainState::default(),
            clips: Vec::new(),
        }
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Volume, mute and solo as seen by the gain recomputation.
    pub fn mix_flags(&self) -> MixFlags {
        MixFlags { volume: self.volume, mute: self.mute, solo: self.solo }
    }

    /// End of the last clip on this track.
    pub fn end_time(&self) -> f64 {
        self.clips.iter().map(Clip::end_time).fold(0.0, f64::max)
    }
}

/// Timeline length: the latest clip end over all tracks, 0 with no clips.
pub fn timeline_duration(tracks: &[Track]) -> f64 {
    tracks.iter().map(Track::end_time).fold(0.0, f64::max)
}
