//! Decoded audio assets referenced by clips.

use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::audio_buffer::AudioBuffer;

/// Identifier of an audio asset, as stored in project documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(String::from(s))
    }
}

/// Descriptive metadata for an asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub id: FileId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Length in seconds.
    pub duration: f64,
    pub sample_rate: u32,
    pub number_of_channels: u16,
}

/// Decoded sample data at a fixed sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetBuffer {
    pub sample_rate: u32,
    pub buffer: AudioBuffer,
}

impl AssetBuffer {
    pub fn new(sample_rate: u32, buffer: AudioBuffer) -> Self {
        Self { sample_rate, buffer }
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer.frames() as f64 / self.sample_rate as f64
    }

    /// Metadata describing this buffer under the given id and name.
    pub fn describe(&self, id: FileId, name: &str, category: &str) -> AssetMeta {
        AssetMeta {
            id,
            name: String::from(name),
            category: String::from(category),
            duration: self.duration(),
            sample_rate: self.sample_rate,
            number_of_channels: self.buffer.channels(),
        }
    }

    /// Peak level in dBFS, or `None` for a silent buffer.
    pub fn peak_db(&self) -> Option<f32> {
        let peak = self.buffer.peak();
        if peak <= 0.0 {
            return None;
        }
        Some(20.0 * libm::log10f(peak))
    }

    /// Scale the buffer so its peak lands on `target_db`, clamping into `[-1, 1]`.
    ///
    /// Returns the applied adjustment in dB. Silent buffers are left untouched.
    pub fn normalize(&mut self, target_db: f32) -> Option<f32> {
        let peak_db = self.peak_db()?;
        let adjust_db = target_db - peak_db;
        self.buffer.apply_gain(crate::db_to_linear(adjust_db));
        self.buffer.clamp_unit();
        Some(adjust_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn duration_from_frames() {
        let asset = AssetBuffer::new(100, AudioBuffer::new(1, 250));
        assert!((asset.duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn normalize_to_minus_six() {
        let mut asset = AssetBuffer::new(8, AudioBuffer::from_planes(&[vec![0.25, -0.1]]));
        let adjust = asset.normalize(-6.0).unwrap();
        assert!(adjust > 0.0);
        let peak_db = asset.peak_db().unwrap();
        assert!((peak_db - -6.0).abs() < 1e-3, "peak {}", peak_db);
    }

    #[test]
    fn normalize_silence_is_noop() {
        let mut asset = AssetBuffer::new(8, AudioBuffer::new(2, 4));
        assert!(asset.normalize(0.0).is_none());
        assert_eq!(asset.buffer.peak(), 0.0);
    }

    #[test]
    fn describe_reports_layout() {
        let asset = AssetBuffer::new(48000, AudioBuffer::new(2, 48000));
        let meta = asset.describe(FileId::from("kick"), "kick.wav", "drums");
        assert_eq!(meta.number_of_channels, 2);
        assert_eq!(meta.sample_rate, 48000);
        assert!((meta.duration - 1.0).abs() < 1e-9);
    }
}
