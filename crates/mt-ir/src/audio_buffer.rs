//! Multichannel f32 audio buffer with planar layout.

use alloc::vec;
use alloc::vec::Vec;

/// Maximum number of audio channels per buffer.
pub const MAX_CHANNELS: u16 = 8;

/// A multichannel f32 audio buffer in planar layout.
///
/// Data is stored as `channels` contiguous planes of `frames` samples each.
/// `data[ch * frames + frame]` gives the sample for channel `ch` at `frame`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: u16,
    frames: usize,
}

impl AudioBuffer {
    /// Create a new silent buffer with the given dimensions.
    pub fn new(channels: u16, frames: usize) -> Self {
        Self {
            data: vec![0.0; channels as usize * frames],
            channels,
            frames,
        }
    }

    /// Build a buffer from one plane per channel.
    ///
    /// Planes shorter than the longest one are padded with silence.
    pub fn from_planes(planes: &[Vec<f32>]) -> Self {
        let frames = planes.iter().map(Vec::len).max().unwrap_or(0);
        let mut buf = Self::new(planes.len() as u16, frames);
        for (ch, plane) in planes.iter().enumerate() {
            buf.channel_mut(ch as u16)[..plane.len()].copy_from_slice(plane);
        }
        buf
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Whether the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames == 0 || self.channels == 0
    }

    /// Read-only access to one channel's sample data.
    pub fn channel(&self, ch: u16) -> &[f32] {
        let start = ch as usize * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutable access to one channel's sample data.
    pub fn channel_mut(&mut self, ch: u16) -> &mut [f32] {
        let start = ch as usize * self.frames;
        let len = self.frames;
        &mut self.data[start..start + len]
    }

    /// Sample at `frame` on channel `ch`, or silence when out of range.
    #[inline]
    pub fn sample(&self, ch: u16, frame: usize) -> f32 {
        if ch >= self.channels || frame >= self.frames {
            return 0.0;
        }
        self.data[ch as usize * self.frames + frame]
    }

    /// Scale all samples by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for s in &mut self.data {
            *s *= gain;
        }
    }

    /// Clamp every sample into `[-1, 1]`.
    pub fn clamp_unit(&mut self) {
        for s in &mut self.data {
            *s = s.clamp(-1.0, 1.0);
        }
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let buf = AudioBuffer::new(2, 4);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.frames(), 4);
        assert!(buf.channel(0).iter().all(|&s| s == 0.0));
        assert!(buf.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn channel_mut_writes_correctly() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.channel_mut(0)[0] = 1.0;
        buf.channel_mut(1)[1] = -0.5;
        assert_eq!(buf.channel(0), &[1.0, 0.0]);
        assert_eq!(buf.channel(1), &[0.0, -0.5]);
    }

    #[test]
    fn from_planes_pads_short_channels() {
        let buf = AudioBuffer::from_planes(&[vec![0.1, 0.2, 0.3], vec![0.4]]);
        assert_eq!(buf.frames(), 3);
        assert_eq!(buf.channel(1), &[0.4, 0.0, 0.0]);
    }

    #[test]
    fn sample_out_of_range_is_silent() {
        let buf = AudioBuffer::from_planes(&[vec![0.5]]);
        assert_eq!(buf.sample(0, 0), 0.5);
        assert_eq!(buf.sample(0, 1), 0.0);
        assert_eq!(buf.sample(3, 0), 0.0);
    }

    #[test]
    fn silence_clears_data() {
        let mut buf = AudioBuffer::new(1, 2);
        buf.channel_mut(0)[0] = 1.0;
        buf.silence();
        assert_eq!(buf.channel(0), &[0.0, 0.0]);
    }

    #[test]
    fn apply_gain_then_clamp() {
        let mut buf = AudioBuffer::from_planes(&[vec![0.6, -0.3]]);
        buf.apply_gain(2.0);
        buf.clamp_unit();
        assert_eq!(buf.channel(0)[0], 1.0);
        assert!((buf.channel(0)[1] - -0.6).abs() < 1e-6);
    }

    #[test]
    fn peak_is_absolute_maximum() {
        let buf = AudioBuffer::from_planes(&[vec![0.2, -0.7], vec![0.5, 0.1]]);
        assert!((buf.peak() - 0.7).abs() < 1e-6);
        assert_eq!(AudioBuffer::new(2, 0).peak(), 0.0);
    }
}
