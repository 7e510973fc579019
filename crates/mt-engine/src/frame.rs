//! Audio frame type.

/// A stereo audio frame (32-bit float, nominal range -1..1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Mix another frame into this one.
    #[inline]
    pub fn mix(&mut self, other: Frame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Scale both channels by `gain`.
    #[inline]
    pub fn scale(&mut self, gain: f32) {
        self.left *= gain;
        self.right *= gain;
    }

    /// Larger of the two channel magnitudes.
    #[inline]
    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}
