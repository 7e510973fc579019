//! Level detection shared by the expander and the limiter.

/// Level floor used when converting to dB (-100 dB).
const LEVEL_FLOOR: f32 = 0.000_01;

/// Peak envelope follower with separate attack and release times.
#[derive(Clone, Debug)]
pub struct EnvelopeFollower {
    level: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

/// One-pole smoothing coefficient for a time constant.
pub fn time_coeff(ms: f32, sample_rate: u32) -> f32 {
    let samples = ms.max(0.01) * 0.001 * sample_rate as f32;
    libm::expf(-1.0 / samples)
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self { level: 0.0, attack_coeff: 0.0, release_coeff: 0.0 }
    }

    /// Recompute coefficients from time constants.
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: u32) {
        self.attack_coeff = time_coeff(attack_ms, sample_rate);
        self.release_coeff = time_coeff(release_ms, sample_rate);
    }

    /// Feed one detector sample and return the envelope level.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.level { self.attack_coeff } else { self.release_coeff };
        self.level = coeff * self.level + (1.0 - coeff) * input_abs;
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear level to dB with a -100 dB floor.
#[inline]
pub fn level_to_db(level: f32) -> f32 {
    20.0 * libm::log10f(level.max(LEVEL_FLOOR))
}

/// Gain reduction in dB of a hard-knee compressor.
#[inline]
pub fn compression_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    let over = level_db - threshold_db;
    if over <= 0.0 {
        0.0
    } else {
        over * (1.0 - 1.0 / ratio.max(1.0))
    }
}

/// Gain reduction in dB of a downward expander.
#[inline]
pub fn expansion_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    let under = threshold_db - level_db;
    if under <= 0.0 {
        0.0
    } else {
        under * (ratio.max(1.0) - 1.0)
    }
}

/// Gain multiplier for a reduction in dB.
#[inline]
pub fn reduction_gain(reduction_db: f32) -> f32 {
    libm::powf(10.0, -reduction_db / 20.0)
}
