//! Per-track effect chain settings and presets.
//!
//! The field names double as the persisted project shape, so every struct
//! here carries camelCase serde names and per-field defaults.

use alloc::string::String;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::graph::StageFlags;

/// One band of a 3-band equalizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EqBand {
    /// Low shelf, 100 Hz.
    Low,
    /// Peaking, 1 kHz, Q = 1.
    Mid,
    /// High shelf, 10 kHz.
    High,
}

impl EqBand {
    pub const ALL: [EqBand; 3] = [EqBand::Low, EqBand::Mid, EqBand::High];

    /// Centre or corner frequency of the band in Hz.
    pub const fn frequency(self) -> f32 {
        match self {
            EqBand::Low => 100.0,
            EqBand::Mid => 1000.0,
            EqBand::High => 10_000.0,
        }
    }
}

/// Gains of the three EQ bands in dB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqGains {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl EqGains {
    pub const fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }

    pub fn get(&self, band: EqBand) -> f32 {
        match band {
            EqBand::Low => self.low,
            EqBand::Mid => self.mid,
            EqBand::High => self.high,
        }
    }

    pub fn set(&mut self, band: EqBand, db: f32) {
        match band {
            EqBand::Low => self.low = db,
            EqBand::Mid => self.mid = db,
            EqBand::High => self.high = db,
        }
    }
}

/// Named EQ curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqPreset {
    Flat,
    Phone,
    Clear,
    Wall,
}

impl EqPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "flat" => Some(EqPreset::Flat),
            "phone" => Some(EqPreset::Phone),
            "clear" => Some(EqPreset::Clear),
            "wall" => Some(EqPreset::Wall),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            EqPreset::Flat => "flat",
            EqPreset::Phone => "phone",
            EqPreset::Clear => "clear",
            EqPreset::Wall => "wall",
        }
    }

    pub const fn gains(self) -> EqGains {
        match self {
            EqPreset::Flat => EqGains::new(0.0, 0.0, 0.0),
            EqPreset::Phone => EqGains::new(-24.0, 24.0, -24.0),
            EqPreset::Clear => EqGains::new(-10.0, 3.0, 11.0),
            EqPreset::Wall => EqGains::new(24.0, -24.0, -24.0),
        }
    }
}

/// Unknown EQ preset name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown EQ preset `{0}`")]
pub struct UnknownPreset(pub String);

impl FromStr for EqPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EqPreset::from_name(s).ok_or_else(|| UnknownPreset(String::from(s)))
    }
}

/// Track limiter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterSettings {
    /// Threshold in dB.
    pub threshold: f32,
    /// Release time in milliseconds.
    pub release: f32,
    pub ratio: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self { threshold: -6.0, release: 250.0, ratio: 20.0 }
    }
}

/// Addressable limiter parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimiterParam {
    Threshold,
    Release,
    Ratio,
}

impl LimiterSettings {
    pub fn set(&mut self, param: LimiterParam, value: f32) {
        match param {
            LimiterParam::Threshold => self.threshold = value,
            LimiterParam::Release => self.release = value,
            LimiterParam::Ratio => self.ratio = value,
        }
    }
}

/// Noise gate / downward expander parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderSettings {
    /// Threshold in dB.
    pub threshold: f32,
    pub ratio: f32,
    /// Attack time in milliseconds.
    pub attack: f32,
    /// Release time in milliseconds.
    pub release: f32,
}

impl Default for ExpanderSettings {
    fn default() -> Self {
        Self { threshold: -50.0, ratio: 20.0, attack: 3.0, release: 100.0 }
    }
}

/// Addressable expander parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpanderParam {
    Threshold,
    Ratio,
    Attack,
    Release,
}

impl ExpanderSettings {
    pub fn set(&mut self, param: ExpanderParam, value: f32) {
        match param {
            ExpanderParam::Threshold => self.threshold = value,
            ExpanderParam::Ratio => self.ratio = value,
            ExpanderParam::Attack => self.attack = value,
            ExpanderParam::Release => self.release = value,
        }
    }
}

/// High-pass / low-pass noise reduction filters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseReductionSettings {
    pub highpass_enabled: bool,
    /// Cutoff in Hz.
    pub highpass_frequency: f32,
    /// Resonance (Q).
    pub highpass_resonance: f32,
    pub lowpass_enabled: bool,
    pub lowpass_frequency: f32,
    pub lowpass_resonance: f32,
}

impl Default for NoiseReductionSettings {
    fn default() -> Self {
        Self {
            highpass_enabled: false,
            highpass_frequency: 80.0,
            highpass_resonance: 0.7,
            lowpass_enabled: false,
            lowpass_frequency: 8000.0,
            lowpass_resonance: 0.7,
        }
    }
}

/// Enable flags and parameters of every optional stage on a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectChainState {
    pub eq_enabled: bool,
    pub eq: EqGains,
    pub limiter_enabled: bool,
    pub limiter: LimiterSettings,
    pub noise_reduction_enabled: bool,
    pub noise_reduction: NoiseReductionSettings,
    pub expander_enabled: bool,
    pub expander: ExpanderSettings,
}

impl EffectChainState {
    /// Which optional stages the chain should contain.
    pub fn stage_flags(&self) -> StageFlags {
        StageFlags {
            expander: self.expander_enabled,
            highpass: self.noise_reduction_enabled && self.noise_reduction.highpass_enabled,
            lowpass: self.noise_reduction_enabled && self.noise_reduction.lowpass_enabled,
            eq: self.eq_enabled,
            limiter: self.limiter_enabled,
        }
    }
}

/// Master bus limiter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterLimiterSettings {
    /// Threshold in dB.
    pub threshold: f32,
    /// Release time in milliseconds.
    pub release: f32,
    /// Output ceiling in dB.
    pub ceiling: f32,
}

impl Default for MasterLimiterSettings {
    fn default() -> Self {
        Self { threshold: -6.0, release: 250.0, ceiling: 0.0 }
    }
}

/// Addressable master limiter parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasterLimiterParam {
    Threshold,
    Release,
    Ceiling,
}

impl MasterLimiterSettings {
    pub fn set(&mut self, param: MasterLimiterParam, value: f32) {
        match param {
            MasterLimiterParam::Threshold => self.threshold = value,
            MasterLimiterParam::Release => self.release = value,
            MasterLimiterParam::Ceiling => self.ceiling = value,
        }
    }
}

/// Master bus settings as persisted in projects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSettings {
    pub eq: EqGains,
    pub limiter: MasterLimiterSettings,
}
