//! Noise gate / downward expander.
//!
//! Below the threshold the signal is attenuated by `(ratio - 1)` dB per dB
//! of shortfall, so a high ratio behaves like a gate. Ratios below 1 are
//! treated as 1 (transparent).

use super::dynamics::{expansion_db, level_to_db, reduction_gain, EnvelopeFollower};
use crate::frame::Frame;
use crate::processor::{ParamInfo, Processor, ProcessorInfo};

pub const THRESHOLD: u16 = 0;
pub const RATIO: u16 = 1;
pub const ATTACK: u16 = 2;
pub const RELEASE: u16 = 3;

/// Deepest attenuation applied, in dB.
const MAX_REDUCTION_DB: f32 = 96.0;

static PARAMS: &[ParamInfo] = &[
    ParamInfo { id: THRESHOLD, name: "Threshold", min: -100.0, max: 0.0, default: -50.0 },
    ParamInfo { id: RATIO, name: "Ratio", min: 0.0, max: 100.0, default: 20.0 },
    ParamInfo { id: ATTACK, name: "Attack", min: 0.0, max: 1000.0, default: 3.0 },
    ParamInfo { id: RELEASE, name: "Release", min: 0.0, max: 5000.0, default: 100.0 },
];

static INFO: ProcessorInfo = ProcessorInfo { name: "Noise Gate", short_name: "Gate", params: PARAMS };

pub struct Expander {
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: u32,
    envelope: EnvelopeFollower,
}

impl Expander {
    pub fn new() -> Self {
        let mut e = Self {
            threshold_db: PARAMS[0].default,
            ratio: PARAMS[1].default,
            attack_ms: PARAMS[2].default,
            release_ms: PARAMS[3].default,
            sample_rate: 44100,
            envelope: EnvelopeFollower::new(),
        };
        e.update_times();
        e
    }

    fn update_times(&mut self) {
        self.envelope.set_times(self.attack_ms, self.release_ms, self.sample_rate);
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Expander {
    fn info(&self) -> &ProcessorInfo {
        &INFO
    }

    fn init(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_times();
    }

    fn process(&mut self, frame: &mut Frame) {
        let level = self.envelope.process(frame.peak());
        let reduction = expansion_db(level_to_db(level), self.threshold_db, self.ratio);
        frame.scale(reduction_gain(reduction.min(MAX_REDUCTION_DB)));
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }

    fn set_param(&mut self, param: u16, value: f32) {
        let Some(info) = INFO.param(param) else { return };
        let value = info.clamp(value);
        match param {
            THRESHOLD => self.threshold_db = value,
            RATIO => self.ratio = value,
            ATTACK => {
                self.attack_ms = value;
                self.update_times();
            }
            RELEASE => {
                self.release_ms = value;
                self.update_times();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(e: &mut Expander, amplitude: f32, frames: usize) -> Frame {
        let mut out = Frame::silence();
        for _ in 0..frames {
            out = Frame::mono(amplitude);
            e.process(&mut out);
        }
        out
    }

    #[test]
    fn loud_signal_passes() {
        let mut e = Expander::new();
        e.init(48000);
        let out = settle(&mut e, 0.5, 4800);
        assert!((out.left - 0.5).abs() < 1e-4, "got {}", out.left);
    }

    #[test]
    fn quiet_signal_is_gated() {
        let mut e = Expander::new();
        e.init(48000);
        // -60 dBFS is 10 dB under the -50 dB threshold.
        let out = settle(&mut e, 0.001, 48000);
        assert!(out.left.abs() < 1e-6, "got {}", out.left);
    }

    #[test]
    fn unity_ratio_is_transparent() {
        let mut e = Expander::new();
        e.init(48000);
        e.set_param(RATIO, 0.5);
        let out = settle(&mut e, 0.001, 4800);
        assert!((out.left - 0.001).abs() < 1e-7);
    }
}
