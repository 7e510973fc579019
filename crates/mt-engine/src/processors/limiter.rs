//! Hard-knee limiter.
//!
//! A peak compressor with zero knee: above the threshold the level is
//! reduced by `(1 - 1/ratio)` dB per dB of overshoot. Used on tracks and on
//! the master bus (threshold -6 dB, 20:1, 3 ms attack, 250 ms release).

use super::dynamics::{compression_db, level_to_db, reduction_gain, EnvelopeFollower};
use crate::frame::Frame;
use crate::processor::{ParamInfo, Processor, ProcessorInfo};

pub const THRESHOLD: u16 = 0;
pub const RATIO: u16 = 1;
pub const ATTACK: u16 = 2;
pub const RELEASE: u16 = 3;

static PARAMS: &[ParamInfo] = &[
    ParamInfo { id: THRESHOLD, name: "Threshold", min: -100.0, max: 0.0, default: -6.0 },
    ParamInfo { id: RATIO, name: "Ratio", min: 1.0, max: 20.0, default: 20.0 },
    ParamInfo { id: ATTACK, name: "Attack", min: 0.0, max: 1000.0, default: 3.0 },
    ParamInfo { id: RELEASE, name: "Release", min: 0.0, max: 5000.0, default: 250.0 },
];

static INFO: ProcessorInfo = ProcessorInfo { name: "Limiter", short_name: "Lim", params: PARAMS };

pub struct Limiter {
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: u32,
    envelope: EnvelopeFollower,
}

impl Limiter {
    pub fn new() -> Self {
        let mut l = Self {
            threshold_db: PARAMS[0].default,
            ratio: PARAMS[1].default,
            attack_ms: PARAMS[2].default,
            release_ms: PARAMS[3].default,
            sample_rate: 44100,
            envelope: EnvelopeFollower::new(),
        };
        l.update_times();
        l
    }

    fn update_times(&mut self) {
        self.envelope.set_times(self.attack_ms, self.release_ms, self.sample_rate);
    }

    /// Current gain reduction in dB.
    pub fn reduction_db(&self) -> f32 {
        compression_db(level_to_db(self.envelope.level()), self.threshold_db, self.ratio)
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Limiter {
    fn info(&self) -> &ProcessorInfo {
        &INFO
    }

    fn init(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_times();
    }

    fn process(&mut self, frame: &mut Frame) {
        let level = self.envelope.process(frame.peak());
        let reduction = compression_db(level_to_db(level), self.threshold_db, self.ratio);
        if reduction > 0.0 {
            frame.scale(reduction_gain(reduction));
        }
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
