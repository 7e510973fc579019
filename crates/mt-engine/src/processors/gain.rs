//! Linear gain stage.

use crate::frame::Frame;
use crate::processor::{ParamInfo, Processor, ProcessorInfo};

pub const GAIN: u16 = 0;

static PARAMS: &[ParamInfo] = &[ParamInfo { id: GAIN, name: "Gain", min: 0.0, max: 16.0, default: 1.0 }];

static INFO: ProcessorInfo = ProcessorInfo { name: "Gain", short_name: "Gain", params: PARAMS };

pub struct Gain {
    gain: f32,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self { gain: PARAMS[0].clamp(gain) }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl Processor for Gain {
    fn info(&self) -> &ProcessorInfo {
        &INFO
    }

    fn init(&mut self, _sample_rate: u32) {}

    #[inline]
    fn process(&mut self, frame: &mut Frame) {
        frame.scale(self.gain);
    }

    fn reset(&mut self) {}

    fn set_param(&mut self, param: u16, value: f32) {
        if param == GAIN {
            self.gain = PARAMS[0].clamp(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_both_channels() {
        let mut g = Gain::new(0.5);
        let mut f = Frame::new(0.5, -1.0);
        g.process(&mut f);
        assert_eq!(f, Frame::new(0.25, -0.5));
    }

    #[test]
    fn negative_gain_clamps_to_silence() {
        let mut g = Gain::new(1.0);
        g.set_param(GAIN, -2.0);
        assert_eq!(g.gain(), 0.0);
    }
}
