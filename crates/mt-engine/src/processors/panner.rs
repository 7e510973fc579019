//! Equal-power stereo panner.
//!
//! Stereo input is handled the way a browser `StereoPannerNode` does it: the
//! channel on the far side is folded into the near side, so centre is the
//! identity and hard left/right put the whole signal on one channel.

use core::f32::consts::FRAC_PI_2;

use crate::frame::Frame;
use crate::processor::{ParamInfo, Processor, ProcessorInfo};

pub const PAN: u16 = 0;

static PARAMS: &[ParamInfo] = &[ParamInfo { id: PAN, name: "Pan", min: -1.0, max: 1.0, default: 0.0 }];

static INFO: ProcessorInfo = ProcessorInfo { name: "Stereo Panner", short_name: "Pan", params: PARAMS };

pub struct Panner {
    pan: f32,
    gain_l: f32,
    gain_r: f32,
}

impl Panner {
    pub fn new(pan: f32) -> Self {
        let mut p = Self { pan: 0.0, gain_l: 0.0, gain_r: 1.0 };
        p.set_pan(pan);
        p
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = PARAMS[0].clamp(pan);
        let x = if self.pan <= 0.0 { self.pan + 1.0 } else { self.pan };
        self.gain_l = libm::cosf(x * FRAC_PI_2);
        self.gain_r = libm::sinf(x * FRAC_PI_2);
    }
}

impl Processor for Panner {
    fn info(&self) -> &ProcessorInfo {
        &INFO
    }

    fn init(&mut self, _sample_rate: u32) {}

    #[inline]
    fn process(&mut self, frame: &mut Frame) {
        let (l, r) = (frame.left, frame.right);
        if self.pan <= 0.0 {
            frame.left = l + r * self.gain_l;
            frame.right = r * self.gain_r;
        } else {
            frame.left = l * self.gain_l;
            frame.right = r + l * self.gain_r;
        }
    }

    fn reset(&mut self) {}

    fn set_param(&mut self, param: u16, value: f32) {
        if param == PAN {
            self.set_pan(value);
        }
    }
}
