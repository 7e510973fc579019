//! Stereo biquad filter: EQ bands and noise-reduction passes.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};

use crate::frame::Frame;
use crate::processor::{ParamInfo, Processor, ProcessorInfo};

pub const FREQUENCY: u16 = 0;
pub const Q: u16 = 1;
pub const GAIN_DB: u16 = 2;

/// Filter response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Highpass,
    Lowpass,
    LowShelf,
    Peaking,
    HighShelf,
}

impl FilterKind {
    /// Whether the response depends on a gain and is flat at 0 dB.
    fn uses_gain(self) -> bool {
        matches!(self, FilterKind::LowShelf | FilterKind::Peaking | FilterKind::HighShelf)
    }
}

static PARAMS: &[ParamInfo] = &[
    ParamInfo { id: FREQUENCY, name: "Frequency", min: 10.0, max: 22050.0, default: 1000.0 },
    ParamInfo { id: Q, name: "Q", min: 0.0001, max: 100.0, default: Q_BUTTERWORTH_F32 },
    ParamInfo { id: GAIN_DB, name: "Gain", min: -40.0, max: 40.0, default: 0.0 },
];

static INFO: ProcessorInfo = ProcessorInfo { name: "Biquad Filter", short_name: "Filter", params: PARAMS };

/// A pair of biquads (left/right) sharing one set of coefficients.
///
/// The filter bypasses itself when the response would be flat (0 dB gain on
/// a shelf or peaking band) or when the frequency is at or above Nyquist.
pub struct Filter {
    kind: FilterKind,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: u32,
    left: Option<DirectForm2Transposed<f32>>,
    right: Option<DirectForm2Transposed<f32>>,
}

impl Filter {
    pub fn new(kind: FilterKind, frequency: f32, q: f32, gain_db: f32) -> Self {
        Self {
            kind,
            frequency: PARAMS[0].clamp(frequency),
            q: PARAMS[1].clamp(q),
            gain_db: PARAMS[2].clamp(gain_db),
            sample_rate: 44100,
            left: None,
            right: None,
        }
    }

    /// Shelving EQ band (Q fixed at Butterworth slope).
    pub fn shelf(kind: FilterKind, frequency: f32) -> Self {
        Self::new(kind, frequency, Q_BUTTERWORTH_F32, 0.0)
    }

    pub fn is_bypassed(&self) -> bool {
        self.left.is_none()
    }

    fn coefficients(&self) -> Option<Coefficients<f32>> {
        if self.kind.uses_gain() && self.gain_db == 0.0 {
            return None;
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.frequency >= nyquist {
            return None;
        }
        let response = match self.kind {
            FilterKind::Highpass => Type::HighPass,
            FilterKind::Lowpass => Type::LowPass,
            FilterKind::LowShelf => Type::LowShelf(self.gain_db),
            FilterKind::Peaking => Type::PeakingEQ(self.gain_db),
            FilterKind::HighShelf => Type::HighShelf(self.gain_db),
        };
        Coefficients::<f32>::from_params(
            response,
            (self.sample_rate as f32).hz(),
            self.frequency.hz(),
            self.q,
        )
        .ok()
    }

    fn recompute(&mut self) {
        match self.coefficients() {
            Some(c) => match (&mut self.left, &mut self.right) {
                (Some(l), Some(r)) => {
                    l.update_coefficients(c);
                    r.update_coefficients(c);
                }
                _ => {
                    self.left = Some(DirectForm2Transposed::<f32>::new(c));
                    self.right = Some(DirectForm2Transposed::<f32>::new(c));
                }
            },
            None => {
                self.left = None;
                self.right = None;
            }
        }
    }
}

impl Processor for Filter {
    fn info(&self) -> &ProcessorInfo {
        &INFO
    }

    fn init(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.recompute();
    }

    #[inline]
    fn process(&mut self, frame: &mut Frame) {
        if let (Some(l), Some(r)) = (&mut self.left, &mut self.right) {
            frame.left = l.run(frame.left);
            frame.right = r.run(frame.right);
        }
    }

    fn reset(&mut self) {
        if let (Some(l), Some(r)) = (&mut self.left, &mut self.right) {
            l.reset_state();
            r.reset_state();
        }
    }

    fn set_param(&mut self, param: u16, value: f32) {
        let Some(info) = INFO.param(param) else { return };
        let value = info.clamp(value);
        match param {
            FREQUENCY => self.frequency = value,
            Q => self.q = value,
            GAIN_DB => self.gain_db = value,
            _ => return,
        }
        self.recompute();
    }
}
