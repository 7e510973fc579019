//! Processor trait for chain stages.

use crate::frame::Frame;

/// Metadata describing a processor parameter.
pub struct ParamInfo {
    pub id: u16,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamInfo {
    /// Clamp `value` into this parameter's range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Static metadata about a processor.
pub struct ProcessorInfo {
    pub name: &'static str,
    pub short_name: &'static str,
    pub params: &'static [ParamInfo],
}

impl ProcessorInfo {
    pub fn param(&self, id: u16) -> Option<&ParamInfo> {
        self.params.iter().find(|p| p.id == id)
    }
}

/// Core trait for stereo effects in a chain or on the master bus.
///
/// `process` runs on the render path and must not allocate.
pub trait Processor: Send {
    fn info(&self) -> &ProcessorInfo;
    fn init(&mut self, sample_rate: u32);
    fn process(&mut self, frame: &mut Frame);
    /// Clear internal state (filter memories, detector levels).
    fn reset(&mut self);
    fn set_param(&mut self, param: u16, value: f32);

    /// Process a run of frames in place.
    fn work(&mut self, frames: &mut [Frame]) {
        for frame in frames {
            self.process(frame);
        }
    }
}
