//! In-memory sink that records every written frame.

use mt_engine::Frame;

use crate::traits::{AudioError, AudioOutput};

/// Collects frames instead of playing them. Writes while stopped are dropped.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    sample_rate: u32,
    running: bool,
    frames: Vec<Frame>,
}

impl MemoryOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate, running: false, frames: Vec::new() }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl AudioOutput for MemoryOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        if self.running {
            self.frames.extend_from_slice(frames);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running = false;
        Ok(())
    }
}
