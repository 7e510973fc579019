//! Built-in chain processors.

pub mod dynamics;
pub mod expander;
pub mod filter;
pub mod gain;
pub mod limiter;
pub mod panner;

use alloc::boxed::Box;
use mt_ir::{EqBand, StageKind};

use crate::processor::Processor;
use filter::{Filter, FilterKind};

/// Filter for one master or track EQ band.
pub fn eq_band(band: EqBand) -> Filter {
    match band {
        EqBand::Low => Filter::shelf(FilterKind::LowShelf, band.frequency()),
        EqBand::Mid => Filter::new(FilterKind::Peaking, band.frequency(), 1.0, 0.0),
        EqBand::High => Filter::shelf(FilterKind::HighShelf, band.frequency()),
    }
}

/// Create the processor behind a chain stage.
///
/// `Output` is a pure routing node and has no processor.
pub fn create_processor(kind: StageKind) -> Option<Box<dyn Processor>> {
    Some(match kind {
        StageKind::Input => Box::new(gain::Gain::new(1.0)),
        StageKind::Expander => Box::new(expander::Expander::new()),
        StageKind::Highpass => Box::new(Filter::new(FilterKind::Highpass, 80.0, 0.7, 0.0)),
        StageKind::Lowpass => Box::new(Filter::new(FilterKind::Lowpass, 8000.0, 0.7, 0.0)),
        StageKind::Pan => Box::new(panner::Panner::new(0.0)),
        StageKind::EqLow => Box::new(eq_band(EqBand::Low)),
        StageKind::EqMid => Box::new(eq_band(EqBand::Mid)),
        StageKind::EqHigh => Box::new(eq_band(EqBand::High)),
        StageKind::Limiter => Box::new(limiter::Limiter::new()),
        StageKind::Output => return None,
    })
}
