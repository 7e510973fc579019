//! Playback engine for the multitrack timeline.
//!
//! Schedules clip voices against the sample clock, runs every track through
//! its effect chain and sums the result on the master bus.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chain;
mod config;
mod error;
mod frame;
mod mixer;
mod param_timeline;
pub mod processor;
pub mod processors;
mod transport;
mod voice;

pub use chain::TrackChain;
pub use config::EngineConfig;
pub use error::GraphError;
pub use frame::Frame;
pub use mixer::{ClipSource, Engine};
pub use param_timeline::{ControlPoint, EnvelopeShape, ParamTimeline, Ramp, MAX_CONTROL_POINTS};
pub use processor::{ParamInfo, Processor, ProcessorInfo};
pub use transport::{PlaybackState, Transport};
pub use voice::{Voice, VoiceSchedule};
