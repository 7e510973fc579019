//! Core timeline types for the multitrack engine.
//!
//! This crate defines the data model shared by the engine, the formats
//! layer and the controller: tracks, clips, effect settings, automation
//! curves and chain topology. Everything here is pure data plus pure
//! functions over it.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod asset;
mod audio_buffer;
mod curve;
mod effects;
mod graph;
mod keyframe;
mod mix;
mod snapshot;
mod time;
mod track;

pub use asset::{AssetBuffer, AssetMeta, FileId};
pub use audio_buffer::{AudioBuffer, MAX_CHANNELS};
pub use curve::{interpolate, Interpolation};
pub use effects::{
    EffectChainState, EqBand, EqGains, EqPreset, ExpanderParam, ExpanderSettings, LimiterParam,
    LimiterSettings, MasterLimiterParam, MasterLimiterSettings, MasterSettings,
    NoiseReductionSettings, UnknownPreset,
};
pub use graph::{
    plan_stages, topological_sort, ChainGraph, Connection, NodeId, StageFlags, StageKind,
    MAX_STAGES, STAGE_COUNT,
};
pub use keyframe::{
    AutomationError, Keyframe, KeyframeId, KeyframeMap, KeyframeRecord, KeyframeStore,
    KeyframeUpdate, Parameter, Sampled, NEAREST_THRESHOLD,
};
pub use mix::{recompute_effective_gains, MixFlags};
pub use snapshot::Snapshot;
pub use time::format_time;
pub use track::{
    db_to_linear, linear_to_db, palette_color, timeline_duration, Clip, ClipId, Track, TrackId,
    DEFAULT_TRACK_VOLUME, MAX_TRACKS, TRACK_PALETTE,
};
