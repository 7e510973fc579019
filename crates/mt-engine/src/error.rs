//! Engine errors.

use mt_ir::{ClipId, TrackId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("track {0} has no chain")]
    UnknownTrack(TrackId),
    #[error("track {0} already has a chain")]
    DuplicateTrack(TrackId),
    #[error("clip {0} has no registered source")]
    UnknownClip(ClipId),
}
