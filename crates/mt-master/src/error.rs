//! Controller errors.

use mt_audio::AudioError;
use mt_engine::GraphError;
use mt_formats::FormatError;
use mt_ir::{AutomationError, ClipId, FileId, TrackId, UnknownPreset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("track limit of {0} reached")]
    CapacityExceeded(usize),
    #[error("unknown track {0}")]
    UnknownTrack(TrackId),
    #[error("unknown clip {0}")]
    UnknownClip(ClipId),
    #[error("no asset with id {0}")]
    MissingAsset(FileId),
    #[error("asset {0} holds no audio")]
    EmptyAsset(FileId),
    #[error("failed to decode asset {file}: {source}")]
    DecodeFailure {
        file: FileId,
        #[source]
        source: FormatError,
    },
    #[error(transparent)]
    UnknownPreset(#[from] UnknownPreset),
    #[error("invalid keyframe: {0}")]
    InvalidKeyframe(#[from] AutomationError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
}
