//! File formats for the multitrack engine.
//!
//! PCM WAV export and import, and the JSON project document.

mod project;
mod wav_format;

pub use project::{ClipDocument, ProjectDocument, TrackDocument, PROJECT_VERSION};
pub use wav_format::{buffer_to_wav, frames_to_wav, load_wav, write_buffer, write_wav};

use thiserror::Error;

/// Error type for format parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    #[error("invalid header")]
    InvalidHeader,
    /// Unexpected end of file
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Encoding or layout this reader does not handle
    #[error("unsupported format: {0}")]
    Unsupported(String),
    /// Malformed project document
    #[error("project document: {0}")]
    Document(#[from] serde_json::Error),
}
