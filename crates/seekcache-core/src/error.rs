//! Error types for seekcache.

use crate::StreamKind;
use thiserror::Error;

/// Main error type for seekcache operations.
#[derive(Error, Debug)]
pub enum SeekCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No playable video or audio stream")]
    NoPlayableStreams,

    #[error("First read of the {stream} stream failed: {reason}")]
    FirstReadFailed { stream: StreamKind, reason: String },

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Reconfiguring the {stream} stream failed: {reason}")]
    Reconfigure { stream: StreamKind, reason: String },

    #[error("Payload of {bytes} bytes is not a multiple of block align {block_align}")]
    MisalignedPayload { bytes: usize, block_align: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Decode worker is no longer running")]
    WorkerGone,

    #[error("Call made from the decode worker thread itself")]
    Reentrant,
}

/// Result type alias for seekcache operations.
pub type Result<T> = std::result::Result<T, SeekCacheError>;
