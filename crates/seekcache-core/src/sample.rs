//! Decoded sample buffers handed over by a decoder.
//!
//! A payload is owned by exactly one holder at a time. Dropping it is the
//! disposal point for whatever the decoder allocated behind it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Elementary stream kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Byte view over decoder-owned memory.
///
/// Implementations wrapping native buffers release them in `Drop`.
pub trait SamplePayload {
    /// The decoded bytes (one frame, or whole audio sample-frames).
    fn as_bytes(&self) -> &[u8];
}

impl SamplePayload for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl SamplePayload for Box<[u8]> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

/// One decoded unit as produced by a decoder: a video frame or a run of
/// audio sample-frames, with the raw decoder timestamp in ticks.
pub struct DecodedSample {
    /// Raw presentation timestamp reported by the decoder (100 ns ticks)
    pub timestamp: i64,
    payload: Box<dyn SamplePayload>,
}

impl DecodedSample {
    /// Wrap a payload with its raw timestamp.
    pub fn new(timestamp: i64, payload: impl SamplePayload + 'static) -> Self {
        Self {
            timestamp,
            payload: Box::new(payload),
        }
    }

    /// Decoded bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Payload size in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.payload.as_bytes().len()
    }

    /// Copy the payload into `dest`, truncating to whichever is shorter.
    /// Returns the number of bytes written.
    pub fn copy_to(&self, dest: &mut [u8]) -> usize {
        let src = self.bytes();
        let len = src.len().min(dest.len());
        dest[..len].copy_from_slice(&src[..len]);
        len
    }
}

impl fmt::Debug for DecodedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedSample")
            .field("timestamp", &self.timestamp)
            .field("bytes", &self.byte_len())
            .finish()
    }
}
