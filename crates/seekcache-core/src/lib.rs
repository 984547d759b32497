//! seekcache Core - Foundation types for the decode cache
//!
//! This crate provides the types shared by the cache and reader crates:
//! - Error taxonomy
//! - Tick time base and frame/sample conversions
//! - Decoded sample buffers

pub mod error;
pub mod sample;
pub mod time;

pub use error::{Result, SeekCacheError};
pub use sample::{DecodedSample, SamplePayload, StreamKind};
pub use time::{
    checked_timestamp_from_frame, checked_timestamp_from_sample, frame_from_timestamp,
    sample_from_timestamp, ticks_to_seconds, timestamp_from_frame, timestamp_from_sample,
    FrameRate, TICKS_PER_SECOND,
};

/// Default policy and cache sizes.
pub mod defaults {
    /// Decoded frames kept in the video cache. Larger values stall the
    /// decoder's own read-ahead.
    pub const VIDEO_CACHE_CAPACITY: usize = 4;

    /// Decoded blocks kept in the audio cache. Blocks are small, and a deeper
    /// history keeps scrubbing near the playhead seek-free.
    pub const AUDIO_CACHE_CAPACITY: usize = 20;

    /// Largest forward frame distance served by sequential decoding.
    pub const SEQUENTIAL_FRAME_THRESHOLD: i64 = 30;

    /// Largest forward sample distance served by sequential decoding.
    pub const SEQUENTIAL_SAMPLE_THRESHOLD: i64 = 30_000;

    /// Counted vs timestamp-derived frame disagreement tolerated silently.
    pub const WARN_GAP_FRAMES: i64 = 1;

    /// Counted vs timestamp-derived sample disagreement tolerated silently.
    pub const WARN_GAP_SAMPLES: i64 = 100;
}
