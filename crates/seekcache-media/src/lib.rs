//! seekcache Media - random access over sequential decoders
//!
//! This crate handles:
//! - The decoder contract and stream selection
//! - Seek-vs-advance decisions for frame and sample requests
//! - Aligning video and audio on a common timeline
//! - Running a reader on a dedicated decode thread

pub mod config;
pub mod decoder;
pub mod info;
pub mod policy;
pub mod reader;
pub mod stats;
pub mod sync;
mod track;
pub mod worker;

pub use config::{ContinuityPolicy, ReaderConfig};
pub use decoder::{AudioFormat, Decoder, ReadOutcome, StreamLayout, StreamSelection, VideoFormat};
pub use info::MediaInfo;
pub use policy::{SeekDecision, SeekPolicy};
pub use reader::DecodeCacheReader;
pub use stats::{ReaderStats, StreamStats};
pub use sync::StreamSynchronizer;
pub use worker::{ReaderHandle, WORKER_THREAD_NAME};
