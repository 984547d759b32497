//! seekcache Cache - Bounded caches for decoded media
//!
//! Architecture:
//! - `BoundedCache`: fixed-capacity circular FIFO buffer, drops evicted entries
//! - `VideoCache`: frame-indexed frames, newest-first exact lookup
//! - `AudioCache`: sample-indexed blocks, oldest-first range stitching

pub mod audio;
pub mod ring;
pub mod video;

pub use audio::{AudioCache, CachedAudio};
pub use ring::BoundedCache;
pub use video::{CachedFrame, VideoCache};
