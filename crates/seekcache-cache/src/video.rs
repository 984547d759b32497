//! Frame-indexed cache of decoded video frames.

use crate::ring::BoundedCache;
use seekcache_core::DecodedSample;
use tracing::trace;

/// A decoded frame with the frame index assigned to it by the reader.
#[derive(Debug)]
pub struct CachedFrame {
    /// Frame index on the synchronized timeline
    pub position: i64,
    /// Decoded frame
    pub sample: DecodedSample,
}

/// Recently decoded frames, oldest first.
#[derive(Debug)]
pub struct VideoCache {
    entries: BoundedCache<CachedFrame>,
}

impl VideoCache {
    /// Create an empty cache for at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedCache::new(capacity),
        }
    }

    /// Cache a frame at `position`, evicting the oldest frame when full.
    pub fn push(&mut self, position: i64, sample: DecodedSample) {
        if self.entries.push_back(CachedFrame { position, sample }) {
            trace!(position, "video cache full, evicted oldest frame");
        }
    }

    /// Most recent frame cached at exactly `position`.
    ///
    /// Searches newest to oldest: nearby requests usually hit the latest
    /// frames, and a duplicated position resolves to the newest decode.
    pub fn find(&self, position: i64) -> Option<&CachedFrame> {
        self.entries.iter().rev().find(|frame| frame.position == position)
    }

    /// Newest cached frame.
    pub fn back(&self) -> Option<&CachedFrame> {
        self.entries.back()
    }

    /// Position of the newest cached frame.
    pub fn last_position(&self) -> Option<i64> {
        self.entries.back().map(|frame| frame.position)
    }

    /// Oldest cached frame.
    pub fn front(&self) -> Option<&CachedFrame> {
        self.entries.front()
    }

    /// Drop every cached frame.
    pub fn reset(&mut self) {
        self.entries.reset();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}
