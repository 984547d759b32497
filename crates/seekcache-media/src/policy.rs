//! Seek-or-advance decision.
//!
//! Seeking a native decoder flushes it and resyncs on a keyframe, which is
//! expensive. Short forward jumps are cheaper to decode through, even though
//! the frames in between are thrown away.

/// What to do about a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDecision {
    /// Keep decoding forward from the current position
    Advance,
    /// Reposition the decoder at the requested position
    Seek,
}

/// Sequential-distance threshold for one stream, in frames or sample-frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekPolicy {
    threshold: i64,
}

impl SeekPolicy {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Backward requests and requests more than `threshold` ahead of
    /// `current` seek; everything else advances.
    pub fn decide(&self, current: i64, requested: i64) -> SeekDecision {
        if requested < current || requested > current.saturating_add(self.threshold) {
            SeekDecision::Seek
        } else {
            SeekDecision::Advance
        }
    }
}
