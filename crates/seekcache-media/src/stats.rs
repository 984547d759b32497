//! Request counters for a reader.

use serde::{Deserialize, Serialize};

/// Counters for one stream of a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Requests served entirely from the cache
    pub hits: u64,
    /// Requests that needed the decoder
    pub misses: u64,
    /// Seeks issued
    pub seeks: u64,
    /// Samples pulled from the decoder
    pub decoded: u64,
    /// Positions whose timestamp disagreed with the counted position
    pub continuity_warnings: u64,
}

impl StreamStats {
    /// Hit rate as a percentage (0.0 - 100.0).
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Counters for both streams of a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderStats {
    pub video: StreamStats,
    pub audio: StreamStats,
}
