//! Reader configuration, fixed for the lifetime of a reader.

use seekcache_core::{defaults, Result, SeekCacheError};
use serde::{Deserialize, Serialize};

/// What to do when a decoded sample's timestamp disagrees with the position
/// counted from the previous sample by more than the warning threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityPolicy {
    /// Keep the counted position and log the disagreement. Smooths decoder
    /// timestamp jitter, but also renumbers across genuine gaps.
    #[default]
    Renumber,
    /// Flush the stream's cache and restart counting from the decoder's
    /// timestamp, so genuine gaps stay visible.
    Resync,
}

/// Cache sizes and seek-policy thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Largest forward frame jump served by sequential decoding
    pub sequential_frame_threshold: i64,
    /// Largest forward sample jump served by sequential decoding
    pub sequential_sample_threshold: i64,
    /// Frames kept in the video cache
    pub video_cache_capacity: usize,
    /// Blocks kept in the audio cache
    pub audio_cache_capacity: usize,
    /// Counted/derived frame disagreement above which a warning is logged
    pub warn_gap_frames: i64,
    /// Counted/derived sample disagreement above which a warning is logged
    pub warn_gap_samples: i64,
    pub continuity: ContinuityPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            sequential_frame_threshold: defaults::SEQUENTIAL_FRAME_THRESHOLD,
            sequential_sample_threshold: defaults::SEQUENTIAL_SAMPLE_THRESHOLD,
            video_cache_capacity: defaults::VIDEO_CACHE_CAPACITY,
            audio_cache_capacity: defaults::AUDIO_CACHE_CAPACITY,
            warn_gap_frames: defaults::WARN_GAP_FRAMES,
            warn_gap_samples: defaults::WARN_GAP_SAMPLES,
            continuity: ContinuityPolicy::default(),
        }
    }
}

impl ReaderConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.video_cache_capacity == 0 || self.audio_cache_capacity == 0 {
            return Err(SeekCacheError::InvalidParameter(
                "cache capacities must be at least 1".to_string(),
            ));
        }
        if self.sequential_frame_threshold < 0 || self.sequential_sample_threshold < 0 {
            return Err(SeekCacheError::InvalidParameter(
                "sequential thresholds must not be negative".to_string(),
            ));
        }
        if self.warn_gap_frames < 0 || self.warn_gap_samples < 0 {
            return Err(SeekCacheError::InvalidParameter(
                "warning gaps must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
