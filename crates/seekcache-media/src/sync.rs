//! Alignment of independently clocked video and audio streams.
//!
//! Elementary streams rarely start at exactly the same timestamp. The larger
//! of the two first timestamps becomes the first-gap offset, and it is
//! subtracted from every raw timestamp before conversion, so that video frame
//! 0 and audio sample 0 describe the same instant.

use seekcache_core::{
    checked_timestamp_from_frame, checked_timestamp_from_sample, frame_from_timestamp,
    sample_from_timestamp, ticks_to_seconds, FrameRate,
};
use tracing::{info, warn};

/// Raw-timestamp ↔ timeline-position conversions for one opened source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSynchronizer {
    first_video: Option<i64>,
    first_audio: Option<i64>,
    first_gap_offset: i64,
}

impl StreamSynchronizer {
    /// Identity mapping, used while the first timestamps are being read.
    pub fn unsynchronized() -> Self {
        Self::default()
    }

    /// Align streams whose first readable samples carried these raw
    /// timestamps. An absent stream counts as starting at zero.
    pub fn from_first_timestamps(first_video: Option<i64>, first_audio: Option<i64>) -> Self {
        if let (Some(video), Some(audio)) = (first_video, first_audio) {
            if video != audio {
                warn!(
                    first_video = video,
                    first_audio = audio,
                    "first timestamps differ between video and audio"
                );
            }
        }

        let first_gap_offset = first_video.unwrap_or(0).max(first_audio.unwrap_or(0));
        info!(
            first_gap_offset,
            seconds = ticks_to_seconds(first_gap_offset),
            "streams synchronized"
        );

        Self {
            first_video,
            first_audio,
            first_gap_offset,
        }
    }

    /// Ticks subtracted from every raw decoder timestamp.
    #[inline]
    pub fn first_gap_offset(&self) -> i64 {
        self.first_gap_offset
    }

    pub fn first_video_timestamp(&self) -> Option<i64> {
        self.first_video
    }

    pub fn first_audio_timestamp(&self) -> Option<i64> {
        self.first_audio
    }

    /// Raw decoder timestamp → timeline ticks.
    #[inline]
    pub fn to_timeline(&self, raw: i64) -> i64 {
        raw - self.first_gap_offset
    }

    /// Timeline ticks → raw decoder timestamp.
    #[inline]
    pub fn to_raw(&self, timeline: i64) -> i64 {
        timeline + self.first_gap_offset
    }

    /// Frame index of a raw decoder timestamp.
    pub fn frame_for_raw(&self, raw: i64, rate: FrameRate) -> i64 {
        frame_from_timestamp(self.to_timeline(raw), rate)
    }

    /// Raw decoder timestamp where `frame` starts, or `None` when it lies
    /// outside the tick range.
    pub fn raw_for_frame(&self, frame: i64, rate: FrameRate) -> Option<i64> {
        checked_timestamp_from_frame(frame, rate)?.checked_add(self.first_gap_offset)
    }

    /// Sample-frame index of a raw decoder timestamp.
    pub fn sample_for_raw(&self, raw: i64, sample_rate: u32) -> i64 {
        sample_from_timestamp(self.to_timeline(raw), sample_rate)
    }

    /// Raw decoder timestamp where `sample` starts, or `None` when it lies
    /// outside the tick range.
    pub fn raw_for_sample(&self, sample: i64, sample_rate: u32) -> Option<i64> {
        checked_timestamp_from_sample(sample, sample_rate)?.checked_add(self.first_gap_offset)
    }
}
