//! Timeline information about an opened source.

use crate::decoder::{AudioFormat, StreamLayout, VideoFormat};
use crate::sync::StreamSynchronizer;
use seekcache_core::{frame_from_timestamp, sample_from_timestamp, ticks_to_seconds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formats, duration and start alignment of an opened source.
///
/// Computed once when a reader opens and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Video stream, if present and selected
    pub video: Option<VideoFormat>,
    /// Audio stream, if present and selected
    pub audio: Option<AudioFormat>,
    /// Duration in ticks
    pub duration_ticks: i64,
    /// Raw timestamp of the first decodable video frame
    pub first_video_timestamp: Option<i64>,
    /// Raw timestamp of the first decodable audio block
    pub first_audio_timestamp: Option<i64>,
    /// Ticks subtracted from every decoder timestamp
    pub first_gap_offset: i64,
    /// Frames in `duration_ticks` (0 without video)
    pub total_frame_count: i64,
    /// Sample-frames in `duration_ticks` (0 without audio)
    pub total_sample_count: i64,
}

impl MediaInfo {
    pub(crate) fn new(layout: StreamLayout, sync: &StreamSynchronizer) -> Self {
        let total_frame_count = layout
            .video
            .map(|video| frame_from_timestamp(layout.duration_ticks, video.frame_rate))
            .unwrap_or(0);
        let total_sample_count = layout
            .audio
            .map(|audio| sample_from_timestamp(layout.duration_ticks, audio.sample_rate))
            .unwrap_or(0);

        Self {
            video: layout.video,
            audio: layout.audio,
            duration_ticks: layout.duration_ticks,
            first_video_timestamp: sync.first_video_timestamp(),
            first_audio_timestamp: sync.first_audio_timestamp(),
            first_gap_offset: sync.first_gap_offset(),
            total_frame_count,
            total_sample_count,
        }
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Bytes needed to receive one decoded frame (0 without video).
    pub fn frame_bytes(&self) -> usize {
        self.video.map(|video| video.frame_bytes).unwrap_or(0)
    }

    /// Bytes per audio sample-frame (0 without audio).
    pub fn block_align(&self) -> usize {
        self.audio.map(|audio| audio.block_align as usize).unwrap_or(0)
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        ticks_to_seconds(self.duration_ticks)
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "duration: {:.3}s", self.duration_seconds())?;
        match &self.video {
            Some(video) => writeln!(
                f,
                "video: stream {} {}x{} @ {} ({} frames, {} bytes/frame)",
                video.stream_index,
                video.width,
                video.height,
                video.frame_rate,
                self.total_frame_count,
                video.frame_bytes
            )?,
            None => writeln!(f, "video: none")?,
        }
        match &self.audio {
            Some(audio) => writeln!(
                f,
                "audio: stream {} {} Hz, {} ch, block align {} ({} samples)",
                audio.stream_index,
                audio.sample_rate,
                audio.channels,
                audio.block_align,
                self.total_sample_count
            )?,
            None => writeln!(f, "audio: none")?,
        }
        write!(f, "first gap offset: {} ticks", self.first_gap_offset)
    }
}
