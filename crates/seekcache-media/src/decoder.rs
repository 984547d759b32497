//! The sequential decoder the reader drives.
//!
//! A decoder can only move forward one sample at a time or jump to a
//! timestamp. Everything it produces is already decoded; the reader turns it
//! into random access.

use seekcache_core::{DecodedSample, FrameRate, Result, SeekCacheError, StreamKind};
use serde::{Deserialize, Serialize};

/// Which elementary streams to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSelection {
    Video,
    Audio,
    #[default]
    Both,
}

impl StreamSelection {
    /// Whether this selection loads `stream`.
    pub fn includes(self, stream: StreamKind) -> bool {
        matches!(
            (self, stream),
            (Self::Both, _) | (Self::Video, StreamKind::Video) | (Self::Audio, StreamKind::Audio)
        )
    }
}

/// Decoded video output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFormat {
    /// Container stream index
    pub stream_index: usize,
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
    /// Size of one decoded frame in bytes
    pub frame_bytes: usize,
}

/// Decoded audio output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Container stream index
    pub stream_index: usize,
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per interleaved sample-frame
    pub block_align: u16,
}

/// What a decoder found when opening its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamLayout {
    pub video: Option<VideoFormat>,
    pub audio: Option<AudioFormat>,
    /// Total duration in ticks
    pub duration_ticks: i64,
}

impl StreamLayout {
    /// Drop the streams `selection` does not load.
    pub fn restricted_to(self, selection: StreamSelection) -> Self {
        Self {
            video: self.video.filter(|_| selection.includes(StreamKind::Video)),
            audio: self.audio.filter(|_| selection.includes(StreamKind::Audio)),
            duration_ticks: self.duration_ticks,
        }
    }

    /// Reject layouts with no stream or with formats no timestamp can be
    /// converted through.
    pub fn validate(&self) -> Result<()> {
        if self.video.is_none() && self.audio.is_none() {
            return Err(SeekCacheError::NoPlayableStreams);
        }
        if let Some(video) = &self.video {
            if !video.frame_rate.is_valid() {
                return Err(SeekCacheError::InvalidParameter(format!(
                    "frame rate {}/{} is not usable",
                    video.frame_rate.numerator, video.frame_rate.denominator
                )));
            }
        }
        if let Some(audio) = &self.audio {
            if audio.sample_rate == 0 || audio.block_align == 0 {
                return Err(SeekCacheError::InvalidParameter(format!(
                    "audio sample rate {} / block align {} is not usable",
                    audio.sample_rate, audio.block_align
                )));
            }
        }
        Ok(())
    }
}

/// Result of asking a decoder for its next sample.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A decoded sample with its raw timestamp
    Sample(DecodedSample),
    /// No more samples until the next seek
    EndOfStream,
    /// The output format changed; call [`Decoder::reconfigure`] before
    /// reading on
    FormatChanged,
}

/// A sequential decoder over one media source.
///
/// Implementations are not expected to be thread-safe. The reader calls them
/// from a single thread only.
pub trait Decoder {
    /// Open the source and negotiate output formats for the selected streams.
    fn open(&mut self, selection: StreamSelection) -> Result<StreamLayout>;

    /// Decode the next sample of `stream`. `Err` is a decoder fault.
    fn read_next(&mut self, stream: StreamKind) -> Result<ReadOutcome>;

    /// Reposition `stream` to a raw timestamp in ticks.
    fn seek(&mut self, stream: StreamKind, ticks: i64) -> Result<()>;

    /// Re-negotiate the output format after [`ReadOutcome::FormatChanged`].
    fn reconfigure(&mut self, stream: StreamKind) -> Result<()>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn open(&mut self, selection: StreamSelection) -> Result<StreamLayout> {
        (**self).open(selection)
    }

    fn read_next(&mut self, stream: StreamKind) -> Result<ReadOutcome> {
        (**self).read_next(stream)
    }

    fn seek(&mut self, stream: StreamKind, ticks: i64) -> Result<()> {
        (**self).seek(stream, ticks)
    }

    fn reconfigure(&mut self, stream: StreamKind) -> Result<()> {
        (**self).reconfigure(stream)
    }
}
