//! Random-access reads over a sequential decoder.

use crate::config::ReaderConfig;
use crate::decoder::{Decoder, StreamSelection};
use crate::info::MediaInfo;
use crate::stats::ReaderStats;
use crate::sync::StreamSynchronizer;
use crate::track::{AudioTrack, VideoTrack};
use seekcache_core::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves frame and sample-range requests from per-stream caches, driving
/// `D` forward or seeking it when a request falls outside the cache.
///
/// Not thread-safe. Use [`ReaderHandle`](crate::ReaderHandle) to share one
/// reader between threads.
pub struct DecodeCacheReader<D: Decoder> {
    // Field order is drop order: caches go before the decoder.
    video: Option<VideoTrack>,
    audio: Option<AudioTrack>,
    sync: StreamSynchronizer,
    info: Arc<MediaInfo>,
    config: ReaderConfig,
    decoder: D,
}

impl<D: Decoder> DecodeCacheReader<D> {
    /// Open `decoder`, read the first sample of every selected stream and
    /// align the streams on a common timeline.
    pub fn open(mut decoder: D, selection: StreamSelection, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        let layout = decoder.open(selection)?.restricted_to(selection);
        layout.validate()?;

        let mut video = layout.video.map(|format| VideoTrack::new(format, &config));
        let mut audio = layout.audio.map(|format| AudioTrack::new(format, &config));

        let unsynced = StreamSynchronizer::unsynchronized();
        let first_video = video
            .as_mut()
            .map(|track| track.read_first_timestamp(&mut decoder, &unsynced))
            .transpose()?;
        let first_audio = audio
            .as_mut()
            .map(|track| track.read_first_timestamp(&mut decoder, &unsynced))
            .transpose()?;

        let sync = StreamSynchronizer::from_first_timestamps(first_video, first_audio);
        let info = Arc::new(MediaInfo::new(layout, &sync));
        info!(?selection, "media opened\n{}", info);

        Ok(Self {
            video,
            audio,
            sync,
            info,
            config,
            decoder,
        })
    }

    /// Shared, immutable description of the opened source.
    pub fn info(&self) -> Arc<MediaInfo> {
        Arc::clone(&self.info)
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn first_gap_offset(&self) -> i64 {
        self.sync.first_gap_offset()
    }

    /// Copy frame `frame` into `dest`.
    ///
    /// `dest` must hold [`MediaInfo::frame_bytes`] bytes. Returns false for a
    /// negative frame, a frame past the end of the stream, a decoder fault, or
    /// when the source has no usable video.
    pub fn read_frame(&mut self, frame: i64, dest: &mut [u8]) -> bool {
        let Some(track) = self.video.as_mut() else {
            debug!(frame, "no video stream");
            return false;
        };
        let frame_bytes = self.info.frame_bytes();
        if dest.len() < frame_bytes {
            warn!(
                frame,
                required = frame_bytes,
                available = dest.len(),
                "frame destination too small"
            );
            return false;
        }
        track.read(&mut self.decoder, &self.sync, frame, dest)
    }

    /// Copy `length` sample-frames starting at sample `start` into `dest`.
    ///
    /// `dest` must hold `length * block_align` bytes.
    pub fn read_audio(&mut self, start: i64, length: i64, dest: &mut [u8]) -> bool {
        let Some(track) = self.audio.as_mut() else {
            debug!(start, length, "no audio stream");
            return false;
        };
        track.read(&mut self.decoder, &self.sync, start, length, dest)
    }

    /// Whether video frames can still be read. False when the source has no
    /// video or its output format could not be re-negotiated.
    pub fn video_available(&self) -> bool {
        self.video.as_ref().is_some_and(VideoTrack::is_available)
    }

    pub fn audio_available(&self) -> bool {
        self.audio.as_ref().is_some_and(AudioTrack::is_available)
    }

    pub fn cached_frames(&self) -> usize {
        self.video.as_ref().map_or(0, VideoTrack::cached_frames)
    }

    pub fn cached_audio_blocks(&self) -> usize {
        self.audio.as_ref().map_or(0, AudioTrack::cached_blocks)
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            video: self.video.as_ref().map(|track| track.stats).unwrap_or_default(),
            audio: self.audio.as_ref().map(|track| track.stats).unwrap_or_default(),
        }
    }
}

impl<D: Decoder> Drop for DecodeCacheReader<D> {
    fn drop(&mut self) {
        if let Some(track) = self.video.as_mut() {
            track.close();
        }
        if let Some(track) = self.audio.as_mut() {
            track.close();
        }
        debug!("decode cache reader closed");
    }
}
