use super::{pull, reconcile, Decoded, Placement};
use crate::config::{ContinuityPolicy, ReaderConfig};
use crate::decoder::{Decoder, VideoFormat};
use crate::policy::{SeekDecision, SeekPolicy};
use crate::stats::StreamStats;
use crate::sync::StreamSynchronizer;
use seekcache_cache::{CachedFrame, VideoCache};
use seekcache_core::{
    frame_from_timestamp, ticks_to_seconds, Result, SeekCacheError, StreamKind,
};
use tracing::{debug, error, info, trace, warn};

/// Decode state of the video stream.
pub(crate) struct VideoTrack {
    format: VideoFormat,
    cache: VideoCache,
    policy: SeekPolicy,
    warn_gap: i64,
    continuity: ContinuityPolicy,
    /// Timeline ticks of the last decoded frame, or of the last seek target
    timeline_position: i64,
    available: bool,
    pub(crate) stats: StreamStats,
}

impl VideoTrack {
    pub(crate) fn new(format: VideoFormat, config: &ReaderConfig) -> Self {
        Self {
            format,
            cache: VideoCache::new(config.video_cache_capacity),
            policy: SeekPolicy::new(config.sequential_frame_threshold),
            warn_gap: config.warn_gap_frames,
            continuity: config.continuity,
            timeline_position: 0,
            available: true,
            stats: StreamStats::default(),
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.available
    }

    pub(crate) fn cached_frames(&self) -> usize {
        self.cache.len()
    }

    /// Frame the decoder is positioned at: the newest cached frame, or the
    /// frame of the last known timestamp when the cache is empty.
    pub(crate) fn current_frame(&self) -> i64 {
        self.cache
            .last_position()
            .unwrap_or_else(|| frame_from_timestamp(self.timeline_position, self.format.frame_rate))
    }

    /// Read the first frame, report its raw timestamp and rewind to zero.
    pub(crate) fn read_first_timestamp<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
    ) -> Result<i64> {
        let first_read_failed = |reason: String| SeekCacheError::FirstReadFailed {
            stream: StreamKind::Video,
            reason,
        };

        let decoded = self
            .decode_next(decoder, sync)
            .map_err(|err| first_read_failed(err.to_string()))?
            .ok_or_else(|| first_read_failed("end of stream".to_string()))?;
        info!(
            timestamp = decoded.raw_timestamp,
            seconds = ticks_to_seconds(decoded.raw_timestamp),
            "first video timestamp"
        );

        self.cache.reset();
        decoder
            .seek(StreamKind::Video, 0)
            .map_err(|err| first_read_failed(format!("rewind failed: {err}")))?;
        self.timeline_position = 0;
        self.stats = StreamStats::default();
        Ok(decoded.raw_timestamp)
    }

    /// Copy frame `frame` into `dest`, decoding or seeking as needed.
    /// Returns false when the frame cannot be produced.
    pub(crate) fn read<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
        frame: i64,
        dest: &mut [u8],
    ) -> bool {
        if !self.available {
            return false;
        }
        if frame < 0 {
            debug!(frame, "negative frame requested");
            return false;
        }

        if let Some(cached) = self.cache.find(frame) {
            self.stats.hits += 1;
            return copy_frame(cached, self.format.frame_bytes, dest);
        }
        self.stats.misses += 1;

        let current = self.current_frame();
        if self.policy.decide(current, frame) == SeekDecision::Seek {
            let Some(target) = sync.raw_for_frame(frame, self.format.frame_rate) else {
                debug!(frame, "frame lies beyond the timestamp range");
                return false;
            };
            debug!(
                current,
                frame,
                target,
                seconds = ticks_to_seconds(sync.to_timeline(target)),
                distance = frame - current,
                "video seek"
            );
            if let Err(err) = self.seek(decoder, sync, target) {
                return self.fail(err);
            }
        }

        loop {
            match self.decode_next(decoder, sync) {
                Ok(Some(decoded)) if decoded.position >= frame => {
                    if decoded.position > frame {
                        warn!(
                            current,
                            frame,
                            decoded = decoded.position,
                            distance = decoded.position - frame,
                            "decoded past the requested frame"
                        );
                    }
                    return self
                        .cache
                        .back()
                        .is_some_and(|newest| copy_frame(newest, self.format.frame_bytes, dest));
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(frame, "end of stream before requested frame");
                    return false;
                }
                Err(err) => return self.fail(err),
            }
        }
    }

    /// On failure the cache stays empty and the last known position is kept,
    /// so the next request decides against where the decoder was.
    fn seek<D: Decoder>(&mut self, decoder: &mut D, sync: &StreamSynchronizer, raw: i64) -> Result<()> {
        self.cache.reset();
        self.stats.seeks += 1;
        decoder.seek(StreamKind::Video, raw)?;
        self.timeline_position = sync.to_timeline(raw);
        Ok(())
    }

    /// Decode one frame into the cache. `Ok(None)` is end of stream.
    fn decode_next<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
    ) -> Result<Option<Decoded>> {
        let Some(sample) = pull(decoder, StreamKind::Video)? else {
            return Ok(None);
        };
        self.stats.decoded += 1;

        let raw_timestamp = sample.timestamp;
        let derived = sync.frame_for_raw(raw_timestamp, self.format.frame_rate);
        let counted = self.cache.last_position().map(|last| last + 1);
        let position = match reconcile(
            StreamKind::Video,
            counted,
            derived,
            self.warn_gap,
            self.continuity,
            &mut self.stats,
        ) {
            Placement::Continue(position) => position,
            Placement::Restart(position) => {
                self.cache.reset();
                position
            }
        };

        trace!(position, raw_timestamp, "video frame decoded");
        self.cache.push(position, sample);
        self.timeline_position = sync.to_timeline(raw_timestamp);
        Ok(Some(Decoded {
            position,
            raw_timestamp,
        }))
    }

    fn fail(&mut self, err: SeekCacheError) -> bool {
        if let SeekCacheError::Reconfigure { .. } = err {
            error!(%err, "video stream disabled");
            self.available = false;
        } else {
            warn!(%err, "video decode failed");
        }
        false
    }

    pub(crate) fn close(&mut self) {
        self.cache.reset();
    }
}

/// Copy a cached frame into `dest`. A frame whose size differs from the
/// negotiated format is not delivered.
fn copy_frame(cached: &CachedFrame, frame_bytes: usize, dest: &mut [u8]) -> bool {
    let len = cached.sample.byte_len();
    if len != frame_bytes {
        warn!(
            position = cached.position,
            len,
            expected = frame_bytes,
            "decoded frame size does not match the output format"
        );
        return false;
    }
    cached.sample.copy_to(dest);
    true
}
