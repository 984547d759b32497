use super::{pull, reconcile, Decoded, Placement};
use crate::config::{ContinuityPolicy, ReaderConfig};
use crate::decoder::{AudioFormat, Decoder};
use crate::policy::{SeekDecision, SeekPolicy};
use crate::stats::StreamStats;
use crate::sync::StreamSynchronizer;
use seekcache_cache::AudioCache;
use seekcache_core::{
    sample_from_timestamp, ticks_to_seconds, Result, SeekCacheError, StreamKind,
};
use tracing::{debug, error, info, trace, warn};

/// Decode state of the audio stream.
pub(crate) struct AudioTrack {
    format: AudioFormat,
    cache: AudioCache,
    policy: SeekPolicy,
    warn_gap: i64,
    continuity: ContinuityPolicy,
    /// Timeline ticks of the last decoded block, or of the last seek target
    timeline_position: i64,
    available: bool,
    pub(crate) stats: StreamStats,
}

impl AudioTrack {
    pub(crate) fn new(format: AudioFormat, config: &ReaderConfig) -> Self {
        Self {
            format,
            cache: AudioCache::new(config.audio_cache_capacity, format.block_align as usize),
            policy: SeekPolicy::new(config.sequential_sample_threshold),
            warn_gap: config.warn_gap_samples,
            continuity: config.continuity,
            timeline_position: 0,
            available: true,
            stats: StreamStats::default(),
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.available
    }

    pub(crate) fn cached_blocks(&self) -> usize {
        self.cache.len()
    }

    fn block_align(&self) -> usize {
        self.format.block_align as usize
    }

    /// Sample the decoder is positioned at: the start of the newest cached
    /// block, or the sample of the last known timestamp when the cache is
    /// empty.
    pub(crate) fn current_sample(&self) -> i64 {
        self.cache
            .back()
            .map(|block| block.position)
            .unwrap_or_else(|| sample_from_timestamp(self.timeline_position, self.format.sample_rate))
    }

    /// Read the first block, report its raw timestamp and rewind to zero.
    pub(crate) fn read_first_timestamp<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
    ) -> Result<i64> {
        let first_read_failed = |reason: String| SeekCacheError::FirstReadFailed {
            stream: StreamKind::Audio,
            reason,
        };

        let decoded = self
            .decode_next(decoder, sync)
            .map_err(|err| first_read_failed(err.to_string()))?
            .ok_or_else(|| first_read_failed("end of stream".to_string()))?;
        info!(
            timestamp = decoded.raw_timestamp,
            seconds = ticks_to_seconds(decoded.raw_timestamp),
            "first audio timestamp"
        );

        self.cache.reset(self.block_align());
        decoder
            .seek(StreamKind::Audio, 0)
            .map_err(|err| first_read_failed(format!("rewind failed: {err}")))?;
        self.timeline_position = 0;
        self.stats = StreamStats::default();
        Ok(decoded.raw_timestamp)
    }

    /// Copy `length` sample-frames starting at `start` into `dest`, decoding
    /// or seeking as needed. `dest` must hold `length * block_align` bytes.
    ///
    /// Blocks are stitched into `dest` as they arrive, so a request may span
    /// more blocks than the cache holds.
    pub(crate) fn read<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
        start: i64,
        length: i64,
        dest: &mut [u8],
    ) -> bool {
        if !self.available {
            return false;
        }
        if start < 0 || length <= 0 {
            debug!(start, length, "empty or negative audio range requested");
            return false;
        }
        let align = self.block_align();
        let required = (length as usize).saturating_mul(align);
        if dest.len() < required {
            warn!(
                length,
                required,
                available = dest.len(),
                "audio destination too small"
            );
            return false;
        }
        let dest = &mut dest[..required];

        let mut copied = self.cache.copy_available(start, length, dest);
        if copied == length {
            self.stats.hits += 1;
            return true;
        }
        self.stats.misses += 1;

        let current = self.current_sample();
        let cursor = start + copied;
        if self.policy.decide(current, cursor) == SeekDecision::Seek {
            let Some(target) = sync.raw_for_sample(cursor, self.format.sample_rate) else {
                debug!(start = cursor, "sample lies beyond the timestamp range");
                return false;
            };
            debug!(
                current,
                start = cursor,
                target,
                seconds = ticks_to_seconds(sync.to_timeline(target)),
                distance = cursor - current,
                "audio seek"
            );
            if let Err(err) = self.seek(decoder, sync, target) {
                return self.fail(err);
            }
        }

        loop {
            match self.decode_next(decoder, sync) {
                Ok(Some(decoded)) => {
                    let offset = copied as usize * align;
                    copied += self.cache.copy_available(
                        start + copied,
                        length - copied,
                        &mut dest[offset..],
                    );
                    if copied == length {
                        return true;
                    }
                    if decoded.position > start + copied {
                        debug!(
                            missing = start + copied,
                            decoded = decoded.position,
                            "decoder resumed after the requested sample"
                        );
                        return false;
                    }
                }
                Ok(None) => {
                    debug!(start, length, copied, "end of stream before requested range");
                    return false;
                }
                Err(err) => return self.fail(err),
            }
        }
    }

    fn seek<D: Decoder>(&mut self, decoder: &mut D, sync: &StreamSynchronizer, raw: i64) -> Result<()> {
        self.cache.reset(self.block_align());
        self.stats.seeks += 1;
        decoder.seek(StreamKind::Audio, raw)?;
        self.timeline_position = sync.to_timeline(raw);
        Ok(())
    }

    /// Decode one non-empty block into the cache. `Ok(None)` is end of stream.
    fn decode_next<D: Decoder>(
        &mut self,
        decoder: &mut D,
        sync: &StreamSynchronizer,
    ) -> Result<Option<Decoded>> {
        let sample = loop {
            let Some(sample) = pull(decoder, StreamKind::Audio)? else {
                return Ok(None);
            };
            self.stats.decoded += 1;
            if sample.byte_len() > 0 {
                break sample;
            }
            trace!(timestamp = sample.timestamp, "skipping empty audio block");
        };

        let raw_timestamp = sample.timestamp;
        let derived = sync.sample_for_raw(raw_timestamp, self.format.sample_rate);
        let counted = self.cache.back().map(|last| last.end());
        let position = match reconcile(
            StreamKind::Audio,
            counted,
            derived,
            self.warn_gap,
            self.continuity,
            &mut self.stats,
        ) {
            Placement::Continue(position) => position,
            Placement::Restart(position) => {
                self.cache.reset(self.block_align());
                position
            }
        };

        let length = self.cache.push(position, sample)?;
        trace!(position, length, raw_timestamp, "audio block decoded");
        self.timeline_position = sync.to_timeline(raw_timestamp);
        Ok(Some(Decoded {
            position,
            raw_timestamp,
        }))
    }

    fn fail(&mut self, err: SeekCacheError) -> bool {
        if let SeekCacheError::Reconfigure { .. } = err {
            error!(%err, "audio stream disabled");
            self.available = false;
        } else {
            warn!(%err, "audio decode failed");
        }
        false
    }

    pub(crate) fn close(&mut self) {
        self.cache.reset(self.block_align());
    }
}
