//! Sample-indexed cache of decoded audio blocks.
//!
//! Each block covers the half-open sample range `[position, position + length)`.
//! A read request may span several consecutive blocks; [`AudioCache::copy_range`]
//! stitches the overlapping parts into one destination buffer without touching
//! the cached blocks, since an overlapping request may need them again.

use crate::ring::BoundedCache;
use seekcache_core::{DecodedSample, Result, SeekCacheError};
use tracing::trace;

/// A decoded block of interleaved sample-frames.
#[derive(Debug)]
pub struct CachedAudio {
    /// First sample-frame on the synchronized timeline
    pub position: i64,
    /// Number of sample-frames in the block
    pub length: i64,
    /// Decoded PCM bytes
    pub sample: DecodedSample,
}

impl CachedAudio {
    /// One past the last sample-frame of the block.
    #[inline]
    pub fn end(&self) -> i64 {
        self.position + self.length
    }

    #[inline]
    pub fn contains(&self, sample: i64) -> bool {
        sample >= self.position && sample < self.end()
    }
}

/// Recently decoded audio blocks, oldest first.
#[derive(Debug)]
pub struct AudioCache {
    entries: BoundedCache<CachedAudio>,
    block_align: usize,
}

impl AudioCache {
    /// Create an empty cache for at most `capacity` blocks of
    /// `block_align`-byte sample-frames.
    pub fn new(capacity: usize, block_align: usize) -> Self {
        Self {
            entries: BoundedCache::new(capacity),
            block_align,
        }
    }

    /// Bytes per sample-frame.
    #[inline]
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// Number of whole sample-frames in `bytes` bytes of PCM.
    pub fn frames_in(&self, bytes: usize) -> Result<i64> {
        if self.block_align == 0 || bytes % self.block_align != 0 {
            return Err(SeekCacheError::MisalignedPayload {
                bytes,
                block_align: self.block_align,
            });
        }
        Ok((bytes / self.block_align) as i64)
    }

    /// Cache a block starting at `position`. Returns the block length in
    /// sample-frames, or an error if the payload is not whole sample-frames.
    pub fn push(&mut self, position: i64, sample: DecodedSample) -> Result<i64> {
        let length = self.frames_in(sample.byte_len())?;
        if self.entries.push_back(CachedAudio {
            position,
            length,
            sample,
        }) {
            trace!(position, length, "audio cache full, evicted oldest block");
        }
        Ok(length)
    }

    /// Newest cached block.
    pub fn back(&self) -> Option<&CachedAudio> {
        self.entries.back()
    }

    /// Oldest cached block.
    pub fn front(&self) -> Option<&CachedAudio> {
        self.entries.front()
    }

    /// Copy `length` sample-frames starting at `start` into `dest`.
    ///
    /// Returns true only if the whole range was available. `dest` must hold
    /// at least `length * block_align` bytes.
    pub fn copy_range(&self, start: i64, length: i64, dest: &mut [u8]) -> bool {
        length > 0 && self.copy_available(start, length, dest) == length
    }

    /// Copy the longest contiguous prefix of `[start, start + length)` held by
    /// the cache into `dest`, scanning blocks oldest first. Returns the number
    /// of sample-frames copied; a hole between blocks ends the copy.
    pub fn copy_available(&self, start: i64, length: i64, dest: &mut [u8]) -> i64 {
        let align = self.block_align as i64;
        let mut cursor = start;
        let mut remaining = length.min(dest.len() as i64 / align.max(1));
        let mut offset = 0usize;

        for block in self.entries.iter() {
            if remaining <= 0 {
                break;
            }
            if block.end() <= cursor {
                continue;
            }
            if block.position > cursor {
                break;
            }

            let skip = cursor - block.position;
            let take = remaining.min(block.length - skip);
            let src_start = (skip * align) as usize;
            let byte_count = (take * align) as usize;
            dest[offset..offset + byte_count]
                .copy_from_slice(&block.sample.bytes()[src_start..src_start + byte_count]);

            cursor += take;
            remaining -= take;
            offset += byte_count;
        }

        cursor - start
    }

    /// Drop every block and record a new block alignment.
    pub fn reset(&mut self, block_align: usize) {
        self.entries.reset();
        self.block_align = block_align;
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
