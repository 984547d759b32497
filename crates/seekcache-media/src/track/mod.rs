//! Per-stream decode state: cache, seek policy and the read-ahead loop.

mod audio;
mod video;

pub(crate) use audio::AudioTrack;
pub(crate) use video::VideoTrack;

use crate::config::ContinuityPolicy;
use crate::decoder::{Decoder, ReadOutcome};
use crate::stats::StreamStats;
use seekcache_core::{DecodedSample, Result, SeekCacheError, StreamKind};
use tracing::{debug, trace, warn};

/// Format changes accepted back to back before the decoder is considered stuck.
const MAX_CONSECUTIVE_FORMAT_CHANGES: u32 = 8;

/// A sample that made it into a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decoded {
    /// Position assigned on the timeline
    pub position: i64,
    /// Timestamp the decoder reported
    pub raw_timestamp: i64,
}

/// Where a freshly decoded sample goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Append at this position
    Continue(i64),
    /// Flush the cache, then start counting again at this position
    Restart(i64),
}

/// Pull the next sample of `stream`, re-negotiating the output format as
/// often as the decoder asks. `Ok(None)` is end of stream.
pub(crate) fn pull<D: Decoder>(decoder: &mut D, stream: StreamKind) -> Result<Option<DecodedSample>> {
    let mut format_changes = 0;
    loop {
        match decoder.read_next(stream)? {
            ReadOutcome::Sample(sample) => return Ok(Some(sample)),
            ReadOutcome::EndOfStream => {
                trace!(%stream, "end of stream");
                return Ok(None);
            }
            ReadOutcome::FormatChanged => {
                format_changes += 1;
                if format_changes > MAX_CONSECUTIVE_FORMAT_CHANGES {
                    return Err(SeekCacheError::Decoder(format!(
                        "{stream} output format changed {format_changes} times without a sample"
                    )));
                }
                debug!(%stream, "output format changed, reconfiguring");
                decoder
                    .reconfigure(stream)
                    .map_err(|err| SeekCacheError::Reconfigure {
                        stream,
                        reason: err.to_string(),
                    })?;
            }
        }
    }
}

/// Decide the position of a new sample.
///
/// `counted` is the continuation of the previous cached sample, `derived` the
/// position computed from the decoder's timestamp. Counting wins while the two
/// agree within `warn_gap`; beyond it `policy` decides.
pub(crate) fn reconcile(
    stream: StreamKind,
    counted: Option<i64>,
    derived: i64,
    warn_gap: i64,
    policy: ContinuityPolicy,
    stats: &mut StreamStats,
) -> Placement {
    let Some(counted) = counted else {
        return Placement::Continue(derived);
    };
    let drift = derived - counted;
    if drift.abs() <= warn_gap {
        return Placement::Continue(counted);
    }

    stats.continuity_warnings += 1;
    match policy {
        ContinuityPolicy::Renumber => {
            warn!(%stream, counted, derived, drift, "timestamp disagrees with counted position, keeping count");
            Placement::Continue(counted)
        }
        ContinuityPolicy::Resync => {
            warn!(%stream, counted, derived, drift, "timestamp disagrees with counted position, resynchronizing");
            Placement::Restart(derived)
        }
    }
}
