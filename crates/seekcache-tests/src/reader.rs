//! Integration tests for the decode cache reader.
//!
//! Drives `DecodeCacheReader` over the synthetic decoder and checks what
//! reaches the caller and what the decoder was asked to do.

use crate::mock::{
    frame_index, init_tracing, sample_value, AudioScript, SyntheticDecoder, VideoScript,
    BLOCK_ALIGN, FRAME_BYTES,
};
use seekcache_core::{FrameRate, SeekCacheError, StreamKind};
use seekcache_media::{
    ContinuityPolicy, DecodeCacheReader, ReaderConfig, ReaderStats, StreamSelection,
};

// ── Helpers ────────────────────────────────────────────────────

fn open(decoder: SyntheticDecoder) -> DecodeCacheReader<SyntheticDecoder> {
    open_with(decoder, ReaderConfig::default())
}

fn open_with(decoder: SyntheticDecoder, config: ReaderConfig) -> DecodeCacheReader<SyntheticDecoder> {
    init_tracing();
    DecodeCacheReader::open(decoder, StreamSelection::Both, config).unwrap()
}

fn frame(reader: &mut DecodeCacheReader<SyntheticDecoder>, n: i64) -> Option<i64> {
    let mut buffer = vec![0u8; FRAME_BYTES];
    reader.read_frame(n, &mut buffer).then(|| frame_index(&buffer))
}

fn audio(reader: &mut DecodeCacheReader<SyntheticDecoder>, start: i64, length: i64) -> Option<Vec<u8>> {
    let mut buffer = vec![0u8; length as usize * BLOCK_ALIGN];
    reader.read_audio(start, length, &mut buffer).then_some(buffer)
}

fn assert_samples(buffer: &[u8], first: u32) {
    for n in 0..buffer.len() / BLOCK_ALIGN {
        assert_eq!(sample_value(buffer, n), first + n as u32, "sample-frame {n}");
    }
}

// ── Opening ────────────────────────────────────────────────────

#[test]
fn open_reports_media_info() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let reader = open(decoder);

    let info = reader.info();
    assert!(info.has_video() && info.has_audio());
    assert_eq!(info.frame_bytes(), FRAME_BYTES);
    assert_eq!(info.block_align(), BLOCK_ALIGN);
    assert_eq!(info.total_frame_count, 300);
    assert_eq!(info.total_sample_count, 480_000);
    assert_eq!(info.first_gap_offset, 0);

    // Probing rewinds both streams and leaves no trace in the counters.
    assert_eq!(
        log.lock().seeks,
        vec![(StreamKind::Video, 0), (StreamKind::Audio, 0)]
    );
    assert_eq!(reader.stats(), ReaderStats::default());
    assert_eq!(reader.cached_frames(), 0);
    assert_eq!(reader.cached_audio_blocks(), 0);
}

#[test]
fn open_without_streams_fails() {
    init_tracing();
    let result = DecodeCacheReader::open(
        SyntheticDecoder::new(None, None),
        StreamSelection::Both,
        ReaderConfig::default(),
    );
    assert!(matches!(result, Err(SeekCacheError::NoPlayableStreams)));
}

#[test]
fn selection_leaves_other_stream_unloaded() {
    init_tracing();
    let mut reader = DecodeCacheReader::open(
        SyntheticDecoder::both(),
        StreamSelection::Audio,
        ReaderConfig::default(),
    )
    .unwrap();

    assert!(!reader.media_info().has_video());
    assert!(!reader.video_available());
    assert_eq!(frame(&mut reader, 0), None);
    assert!(audio(&mut reader, 0, 64).is_some());
}

#[test]
fn empty_stream_fails_first_read() {
    init_tracing();
    let decoder = SyntheticDecoder::video_only(VideoScript {
        frames: 0,
        ..Default::default()
    });
    let result = DecodeCacheReader::open(decoder, StreamSelection::Both, ReaderConfig::default());
    assert!(matches!(
        result,
        Err(SeekCacheError::FirstReadFailed {
            stream: StreamKind::Video,
            ..
        })
    ));
}

#[test]
fn invalid_config_rejected_before_decoding() {
    init_tracing();
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let config = ReaderConfig {
        video_cache_capacity: 0,
        ..Default::default()
    };
    let result = DecodeCacheReader::open(decoder, StreamSelection::Both, config);
    assert!(matches!(result, Err(SeekCacheError::InvalidParameter(_))));
    assert_eq!(log.lock().video_reads, 0);
}

#[test]
fn config_loaded_from_json() {
    let config: ReaderConfig = serde_json::from_str(r#"{ "video_cache_capacity": 2 }"#).unwrap();
    let mut reader = open_with(SyntheticDecoder::both(), config);
    assert_eq!(frame(&mut reader, 5), Some(5));
    assert_eq!(reader.cached_frames(), 2);
    assert_eq!(reader.config().audio_cache_capacity, 20);
}

// ── Video ──────────────────────────────────────────────────────

#[test]
fn sequential_frames_decode_without_seeking() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    for n in 0..20 {
        assert_eq!(frame(&mut reader, n), Some(n));
    }
    assert_eq!(reader.stats().video.seeks, 0);
    assert_eq!(log.lock().seeks.len(), 2);
    assert_eq!(reader.cached_frames(), 4);
}

#[test]
fn repeated_frame_served_from_cache() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    let mut first = vec![0u8; FRAME_BYTES];
    assert!(reader.read_frame(5, &mut first));
    let reads = log.lock().video_reads;

    let mut second = vec![0u8; FRAME_BYTES];
    assert!(reader.read_frame(5, &mut second));
    assert_eq!(first, second);
    assert_eq!(log.lock().video_reads, reads);
    assert_eq!(reader.stats().video.hits, 1);
}

#[test]
fn seek_only_beyond_threshold() {
    let mut reader = open(SyntheticDecoder::both());

    assert_eq!(frame(&mut reader, 100), Some(100));
    assert_eq!(reader.stats().video.seeks, 1);

    // Exactly threshold frames ahead still decodes forward.
    assert_eq!(frame(&mut reader, 130), Some(130));
    assert_eq!(reader.stats().video.seeks, 1);

    assert_eq!(frame(&mut reader, 161), Some(161));
    assert_eq!(reader.stats().video.seeks, 2);

    assert_eq!(frame(&mut reader, 99), Some(99));
    assert_eq!(reader.stats().video.seeks, 3);
}

#[test]
fn seek_targets_keyframe_and_decodes_forward() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    let reads = log.lock().video_reads;
    assert_eq!(frame(&mut reader, 205), Some(205));
    // Keyframe 200, then 200..=205.
    assert_eq!(log.lock().video_reads - reads, 6);
}

#[test]
fn seek_clears_cache() {
    let mut reader = open(SyntheticDecoder::video_only(VideoScript {
        frames: 50,
        ..Default::default()
    }));

    assert_eq!(frame(&mut reader, 3), Some(3));
    assert_eq!(reader.cached_frames(), 4);
    assert_eq!(frame(&mut reader, 60), None);
    assert_eq!(reader.cached_frames(), 0);
}

#[test]
fn end_of_stream_is_not_sticky() {
    let mut reader = open(SyntheticDecoder::video_only(VideoScript {
        frames: 50,
        ..Default::default()
    }));

    assert_eq!(frame(&mut reader, 60), None);
    assert_eq!(frame(&mut reader, 49), Some(49));
    assert_eq!(frame(&mut reader, 50), None);
    assert_eq!(frame(&mut reader, 10), Some(10));
    assert!(reader.video_available());
}

#[test]
fn negative_frame_and_short_buffer_rejected() {
    let mut reader = open(SyntheticDecoder::both());
    assert_eq!(frame(&mut reader, -1), None);

    let mut short = vec![0u8; FRAME_BYTES - 1];
    assert!(!reader.read_frame(0, &mut short));
}

#[test]
fn format_change_reconfigures_and_continues() {
    let decoder = SyntheticDecoder::video_only(VideoScript {
        format_change_at: Some(3),
        ..Default::default()
    });
    let log = decoder.log();
    let mut reader = open(decoder);

    for n in 0..6 {
        assert_eq!(frame(&mut reader, n), Some(n));
    }
    assert_eq!(log.lock().reconfigures, vec![StreamKind::Video]);
    assert!(reader.video_available());
}

#[test]
fn failed_reconfigure_disables_only_that_stream() {
    let decoder = SyntheticDecoder::new(
        Some(VideoScript {
            format_change_at: Some(3),
            fail_reconfigure: true,
            ..Default::default()
        }),
        Some(AudioScript::default()),
    );
    let mut reader = open(decoder);

    assert_eq!(frame(&mut reader, 2), Some(2));
    assert_eq!(frame(&mut reader, 3), None);
    assert!(!reader.video_available());
    assert_eq!(frame(&mut reader, 0), None);

    assert!(reader.audio_available());
    let samples = audio(&mut reader, 0, 100).unwrap();
    assert_samples(&samples, 0);
}

#[test]
fn decoder_fault_fails_one_request() {
    let mut reader = open(SyntheticDecoder::video_only(VideoScript {
        fault_at: Some(2),
        ..Default::default()
    }));

    assert_eq!(frame(&mut reader, 2), None);
    assert!(reader.video_available());
    assert_eq!(frame(&mut reader, 2), Some(2));
    assert_eq!(frame(&mut reader, 1), Some(1));
}

#[test]
fn rejected_seek_fails_one_request() {
    let decoder = SyntheticDecoder::video_only(VideoScript::default());
    let log = decoder.log();
    let mut reader = open(decoder);

    assert_eq!(frame(&mut reader, 5), Some(5));
    log.lock().pending_seek_faults = 1;
    assert_eq!(frame(&mut reader, 100), None);
    assert_eq!(reader.cached_frames(), 0);
    assert!(reader.video_available());

    // The position stays where the decoder was, so the retry seeks again.
    assert_eq!(frame(&mut reader, 100), Some(100));
    assert_eq!(reader.stats().video.seeks, 2);
    assert_eq!(frame(&mut reader, 101), Some(101));
    assert_eq!(reader.stats().video.seeks, 2);
}

#[test]
fn short_frame_not_delivered() {
    let mut reader = open(SyntheticDecoder::video_only(VideoScript {
        short_frame_at: Some(4),
        ..Default::default()
    }));

    let mut buffer = vec![0xAAu8; FRAME_BYTES];
    assert!(!reader.read_frame(4, &mut buffer));
    assert!(buffer.iter().all(|&b| b == 0xAA));

    assert_eq!(frame(&mut reader, 5), Some(5));
    // Cached, still refused.
    assert_eq!(frame(&mut reader, 4), None);
    assert_eq!(frame(&mut reader, 3), Some(3));
}

#[test]
fn far_frame_returns_no_data() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);
    let seeks = log.lock().seeks.len();

    assert_eq!(frame(&mut reader, 1_000_000_000_000_000), None);
    assert_eq!(frame(&mut reader, i64::MAX), None);
    assert_eq!(log.lock().seeks.len(), seeks);
    assert!(reader.video_available());
    assert_eq!(frame(&mut reader, 7), Some(7));
}

#[test]
fn renumber_keeps_counting_across_timestamp_jump() {
    let mut reader = open(SyntheticDecoder::video_only(VideoScript {
        skip: Some((10, 5)),
        ..Default::default()
    }));

    for n in 0..10 {
        assert_eq!(frame(&mut reader, n), Some(n));
    }
    // Position 10 holds the frame stamped 15.
    assert_eq!(frame(&mut reader, 10), Some(15));
    assert_eq!(reader.stats().video.continuity_warnings, 1);
    assert_eq!(frame(&mut reader, 15), Some(20));
}

#[test]
fn resync_follows_timestamps_across_jump() {
    let config = ReaderConfig {
        continuity: ContinuityPolicy::Resync,
        ..Default::default()
    };
    let mut reader = open_with(
        SyntheticDecoder::video_only(VideoScript {
            skip: Some((10, 5)),
            ..Default::default()
        }),
        config,
    );

    for n in 0..10 {
        assert_eq!(frame(&mut reader, n), Some(n));
    }
    // 10 no longer exists; the next frame is returned.
    assert_eq!(frame(&mut reader, 10), Some(15));
    assert_eq!(reader.cached_frames(), 1);
    assert_eq!(frame(&mut reader, 15), Some(15));
    assert_eq!(frame(&mut reader, 16), Some(16));
    assert_eq!(reader.stats().video.continuity_warnings, 1);
}

// ── Audio ──────────────────────────────────────────────────────

#[test]
fn audio_range_spans_blocks() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    let samples = audio(&mut reader, 1000, 100).unwrap();
    assert_samples(&samples, 1000);
    assert_eq!(reader.cached_audio_blocks(), 2);
    let reads = log.lock().audio_reads;

    let again = audio(&mut reader, 1000, 100).unwrap();
    assert_eq!(samples, again);
    assert_eq!(log.lock().audio_reads, reads);
    assert_eq!(reader.stats().audio.hits, 1);
    assert_eq!(reader.stats().audio.seeks, 0);
}

#[test]
fn audio_request_larger_than_cache() {
    let config = ReaderConfig {
        audio_cache_capacity: 2,
        ..Default::default()
    };
    let mut reader = open_with(SyntheticDecoder::both(), config);

    let samples = audio(&mut reader, 0, 5000).unwrap();
    assert_samples(&samples, 0);
    assert_eq!(reader.cached_audio_blocks(), 2);
}

#[test]
fn audio_seeks_beyond_threshold() {
    let mut reader = open(SyntheticDecoder::both());

    let samples = audio(&mut reader, 100_000, 480).unwrap();
    assert_samples(&samples, 100_000);
    assert_eq!(reader.stats().audio.seeks, 1);

    let samples = audio(&mut reader, 100_480, 480).unwrap();
    assert_samples(&samples, 100_480);
    assert_eq!(reader.stats().audio.seeks, 1);

    let samples = audio(&mut reader, 0, 480).unwrap();
    assert_samples(&samples, 0);
    assert_eq!(reader.stats().audio.seeks, 2);
}

#[test]
fn audio_past_end_fails_then_recovers() {
    let mut reader = open(SyntheticDecoder::audio_only(AudioScript {
        samples: 10_000,
        ..Default::default()
    }));

    assert!(audio(&mut reader, 9_900, 200).is_none());
    let tail = audio(&mut reader, 9_900, 100).unwrap();
    assert_samples(&tail, 9_900);
    let head = audio(&mut reader, 0, 100).unwrap();
    assert_samples(&head, 0);
}

#[test]
fn audio_rejects_bad_requests() {
    let mut reader = open(SyntheticDecoder::both());
    assert!(audio(&mut reader, -1, 10).is_none());
    assert!(audio(&mut reader, 0, 0).is_none());

    let mut short = vec![0u8; 10 * BLOCK_ALIGN - 1];
    assert!(!reader.read_audio(0, 10, &mut short));
}

#[test]
fn empty_audio_blocks_skipped() {
    let mut reader = open(SyntheticDecoder::audio_only(AudioScript {
        empty_block_at: Some(2),
        ..Default::default()
    }));

    let samples = audio(&mut reader, 2000, 200).unwrap();
    assert_samples(&samples, 2000);
    assert_eq!(reader.stats().audio.continuity_warnings, 0);
}

#[test]
fn audio_rejected_seek_fails_one_request() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    log.lock().pending_seek_faults = 1;
    assert!(audio(&mut reader, 100_000, 480).is_none());
    assert_eq!(reader.cached_audio_blocks(), 0);
    assert!(reader.audio_available());

    let samples = audio(&mut reader, 100_000, 480).unwrap();
    assert_samples(&samples, 100_000);
    assert_eq!(reader.stats().audio.seeks, 2);
}

#[test]
fn far_audio_returns_no_data() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);
    let seeks = log.lock().seeks.len();

    assert!(audio(&mut reader, i64::MAX / 4, 16).is_none());
    assert_eq!(log.lock().seeks.len(), seeks);
    assert!(reader.audio_available());

    let samples = audio(&mut reader, 500, 16).unwrap();
    assert_samples(&samples, 500);
}

#[test]
fn audio_renumber_stitches_across_timestamp_jump() {
    let mut reader = open(SyntheticDecoder::audio_only(AudioScript {
        skip: Some((2, 500)),
        ..Default::default()
    }));

    // Block 2 is stamped 2548 but counted at 2048.
    let samples = audio(&mut reader, 2000, 100).unwrap();
    assert_samples(&samples[..48 * BLOCK_ALIGN], 2000);
    assert_samples(&samples[48 * BLOCK_ALIGN..], 2548);
    assert_eq!(reader.stats().audio.continuity_warnings, 1);
    assert_eq!(reader.stats().audio.seeks, 0);
}

#[test]
fn audio_resync_flushes_at_timestamp_jump() {
    let config = ReaderConfig {
        continuity: ContinuityPolicy::Resync,
        ..Default::default()
    };
    let mut reader = open_with(
        SyntheticDecoder::audio_only(AudioScript {
            skip: Some((2, 500)),
            ..Default::default()
        }),
        config,
    );

    // 2048..2548 no longer exists.
    assert!(audio(&mut reader, 2000, 100).is_none());
    assert_eq!(reader.cached_audio_blocks(), 1);
    assert_eq!(reader.stats().audio.continuity_warnings, 1);

    let samples = audio(&mut reader, 2548, 100).unwrap();
    assert_samples(&samples, 2548);
    assert_eq!(reader.stats().audio.hits, 1);

    let samples = audio(&mut reader, 2600, 2000).unwrap();
    assert_samples(&samples, 2600);
    assert_eq!(reader.stats().audio.continuity_warnings, 1);
    assert_eq!(reader.stats().audio.seeks, 0);
}

#[test]
fn audio_timestamp_jitter_within_warn_gap() {
    let config = ReaderConfig {
        continuity: ContinuityPolicy::Resync,
        ..Default::default()
    };
    let mut reader = open_with(
        SyntheticDecoder::audio_only(AudioScript {
            timestamp_jitter: 50,
            ..Default::default()
        }),
        config,
    );

    let samples = audio(&mut reader, 0, 4096).unwrap();
    assert_samples(&samples, 0);
    assert_eq!(reader.cached_audio_blocks(), 4);
    assert_eq!(reader.stats().audio.continuity_warnings, 0);
}

// ── Synchronization ────────────────────────────────────────────

#[test]
fn late_video_start_shifts_audio() {
    let decoder = SyntheticDecoder::new(
        Some(VideoScript {
            frame_rate: FrameRate::FPS_25,
            first_timestamp: 400_000,
            ..Default::default()
        }),
        Some(AudioScript::default()),
    );
    let mut reader = open(decoder);

    let info = reader.info();
    assert_eq!(reader.first_gap_offset(), 400_000);
    assert_eq!(info.first_video_timestamp, Some(400_000));
    assert_eq!(info.first_audio_timestamp, Some(0));

    // 400000 ticks at 48 kHz is 1920 sample-frames.
    let samples = audio(&mut reader, 0, 256).unwrap();
    assert_samples(&samples, 1920);
    assert_eq!(frame(&mut reader, 0), Some(0));
    assert_eq!(frame(&mut reader, 1), Some(1));
}

#[test]
fn late_audio_start_shifts_video() {
    let decoder = SyntheticDecoder::new(
        Some(VideoScript::default()),
        Some(AudioScript {
            first_timestamp: 1_000_000,
            ..Default::default()
        }),
    );
    let mut reader = open(decoder);

    assert_eq!(reader.first_gap_offset(), 1_000_000);
    // 0.1 s at 30 fps: timeline frame 0 is stream frame 3.
    assert_eq!(frame(&mut reader, 0), Some(3));
    let samples = audio(&mut reader, 0, 64).unwrap();
    assert_samples(&samples, 0);
}

// ── Disposal ───────────────────────────────────────────────────

#[test]
fn caches_released_before_decoder() {
    let decoder = SyntheticDecoder::both();
    let log = decoder.log();
    let mut reader = open(decoder);

    assert_eq!(frame(&mut reader, 3), Some(3));
    assert!(audio(&mut reader, 0, 2048).is_some());
    drop(reader);

    assert_eq!(log.lock().live_payloads_at_drop, Some(0));
}
