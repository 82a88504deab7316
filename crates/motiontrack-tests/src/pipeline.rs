//! End-to-end tracking on synthetic video.
//!
//! Exercises motiontrack-media's frame source, the tracking pipeline and
//! the aggregation pass together.

use crate::synthetic::{self, HEIGHT, WIDTH};
use motiontrack_analysis::MovementAggregator;
use motiontrack_core::{MotionError, TrackingConfig};
use motiontrack_media::FrameSource;
use motiontrack_tracking::{CancelToken, TrackingOutcome, TrackingPipeline};

fn track(frames: Vec<image::RgbImage>, config: TrackingConfig) -> TrackingOutcome {
    let source = synthetic::source(frames, config.scale_factor);
    TrackingPipeline::new(config)
        .unwrap()
        .run(source, &CancelToken::new(), None, |_| {})
        .unwrap()
}

// ── Moving object ──────────────────────────────────────────────

#[test]
fn moving_square_produces_rightward_trajectory() {
    let outcome = track(synthetic::moving_square(24, 8), TrackingConfig::default());
    assert_eq!(outcome.frames_processed, 24);
    assert!(!outcome.log.is_empty());

    let (w, h) = ((WIDTH / 2) as i32, (HEIGHT / 2) as i32);
    for obs in &outcome.log {
        assert!(obs.frame_index >= 2);
        assert!((0..w).contains(&obs.x) && (0..h).contains(&obs.y));
    }

    let analysis = MovementAggregator::new().aggregate(&outcome.log);
    let first = analysis.records.first().unwrap();
    let last = analysis.records.last().unwrap();
    assert!(last.mean_x > first.mean_x + 40.0, "{} -> {}", first.mean_x, last.mean_x);
    assert!((last.mean_y - first.mean_y).abs() < 15.0);

    let stats = analysis.statistics.unwrap();
    assert!(stats.total_distance > 0.0);
    assert_eq!(stats.frame_count, analysis.records.len());
}

#[test]
fn log_respects_frame_ordering() {
    let outcome = track(synthetic::moving_square(12, 8), TrackingConfig::default());
    for pair in outcome.log.entries().windows(2) {
        assert!(pair[0].frame_index <= pair[1].frame_index);
    }
}

#[test]
fn high_threshold_filters_everything() {
    let config = TrackingConfig {
        min_movement_threshold: 50.0,
        ..Default::default()
    };
    let outcome = track(synthetic::moving_square(12, 8), config);
    assert!(outcome.log.is_empty());
}

// ── No movement ────────────────────────────────────────────────

#[test]
fn static_scene_is_empty_result() {
    let outcome = track(synthetic::static_scene(15), TrackingConfig::default());
    assert_eq!(outcome.frames_processed, 15);
    let analysis = MovementAggregator::new().aggregate(&outcome.log);
    assert!(analysis.is_empty());
    assert!(analysis.statistics.is_none());
}

#[test]
fn single_frame_video_has_no_observations() {
    let outcome = track(synthetic::moving_square(1, 8), TrackingConfig::default());
    assert_eq!(outcome.frames_processed, 1);
    assert!(outcome.log.is_empty());
}

// ── Sources ────────────────────────────────────────────────────

#[test]
fn frames_are_scaled_consistently() {
    let source = synthetic::source(synthetic::static_scene(3), 0.3);
    assert_eq!(source.output_dimensions(), (96, 48));
    for frame in source {
        let frame = frame.unwrap();
        assert_eq!(frame.color.dimensions(), (96, 48));
        assert_eq!(frame.gray.dimensions(), (96, 48));
    }
}

#[test]
fn missing_file_is_open_error() {
    let err = FrameSource::open("/definitely/not/here.mp4", 0.5).err().unwrap();
    assert!(matches!(err, MotionError::Open { .. }));
    assert!(err.is_fatal());
}

#[test]
fn cancelled_run_keeps_partial_log() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let frames = synthetic::source(synthetic::moving_square(20, 8), 0.5)
        .enumerate()
        .map(move |(i, f)| {
            if i == 10 {
                trigger.cancel();
            }
            f
        });
    let outcome = TrackingPipeline::new(TrackingConfig::default())
        .unwrap()
        .run(frames, &cancel, Some(20), |_| {})
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.frames_processed, 10);
    assert!(outcome.log.iter().all(|o| o.frame_index <= 10));
}
