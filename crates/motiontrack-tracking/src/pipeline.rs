//! Sequential frame-by-frame tracking driver.

use crate::background::MotionDetector;
use crate::features::FeatureSelector;
use crate::movement::MovementFilter;
use crate::optical_flow::OpticalFlowTracker;
use motiontrack_core::{Frame, GrayImage, MotionError, PositionLog, Result, TrackingConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress is reported every this many frames.
pub const PROGRESS_INTERVAL: u64 = 30;

/// Handle for cancelling a running pipeline from another thread.
///
/// Checked between frames only.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic progress information.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    /// Index of the frame just processed.
    pub frame_index: u64,
    /// Expected frame count, when the container reports one.
    pub total_frames: Option<u64>,
    /// Processing speed so far.
    pub frames_per_second: f64,
}

impl PipelineProgress {
    /// Completion in `[0, 1]`, if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_frames {
            Some(0) | None => None,
            Some(total) => Some((self.frame_index as f64 / total as f64).min(1.0)),
        }
    }
}

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Foreground pixels after morphology.
    pub mask_pixels: usize,
    /// Corners selected on the previous frame.
    pub features: usize,
    /// Corners that were tracked successfully.
    pub tracked: usize,
    /// Observations appended to the log.
    pub accepted: usize,
}

/// Result of running the pipeline over a frame stream.
#[derive(Debug, Clone)]
pub struct TrackingOutcome {
    pub log: PositionLog,
    pub frames_processed: u64,
    /// True if the run stopped on a [`CancelToken`]; `log` is then partial.
    pub cancelled: bool,
}

/// Runs detection, feature selection, optical flow and filtering over
/// consecutive frames, accumulating a [`PositionLog`].
pub struct TrackingPipeline {
    detector: MotionDetector,
    selector: FeatureSelector,
    tracker: OpticalFlowTracker,
    filter: MovementFilter,
    previous: Option<(u64, GrayImage)>,
    log: PositionLog,
    frames_processed: u64,
}

impl TrackingPipeline {
    pub fn new(config: TrackingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: MotionDetector::new(config.background.clone())?,
            selector: FeatureSelector::new(config.features.clone())?,
            tracker: OpticalFlowTracker::new(config.flow.clone())?,
            filter: MovementFilter::new(config.min_movement_threshold)?,
            previous: None,
            log: PositionLog::new(),
            frames_processed: 0,
        })
    }

    pub fn log(&self) -> &PositionLog {
        &self.log
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn into_log(self) -> PositionLog {
        self.log
    }

    /// Feed the next frame. Indices must strictly increase.
    ///
    /// The first frame only primes the background model and becomes the
    /// reference for the second; it never yields observations.
    pub fn process_frame(&mut self, frame: Frame) -> Result<FrameReport> {
        if let Some((last, _)) = &self.previous {
            if frame.index <= *last {
                return Err(MotionError::InvalidObservation(format!(
                    "frame {} received after frame {}",
                    frame.index, last
                )));
            }
        }

        let mask = self.detector.detect(&frame.color)?;
        let mut report = FrameReport {
            frame_index: frame.index,
            mask_pixels: mask.count(),
            ..Default::default()
        };

        if let Some((_, prev_gray)) = &self.previous {
            let features = self.selector.select(prev_gray, &mask);
            let tracked = self.tracker.track(prev_gray, &frame.gray, &features);
            report.features = features.len();
            report.tracked = tracked.iter().filter(|p| p.success).count();
            report.accepted = self.filter.apply(frame.index, &tracked, &mut self.log)?;
        }

        debug!(
            frame = report.frame_index,
            mask_pixels = report.mask_pixels,
            features = report.features,
            tracked = report.tracked,
            accepted = report.accepted,
            "Processed frame"
        );

        self.previous = Some((frame.index, frame.gray));
        self.frames_processed += 1;
        Ok(report)
    }

    /// Consume `frames` until exhausted or cancelled.
    ///
    /// An error before the first frame, or a fatal one, aborts the run. A
    /// later source error is logged and treated as end of stream. Neither
    /// that nor cancellation is an error: the outcome carries whatever was
    /// logged up to that point.
    pub fn run<I>(
        mut self,
        frames: I,
        cancel: &CancelToken,
        total_frames: Option<u64>,
        mut on_progress: impl FnMut(PipelineProgress),
    ) -> Result<TrackingOutcome>
    where
        I: IntoIterator<Item = Result<Frame>>,
    {
        let start = Instant::now();
        let mut cancelled = false;

        for frame in frames {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) if self.frames_processed > 0 && !e.is_fatal() => {
                    warn!(
                        error = %e,
                        after_frame = self.frames_processed,
                        "Frame source failed, ending run early"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let report = self.process_frame(frame)?;

            if report.frame_index % PROGRESS_INTERVAL == 0 {
                let elapsed = start.elapsed().as_secs_f64();
                let frames_per_second = if elapsed > 0.0 {
                    self.frames_processed as f64 / elapsed
                } else {
                    0.0
                };
                on_progress(PipelineProgress {
                    frame_index: report.frame_index,
                    total_frames,
                    frames_per_second,
                });
            }
        }

        info!(
            frames = self.frames_processed,
            observations = self.log.len(),
            cancelled,
            elapsed_s = start.elapsed().as_secs_f64(),
            "Tracking finished"
        );

        Ok(TrackingOutcome {
            frames_processed: self.frames_processed,
            log: self.log,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Bright 12x12 square on a dark background, moving 4 px right per frame.
    fn moving_square(index: u64) -> Frame {
        let x0 = 10 + 4 * index as u32;
        let color = RgbImage::from_fn(96, 64, |x, y| {
            if x >= x0 && x < x0 + 12 && (24..36).contains(&y) {
                Rgb([230, 220, 210])
            } else {
                Rgb([30, 40, 35])
            }
        });
        Frame::from_rgb(index, &color, 1.0)
    }

    fn static_frame(index: u64) -> Frame {
        Frame::from_rgb(index, &RgbImage::from_pixel(64, 48, Rgb([90, 90, 90])), 1.0)
    }

    #[test]
    fn test_first_frame_never_observed() {
        let mut pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let report = pipeline.process_frame(moving_square(1)).unwrap();
        assert_eq!(report.features, 0);
        assert_eq!(report.accepted, 0);
        assert!(pipeline.log().is_empty());
    }

    #[test]
    fn test_moving_square_is_tracked() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let frames = (1..=10).map(|i| Ok(moving_square(i)));
        let outcome = pipeline
            .run(frames, &CancelToken::new(), Some(10), |_| {})
            .unwrap();
        assert_eq!(outcome.frames_processed, 10);
        assert!(!outcome.cancelled);
        assert!(!outcome.log.is_empty());
        assert!(outcome.log.iter().all(|o| o.frame_index >= 2));
        assert!(outcome.log.iter().all(|o| (0..96).contains(&o.x) && (20..40).contains(&o.y)));
    }

    #[test]
    fn test_static_video_yields_empty_log() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let frames = (1..=8).map(|i| Ok(static_frame(i)));
        let outcome = pipeline
            .run(frames, &CancelToken::new(), None, |_| {})
            .unwrap();
        assert_eq!(outcome.frames_processed, 8);
        assert!(outcome.log.is_empty());
    }

    #[test]
    fn test_out_of_order_frame_rejected() {
        let mut pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        pipeline.process_frame(static_frame(3)).unwrap();
        assert!(pipeline.process_frame(static_frame(3)).is_err());
    }

    #[test]
    fn test_progress_every_thirty_frames() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let frames = (1..=65).map(|i| Ok(static_frame(i)));
        let mut seen = Vec::new();
        pipeline
            .run(frames, &CancelToken::new(), Some(65), |p| seen.push(p.frame_index))
            .unwrap();
        assert_eq!(seen, vec![30, 60]);
    }

    #[test]
    fn test_cancel_returns_partial_outcome() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let frames = (1..=100).map(move |i| {
            if i == 5 {
                trigger.cancel();
            }
            Ok(static_frame(i))
        });
        let outcome = pipeline.run(frames, &cancel, None, |_| {}).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.frames_processed, 4);
    }

    #[test]
    fn test_mid_stream_error_keeps_partial_log() {
        let clean = TrackingPipeline::new(TrackingConfig::default())
            .unwrap()
            .run((1..=10).map(|i| Ok(moving_square(i))), &CancelToken::new(), None, |_| {})
            .unwrap();

        let frames = (1..=10)
            .map(|i| Ok(moving_square(i)))
            .chain([
                Err(MotionError::Decode("bad packet".into())),
                Ok(moving_square(11)),
            ]);
        let outcome = TrackingPipeline::new(TrackingConfig::default())
            .unwrap()
            .run(frames, &CancelToken::new(), None, |_| {})
            .unwrap();
        assert!(!outcome.cancelled);
        assert_eq!(outcome.frames_processed, 10);
        assert!(!outcome.log.is_empty());
        assert_eq!(outcome.log, clean.log);
    }

    #[test]
    fn test_error_before_first_frame_aborts_run() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let frames = vec![
            Err(MotionError::Decode("bad packet".into())),
            Ok(static_frame(1)),
        ];
        let result = pipeline.run(frames, &CancelToken::new(), None, |_| {});
        assert!(matches!(result, Err(MotionError::Decode(_))));
    }

    #[test]
    fn test_fatal_error_mid_stream_aborts_run() {
        let pipeline = TrackingPipeline::new(TrackingConfig::default()).unwrap();
        let frames = vec![
            Ok(static_frame(1)),
            Err(MotionError::open("clip.mp4", "demuxer vanished")),
        ];
        let result = pipeline.run(frames, &CancelToken::new(), None, |_| {});
        assert!(matches!(result, Err(MotionError::Open { .. })));
    }

    #[test]
    fn test_progress_fraction() {
        let p = PipelineProgress {
            frame_index: 30,
            total_frames: Some(120),
            frames_per_second: 60.0,
        };
        assert_eq!(p.fraction(), Some(0.25));
        let unknown = PipelineProgress {
            total_frames: None,
            ..p
        };
        assert_eq!(unknown.fraction(), None);
    }
}
