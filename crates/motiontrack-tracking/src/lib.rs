//! MotionTrack Tracking - Background subtraction and point tracking.
//!
//! Stages, in the order a frame passes through them:
//! 1. [`MotionDetector`] classifies pixels against an adaptive background model
//! 2. [`FeatureSelector`] picks corners inside the foreground mask
//! 3. [`OpticalFlowTracker`] follows those corners into the next frame
//! 4. [`MovementFilter`] keeps the points that actually moved
//!
//! [`TrackingPipeline`] drives them sequentially over a frame stream.

pub mod background;
pub mod features;
pub mod morphology;
pub mod movement;
pub mod optical_flow;
pub mod pipeline;
pub mod pyramid;

pub use background::{BackgroundModel, MotionDetector, PixelClass};
pub use features::FeatureSelector;
pub use morphology::MotionMask;
pub use movement::MovementFilter;
pub use optical_flow::{OpticalFlowTracker, TrackedPoint};
pub use pipeline::{CancelToken, FrameReport, PipelineProgress, TrackingOutcome, TrackingPipeline};
pub use pyramid::{pyr_down, scharr_gradients, ImagePyramid};
