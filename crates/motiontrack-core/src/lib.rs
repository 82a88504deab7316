//! MotionTrack Core - Foundation types for trajectory extraction
//!
//! This crate provides the fundamental types used throughout MotionTrack:
//! - The error taxonomy shared by every stage
//! - Validated configuration for tracking and analysis
//! - Color/grayscale frame buffers and scaling
//! - Movement observations and the position log
//! - Frame rate representation

pub mod config;
pub mod error;
pub mod frame;
pub mod observation;
pub mod time;

pub use config::{AnalysisConfig, BackgroundParams, FeatureParams, FlowParams, TrackingConfig};
pub use error::{MotionError, Result};
pub use frame::{rgb_to_gray, scale_rgb, scaled_dimensions, Frame, GrayImage};
pub use observation::{Observation, PositionLog};
pub use time::FrameRate;
