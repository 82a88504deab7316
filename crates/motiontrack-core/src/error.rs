//! Error types for MotionTrack.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for MotionTrack operations.
///
/// Only [`MotionError::Open`] is fatal to a tracking run. Per-point tracking
/// failures are carried as flags on the tracked points, and an empty result
/// is reported through the analysis types rather than as an error.
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Cannot open media source {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Decoder error: {0}")]
    Decode(String),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MotionError {
    /// Build an [`MotionError::Open`] for the given path.
    pub fn open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias for MotionTrack operations.
pub type Result<T> = std::result::Result<T, MotionError>;
