//! Filtering tracked points down to real movement observations.

use crate::optical_flow::TrackedPoint;
use motiontrack_core::{MotionError, Observation, PositionLog, Result};

/// Keeps tracked points that succeeded and moved strictly further than a
/// threshold.
#[derive(Debug, Clone, Copy)]
pub struct MovementFilter {
    threshold: f32,
}

impl MovementFilter {
    pub fn new(threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(MotionError::InvalidConfig(format!(
                "min_movement_threshold must be a non-negative number, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn passes(&self, point: &TrackedPoint) -> bool {
        point.success && point.displacement() > self.threshold
    }

    /// Append an observation for every passing point, using its new position
    /// rounded to whole pixels. Returns how many were appended.
    pub fn apply(&self, frame_index: u64, points: &[TrackedPoint], log: &mut PositionLog) -> Result<usize> {
        let mut appended = 0;
        for point in points.iter().filter(|p| self.passes(p)) {
            log.append(Observation::new(
                frame_index,
                point.position.x.round() as i32,
                point.position.y.round() as i32,
            ))?;
            appended += 1;
        }
        Ok(appended)
    }
}
