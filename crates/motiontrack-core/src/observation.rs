//! Accepted movement observations and the log that accumulates them.

use crate::error::{MotionError, Result};
use serde::{Deserialize, Serialize};

/// One tracked point that moved further than the movement threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub frame_index: u64,
    pub x: i32,
    pub y: i32,
}

impl Observation {
    pub const fn new(frame_index: u64, x: i32, y: i32) -> Self {
        Self { frame_index, x, y }
    }
}

/// Append-only, frame-ordered sequence of observations.
///
/// Invariants: every `frame_index` is at least 1 and indices never decrease.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionLog {
    entries: Vec<Observation>,
}

impl PositionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from existing rows, checking the ordering invariants.
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Result<Self> {
        let mut log = Self::new();
        for obs in observations {
            log.append(obs)?;
        }
        Ok(log)
    }

    pub fn append(&mut self, obs: Observation) -> Result<()> {
        if obs.frame_index < 1 {
            return Err(MotionError::InvalidObservation(format!(
                "frame index must be >= 1, got {}",
                obs.frame_index
            )));
        }
        if let Some(last) = self.entries.last() {
            if obs.frame_index < last.frame_index {
                return Err(MotionError::InvalidObservation(format!(
                    "frame index {} precedes last logged frame {}",
                    obs.frame_index, last.frame_index
                )));
            }
        }
        self.entries.push(obs);
        Ok(())
    }

    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct frames with at least one observation.
    pub fn frame_count(&self) -> usize {
        let mut count = 0;
        let mut last = None;
        for obs in &self.entries {
            if last != Some(obs.frame_index) {
                count += 1;
                last = Some(obs.frame_index);
            }
        }
        count
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a PositionLog {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_in_order() {
        let mut log = PositionLog::new();
        log.append(Observation::new(2, 10, 10)).unwrap();
        log.append(Observation::new(2, 12, 10)).unwrap();
        log.append(Observation::new(5, 20, 11)).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.frame_count(), 2);
    }

    #[test]
    fn test_rejects_frame_zero() {
        let mut log = PositionLog::new();
        assert!(log.append(Observation::new(0, 1, 1)).is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_rejects_decreasing_frames() {
        let result = PositionLog::from_observations([
            Observation::new(3, 0, 0),
            Observation::new(2, 0, 0),
        ]);
        assert!(matches!(result, Err(MotionError::InvalidObservation(_))));
    }
}
