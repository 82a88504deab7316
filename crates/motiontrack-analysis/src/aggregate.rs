//! Batch aggregation of a finished position log into per-frame records.
//!
//! All observations of one frame collapse into their centroid. Frame to
//! frame centroid steps are then median-filtered and accumulated into a
//! travelled distance. This is a single-object simplification: several
//! moving objects in one frame are averaged together.

use motiontrack_core::PositionLog;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Largest median window ever applied.
pub const MAX_MEDIAN_WINDOW: usize = 5;

/// Series of at most this many records are left unsmoothed.
pub const SMOOTHING_MIN_RECORDS: usize = 5;

/// Per-frame summary of the accepted observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFrameRecord {
    pub frame_index: u64,
    pub mean_x: f64,
    pub mean_y: f64,
    /// Step from the previous record; 0 for the first record.
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_total: f64,
    pub smoothed_delta: f64,
    pub cumulative_distance: f64,
}

/// Summary statistics over the smoothed step series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_distance: f64,
    pub mean_velocity: f64,
    pub max_velocity: f64,
    pub median_velocity: f64,
    pub frame_count: usize,
    pub point_count: usize,
}

/// Output of [`MovementAggregator::aggregate`].
///
/// An empty log produces no records and no statistics. That is the
/// "no significant movement" outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementAnalysis {
    pub records: Vec<AggregatedFrameRecord>,
    pub statistics: Option<Statistics>,
}

impl MovementAnalysis {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Turns a [`PositionLog`] into [`AggregatedFrameRecord`]s and [`Statistics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementAggregator;

impl MovementAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate a completed log. Pure: the same log always gives the same
    /// analysis.
    pub fn aggregate(&self, log: &PositionLog) -> MovementAnalysis {
        let mut records = group_by_frame(log);
        if records.is_empty() {
            return MovementAnalysis::default();
        }

        for i in 1..records.len() {
            let dx = records[i].mean_x - records[i - 1].mean_x;
            let dy = records[i].mean_y - records[i - 1].mean_y;
            records[i].delta_x = dx;
            records[i].delta_y = dy;
            records[i].delta_total = dx.hypot(dy);
        }

        let deltas: Vec<f64> = records.iter().map(|r| r.delta_total).collect();
        let smoothed = if records.len() > SMOOTHING_MIN_RECORDS {
            median_filter(&deltas, median_window(records.len()))
        } else {
            deltas
        };

        let mut cumulative = 0.0;
        for (record, s) in records.iter_mut().zip(&smoothed) {
            cumulative += s;
            record.smoothed_delta = *s;
            record.cumulative_distance = cumulative;
        }

        let statistics = Some(Statistics {
            total_distance: cumulative,
            mean_velocity: smoothed.iter().sum::<f64>() / smoothed.len() as f64,
            max_velocity: smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            median_velocity: median(&smoothed),
            frame_count: records.len(),
            point_count: records.len(),
        });

        MovementAnalysis { records, statistics }
    }
}

fn group_by_frame(log: &PositionLog) -> Vec<AggregatedFrameRecord> {
    let mut records = Vec::new();
    let mut current: Option<(u64, i64, i64, usize)> = None;

    let mut flush = |(frame, sx, sy, n): (u64, i64, i64, usize)| {
        records.push(AggregatedFrameRecord {
            frame_index: frame,
            mean_x: sx as f64 / n as f64,
            mean_y: sy as f64 / n as f64,
            delta_x: 0.0,
            delta_y: 0.0,
            delta_total: 0.0,
            smoothed_delta: 0.0,
            cumulative_distance: 0.0,
        });
    };

    for obs in log {
        if let Some((frame, sx, sy, n)) = current.as_mut() {
            if *frame == obs.frame_index {
                *sx += obs.x as i64;
                *sy += obs.y as i64;
                *n += 1;
                continue;
            }
        }
        if let Some(group) = current.take() {
            flush(group);
        }
        current = Some((obs.frame_index, obs.x as i64, obs.y as i64, 1));
    }
    if let Some(group) = current {
        flush(group);
    }
    records
}

/// Median window for `n` records: `min(5, n / 2)`, at least 1, and rounded
/// down to an odd length.
pub fn median_window(n: usize) -> usize {
    let w = (n / 2).min(MAX_MEDIAN_WINDOW).max(1);
    if w % 2 == 0 {
        w - 1
    } else {
        w
    }
}

/// Sliding median of odd length `window`; samples past either end count
/// as zero.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let half = (window / 2) as isize;
    let n = values.len() as isize;
    let mut buf = Vec::with_capacity(window);
    (0..n)
        .map(|i| {
            buf.clear();
            for j in i - half..=i + half {
                buf.push(if (0..n).contains(&j) { values[j as usize] } else { 0.0 });
            }
            buf.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            buf[buf.len() / 2]
        })
        .collect()
}

/// Median with the mean of the two middle values for even lengths.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
