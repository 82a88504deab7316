//! Chart series derived from the aggregated records.
//!
//! Rendering is left to external tools; this module only produces the data
//! behind the four standard plots (trajectory, smoothed velocity,
//! cumulative distance, velocity histogram) as JSON.

use crate::aggregate::MovementAnalysis;
use motiontrack_core::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const CHARTS_FILE: &str = "charts.json";

/// Bin count of the velocity histogram.
pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub start: Option<[f64; 2]>,
    pub end: Option<[f64; 2]>,
}

/// A value per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSeries {
    pub frames: Vec<u64>,
    pub values: Vec<f64>,
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` over their own range; the last bin includes its upper
    /// edge. A degenerate range is widened to one unit around the value.
    pub fn compute(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if values.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0; bins];
        for &v in values {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        Self { edges, counts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub trajectory: TrajectorySeries,
    pub velocity: FrameSeries,
    pub cumulative_distance: FrameSeries,
    pub velocity_histogram: Histogram,
}

impl ChartData {
    pub fn from_analysis(analysis: &MovementAnalysis) -> Self {
        let records = &analysis.records;
        let frames: Vec<u64> = records.iter().map(|r| r.frame_index).collect();
        let smoothed: Vec<f64> = records.iter().map(|r| r.smoothed_delta).collect();

        Self {
            trajectory: TrajectorySeries {
                x: records.iter().map(|r| r.mean_x).collect(),
                y: records.iter().map(|r| r.mean_y).collect(),
                start: records.first().map(|r| [r.mean_x, r.mean_y]),
                end: records.last().map(|r| [r.mean_x, r.mean_y]),
            },
            velocity_histogram: Histogram::compute(&smoothed, HISTOGRAM_BINS),
            velocity: FrameSeries {
                frames: frames.clone(),
                values: smoothed,
            },
            cumulative_distance: FrameSeries {
                frames,
                values: records.iter().map(|r| r.cumulative_distance).collect(),
            },
        }
    }

    /// Write `charts.json` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CHARTS_FILE);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), self)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MovementAggregator;
    use motiontrack_core::{Observation, PositionLog};

    #[test]
    fn test_histogram_bins() {
        let h = Histogram::compute(&[0.0, 1.0, 2.0, 10.0], 10);
        assert_eq!(h.edges.len(), 11);
        assert_eq!(h.counts.iter().sum::<usize>(), 4);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[1], 1);
        assert_eq!(h.counts[2], 1);
        assert_eq!(h.counts[9], 1);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = Histogram::compute(&[3.0, 3.0], 20);
        assert_eq!(h.edges[0], 2.5);
        assert_eq!(h.edges[20], 3.5);
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_chart_data_roundtrip_file() {
        let log = PositionLog::from_observations([
            Observation::new(2, 0, 0),
            Observation::new(3, 3, 4),
            Observation::new(5, 6, 8),
        ])
        .unwrap();
        let charts = ChartData::from_analysis(&MovementAggregator::new().aggregate(&log));
        assert_eq!(charts.trajectory.start, Some([0.0, 0.0]));
        assert_eq!(charts.trajectory.end, Some([6.0, 8.0]));
        assert_eq!(charts.velocity.frames, vec![2, 3, 5]);
        assert_eq!(charts.cumulative_distance.values, vec![0.0, 5.0, 10.0]);
        assert_eq!(charts.velocity_histogram.counts.len(), HISTOGRAM_BINS);

        let tmp = tempfile::tempdir().unwrap();
        let path = charts.save(tmp.path()).unwrap();
        let loaded: ChartData = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded, charts);
    }
}
