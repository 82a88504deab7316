//! MotionTrack Analysis - Turning a position log into results.
//!
//! Runs once, after the frame stream has ended:
//! - [`MovementAggregator`] collapses observations into per-frame records
//!   and derives [`Statistics`]
//! - [`export`] writes the raw and aggregated CSV tables
//! - [`ChartData`] holds the plot series
//! - [`format_report`] renders the text summary

pub mod aggregate;
pub mod charts;
pub mod export;
pub mod report;

pub use aggregate::{
    median_filter, median_window, AggregatedFrameRecord, MovementAggregator, MovementAnalysis,
    Statistics,
};
pub use charts::{ChartData, FrameSeries, Histogram, TrajectorySeries};
pub use export::{save_tables, write_aggregated_table, write_raw_table};
pub use report::format_report;
