//! Plain-text statistics report.

use crate::aggregate::Statistics;
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

/// Render the statistics block printed at the end of a run.
pub fn format_report(stats: &Statistics) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "MOVEMENT STATISTICS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Distance: {:.2}", stats.total_distance);
    let _ = writeln!(out, "Mean Velocity: {:.2}", stats.mean_velocity);
    let _ = writeln!(out, "Max Velocity: {:.2}", stats.max_velocity);
    let _ = writeln!(out, "Median Velocity: {:.2}", stats.median_velocity);
    let _ = writeln!(out, "Total Frames Analyzed: {}", stats.frame_count);
    let _ = writeln!(out, "Total Movement Points: {}", stats.point_count);
    out
}
