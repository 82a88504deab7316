//! CSV tables for the raw log and the aggregated records.

use crate::aggregate::AggregatedFrameRecord;
use motiontrack_core::{PositionLog, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const RAW_TABLE_FILE: &str = "movement_data.csv";
pub const AGGREGATED_TABLE_FILE: &str = "smoothed_movement_data.csv";

const RAW_HEADER: &str = "frame_num,pos_x,pos_y";
const AGGREGATED_HEADER: &str =
    "frame_num,pos_x,pos_y,delta_x,delta_y,delta_total,delta_total_smoothed,cumulative_distance";

/// One `frame,x,y` row per observation, in log order.
pub fn write_raw_table<W: Write>(log: &PositionLog, mut out: W) -> Result<()> {
    writeln!(out, "{RAW_HEADER}")?;
    for obs in log {
        writeln!(out, "{},{},{}", obs.frame_index, obs.x, obs.y)?;
    }
    out.flush()?;
    Ok(())
}

/// One row per aggregated frame record.
pub fn write_aggregated_table<W: Write>(records: &[AggregatedFrameRecord], mut out: W) -> Result<()> {
    writeln!(out, "{AGGREGATED_HEADER}")?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            r.frame_index,
            r.mean_x,
            r.mean_y,
            r.delta_x,
            r.delta_y,
            r.delta_total,
            r.smoothed_delta,
            r.cumulative_distance
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write both tables into `dir`, creating it if needed. Returns the paths
/// written.
pub fn save_tables(
    dir: &Path,
    log: &PositionLog,
    records: &[AggregatedFrameRecord],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let raw_path = dir.join(RAW_TABLE_FILE);
    write_raw_table(log, BufWriter::new(File::create(&raw_path)?))?;

    let agg_path = dir.join(AGGREGATED_TABLE_FILE);
    write_aggregated_table(records, BufWriter::new(File::create(&agg_path)?))?;

    info!(
        dir = %dir.display(),
        observations = log.len(),
        frames = records.len(),
        "Saved movement tables"
    );
    Ok(vec![raw_path, agg_path])
}
