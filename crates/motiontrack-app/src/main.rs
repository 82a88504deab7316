//! MotionTrack - extract the motion trajectory of moving content in a video.

use anyhow::{Context, Result};
use clap::Parser;
use motiontrack_analysis::{format_report, save_tables, ChartData, MovementAggregator};
use motiontrack_core::AnalysisConfig;
use motiontrack_media::FrameSource;
use motiontrack_tracking::{CancelToken, TrackingPipeline};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "motiontrack", version, about = "Extract motion trajectories from video")]
struct Args {
    /// Video file to analyze
    input: PathBuf,
    /// JSON configuration file; flags below override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Resize factor applied to every frame, in (0, 1]
    #[arg(long)]
    scale_factor: Option<f64>,
    /// Minimum displacement in pixels for a point to count as moving
    #[arg(long)]
    min_movement: Option<f32>,
    /// Directory for tables and chart data
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Skip writing chart data
    #[arg(long)]
    no_charts: bool,
    /// Log per-frame details
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(scale) = self.scale_factor {
            config.tracking.scale_factor = scale;
        }
        if let Some(threshold) = self.min_movement {
            config.tracking.min_movement_threshold = threshold;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.no_charts {
            config.save_charts = false;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: &Args) -> Result<()> {
    let config = args.analysis_config()?;

    let (frames, probe) = FrameSource::open(&args.input, config.tracking.scale_factor)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    info!(
        path = %probe.path,
        format = %probe.format,
        codec = %probe.codec,
        width = probe.width,
        height = probe.height,
        fps = %probe.frame_rate,
        frames = ?probe.frame_count,
        duration_s = probe.duration,
        "Opened video"
    );
    let (w, h) = frames.output_dimensions();
    info!(width = w, height = h, scale = config.tracking.scale_factor, "Processing frames");

    let pipeline = TrackingPipeline::new(config.tracking.clone())?;
    let outcome = pipeline.run(frames, &CancelToken::new(), probe.frame_count, |p| match p.fraction() {
        Some(f) => info!(
            "Processed {}/{} ({:.1}%), {:.1} fps",
            p.frame_index,
            p.total_frames.unwrap_or_default(),
            f * 100.0,
            p.frames_per_second
        ),
        None => info!("Processed {} frames, {:.1} fps", p.frame_index, p.frames_per_second),
    })?;
    if outcome.cancelled {
        warn!(frames = outcome.frames_processed, "Run cancelled, analyzing partial results");
    }

    let analysis = MovementAggregator::new().aggregate(&outcome.log);
    let Some(stats) = analysis.statistics else {
        println!("No significant movement detected.");
        return Ok(());
    };

    let dir = &config.output_dir;
    save_tables(dir, &outcome.log, &analysis.records)
        .with_context(|| format!("Failed to write tables to {}", dir.display()))?;
    if config.save_charts {
        let path = ChartData::from_analysis(&analysis)
            .save(dir)
            .context("Failed to write chart data")?;
        info!(path = %path.display(), "Saved chart data");
    }

    println!();
    print!("{}", format_report(&stats));
    println!();
    println!("Analysis complete. Results saved to '{}'", dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "motiontrack",
            "clip.mp4",
            "--scale-factor",
            "0.25",
            "--min-movement",
            "3.5",
            "--output-dir",
            "out",
            "--no-charts",
        ])
        .unwrap();
        let config = args.analysis_config().unwrap();
        assert_eq!(config.tracking.scale_factor, 0.25);
        assert_eq!(config.tracking.min_movement_threshold, 3.5);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.save_charts);
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = Args::try_parse_from(["motiontrack", "clip.mp4"]).unwrap();
        let config = args.analysis_config().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::try_parse_from(["motiontrack", "clip.mp4", "--scale-factor", "1.5"]).unwrap();
        assert!(args.analysis_config().is_err());
    }

    #[test]
    fn test_missing_input_is_usage_error() {
        assert!(Args::try_parse_from(["motiontrack"]).is_err());
    }

    #[test]
    fn test_missing_video_fails_before_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        let args = Args::try_parse_from([
            "motiontrack",
            "/no/such/video.mp4",
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .unwrap();
        assert!(run(&args).is_err());
        assert!(!out.exists());
    }
}
