//! Result files produced from a tracked synthetic video.

use crate::synthetic;
use motiontrack_analysis::{
    export::{AGGREGATED_TABLE_FILE, RAW_TABLE_FILE},
    format_report, save_tables, ChartData, MovementAggregator,
};
use motiontrack_core::TrackingConfig;
use motiontrack_tracking::{CancelToken, TrackingPipeline};

#[test]
fn tables_charts_and_report_agree() {
    let source = synthetic::source(synthetic::moving_square(16, 8), 0.5);
    let outcome = TrackingPipeline::new(TrackingConfig::default())
        .unwrap()
        .run(source, &CancelToken::new(), None, |_| {})
        .unwrap();
    let analysis = MovementAggregator::new().aggregate(&outcome.log);
    let stats = analysis.statistics.unwrap();

    let tmp = tempfile::tempdir().unwrap();
    save_tables(tmp.path(), &outcome.log, &analysis.records).unwrap();

    let raw = std::fs::read_to_string(tmp.path().join(RAW_TABLE_FILE)).unwrap();
    assert_eq!(raw.lines().next(), Some("frame_num,pos_x,pos_y"));
    assert_eq!(raw.lines().count(), outcome.log.len() + 1);

    let aggregated = std::fs::read_to_string(tmp.path().join(AGGREGATED_TABLE_FILE)).unwrap();
    assert_eq!(aggregated.lines().count(), analysis.records.len() + 1);

    let charts = ChartData::from_analysis(&analysis);
    charts.save(tmp.path()).unwrap();
    assert_eq!(charts.velocity.frames.len(), analysis.records.len());
    assert_eq!(
        charts.velocity_histogram.counts.iter().sum::<usize>(),
        analysis.records.len()
    );

    let report = format_report(&stats);
    assert!(report.contains(&format!("Total Distance: {:.2}", stats.total_distance)));
    assert!(report.contains(&format!("Total Frames Analyzed: {}", analysis.records.len())));
}
