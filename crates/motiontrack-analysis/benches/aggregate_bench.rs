//! Benchmarks for the aggregation pass.
//!
//! Run with: cargo bench -p motiontrack-analysis

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use motiontrack_analysis::{median_filter, MovementAggregator};
use motiontrack_core::{Observation, PositionLog};

fn synthetic_log(frames: u64, points_per_frame: i32) -> PositionLog {
    let rows = (1..=frames).flat_map(|f| {
        (0..points_per_frame).map(move |p| {
            let t = f as f64 * 0.05;
            let x = (200.0 + 120.0 * t.cos()) as i32 + p;
            let y = (150.0 + 80.0 * t.sin()) as i32 - p;
            Observation::new(f, x, y)
        })
    });
    PositionLog::from_observations(rows).unwrap_or_default()
}

fn bench_aggregate(c: &mut Criterion) {
    let aggregator = MovementAggregator::new();
    let short = synthetic_log(300, 4);
    let long = synthetic_log(10_000, 8);

    c.bench_function("aggregate_300_frames", |b| {
        b.iter(|| aggregator.aggregate(black_box(&short)));
    });

    c.bench_function("aggregate_10k_frames", |b| {
        b.iter(|| aggregator.aggregate(black_box(&long)));
    });
}

fn bench_median_filter(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| ((i * 37) % 101) as f64).collect();

    c.bench_function("median_filter_w5_10k", |b| {
        b.iter(|| median_filter(black_box(&values), 5));
    });
}

criterion_group!(benches, bench_aggregate, bench_median_filter);
criterion_main!(benches);
