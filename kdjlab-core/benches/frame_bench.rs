//! Criterion benchmarks for KdjLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator frame build (minimal vs full indicator set)
//! 2. Event detection over a prebuilt frame (single- and two-phase)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kdjlab_core::domain::{Bar, Series};
use kdjlab_core::frame::{IndicatorFrame, IndicatorSpec};
use kdjlab_core::signals::SignalDetector;
use kdjlab_core::strategy::StrategyVariant;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> Series {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.013).cos() * 4.0;
            let open = close - 0.3;
            Bar {
                symbol: "BENCH".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect();
    Series::new("BENCH", bars).unwrap()
}

// ── 1. Frame build ───────────────────────────────────────────────────

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_build");

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);

        let minimal = IndicatorSpec::minimal();
        group.bench_with_input(BenchmarkId::new("minimal", bar_count), &bar_count, |b, _| {
            b.iter(|| IndicatorFrame::compute(black_box(&series), black_box(&minimal)));
        });

        let full = IndicatorSpec::default();
        group.bench_with_input(BenchmarkId::new("full", bar_count), &bar_count, |b, _| {
            b.iter(|| IndicatorFrame::compute(black_box(&series), black_box(&full)));
        });
    }

    group.finish();
}

// ── 2. Detection ─────────────────────────────────────────────────────

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");

    for &bar_count in &[252, 2520] {
        let series = make_series(bar_count);
        for name in ["a", "c"] {
            let variant = StrategyVariant::preset(name).unwrap();
            let frame = IndicatorFrame::compute(&series, &variant.indicators);
            let detector = SignalDetector::new(&variant);
            group.bench_with_input(
                BenchmarkId::new(format!("preset_{name}"), bar_count),
                &bar_count,
                |b, _| {
                    b.iter(|| detector.detect(black_box(&frame)).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_frame, bench_detect);
criterion_main!(benches);
