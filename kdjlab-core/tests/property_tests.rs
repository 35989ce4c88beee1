//! Property tests for indicator and detector invariants.
//!
//! Uses proptest to verify:
//! 1. K and D stay within [0, 100] for any sane price path
//! 2. The oscillator seed: a one-bar series reads K = D = J = 50
//! 3. Every detected entry satisfies the crossing predicate, and every qualifying
//!    bar is detected (single-phase)
//! 4. Two-phase exits are the first re-cross after their entry
//! 5. Fixed-horizon records plus exclusions account for every event

use chrono::NaiveDate;
use kdjlab_core::domain::{Bar, Series};
use kdjlab_core::frame::IndicatorFrame;
use kdjlab_core::indicators::{Indicator, KdjIndicator, KdjParams, KDJ_SEED};
use kdjlab_core::returns::ReturnCalculator;
use kdjlab_core::signals::{crosses_above_zero, crosses_below_zero, SignalDetector};
use kdjlab_core::strategy::StrategyVariant;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Price path as (close, upper wick, lower wick) triples.
fn arb_path(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((1.0..200.0_f64, 0.0..5.0_f64, 0.0..5.0_f64), 1..max_len)
}

fn bars_from_path(path: &[(f64, f64, f64)]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    path.iter()
        .enumerate()
        .map(|(i, &(close, up, down))| {
            let open = if i == 0 { close } else { path[i - 1].0 };
            Bar {
                symbol: "P".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + up,
                low: (open.min(close) - down).max(0.01),
                close,
                volume: 100.0,
            }
        })
        .collect()
}

fn arb_kdj_params() -> impl Strategy<Value = KdjParams> {
    (1usize..20, 1usize..6, 1usize..6).prop_map(|(n, k_period, d_period)| KdjParams {
        n,
        k_period,
        d_period,
    })
}

// ── 1. Boundedness ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn k_and_d_stay_bounded(path in arb_path(150), params in arb_kdj_params()) {
        let bars = bars_from_path(&path);
        let out = KdjIndicator::new(params).compute(&bars);
        for v in out {
            prop_assert!((-1e-9..=100.0 + 1e-9).contains(&v.k), "K = {}", v.k);
            prop_assert!((-1e-9..=100.0 + 1e-9).contains(&v.d), "D = {}", v.d);
            prop_assert!(v.j.is_finite());
        }
    }
}

// ── 2. Seed ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn single_bar_reads_seed(path in arb_path(2), params in arb_kdj_params()) {
        let bars = bars_from_path(&path[..1]);
        let out = KdjIndicator::new(params).compute(&bars);
        prop_assert_eq!(out.len(), 1);
        prop_assert_eq!(out[0].k, KDJ_SEED);
        prop_assert_eq!(out[0].d, KDJ_SEED);
        prop_assert_eq!(out[0].j, KDJ_SEED);
    }
}

// ── 3-5. Detector ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn entries_are_exactly_the_qualifying_bars(path in arb_path(120)) {
        let series = Series::new("P", bars_from_path(&path)).unwrap();
        let variant = StrategyVariant::preset("a").unwrap();
        let frame = IndicatorFrame::compute(&series, &variant.indicators);
        let events = SignalDetector::new(&variant).detect(&frame).unwrap();

        let trend = frame.sma(20).unwrap();
        let expected: Vec<usize> = (1..frame.len())
            .filter(|&t| {
                crosses_below_zero(frame.kdj[t - 1].j, frame.kdj[t].j)
                    && frame.close(t) > trend[t]
            })
            .collect();
        let found: Vec<usize> = events.iter().map(|e| e.entry.bar_index).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn exits_are_first_recross(path in arb_path(120)) {
        let series = Series::new("P", bars_from_path(&path)).unwrap();
        let variant = StrategyVariant::preset("b").unwrap();
        let frame = IndicatorFrame::compute(&series, &variant.indicators);

        for event in SignalDetector::new(&variant).detect(&frame).unwrap() {
            let entry = event.entry.bar_index;
            let exit = event.exit.as_ref().unwrap().bar_index;
            prop_assert!(exit > entry);
            prop_assert!(crosses_above_zero(frame.kdj[exit - 1].j, frame.kdj[exit].j));
            for k in entry + 1..exit {
                prop_assert!(frame.kdj[k].j < 0.0);
            }
            prop_assert!(event.holding_days.unwrap() > 0);
        }
    }

    #[test]
    fn horizon_accounts_for_every_event(path in arb_path(120), days in 1usize..40) {
        let series = Series::new("P", bars_from_path(&path)).unwrap();
        let variant = StrategyVariant::preset("a").unwrap();
        let frame = IndicatorFrame::compute(&series, &variant.indicators);
        let events = SignalDetector::new(&variant).detect(&frame).unwrap();

        let set = ReturnCalculator::default().fixed_horizon(&series, &events, days);
        prop_assert_eq!(set.len() + set.excluded, events.len());
        let late = events
            .iter()
            .filter(|e| e.entry.bar_index + days >= series.len())
            .count();
        prop_assert_eq!(set.excluded, late);
    }
}
