//! Return statistics — pure functions over return sets and event lists.
//!
//! Every metric is a pure function: returns in, scalar out. Empty input yields
//! 0.0 rather than NaN so reports and exports stay printable.

use std::collections::BTreeMap;

use kdjlab_core::returns::{percent_change, ReturnMode, ReturnRecord, ReturnSet};
use kdjlab_core::signals::{EventPoint, SignalEvent};
use serde::{Deserialize, Serialize};

/// Aggregate statistics of one return set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub mode: ReturnMode,
    pub count: usize,
    /// Events that could not be measured (not enough future bars, or no exit).
    pub excluded: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Share of returns strictly above zero, in [0, 1].
    pub win_rate: f64,
    pub best: f64,
    pub worst: f64,
    pub mean_holding_days: f64,
}

impl ReturnStats {
    pub fn compute(set: &ReturnSet) -> Self {
        let returns: Vec<f64> = set.records.iter().map(|r| r.return_pct).collect();
        Self {
            mode: set.mode,
            count: returns.len(),
            excluded: set.excluded,
            mean: mean(&returns),
            median: median(&returns),
            std_dev: sample_std(&returns),
            win_rate: win_rate(&returns),
            best: best(&returns),
            worst: worst(&returns),
            mean_holding_days: mean_holding_days(&set.records),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle value; the average of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (N - 1). Fewer than two values → 0.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn win_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v > 0.0).count() as f64 / values.len() as f64
}

pub fn best(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

pub fn worst(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn mean_holding_days<'a>(records: impl IntoIterator<Item = &'a ReturnRecord>) -> f64 {
    let days: Vec<f64> = records.into_iter().map(|r| r.holding_days as f64).collect();
    mean(&days)
}

/// Event count per calendar month of entry ("YYYY-MM"), in month order.
pub fn monthly_counts(events: &[SignalEvent]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts
            .entry(event.entry.date.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Round to two decimals for display and export.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ─── Williams %R zones ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrZone {
    /// %R above -20.
    Overbought,
    Neutral,
    /// %R below -80.
    Oversold,
}

impl WrZone {
    pub fn classify(value: f64) -> Self {
        if value > -20.0 {
            Self::Overbought
        } else if value < -80.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Overbought => "overbought (>-20)",
            Self::Neutral => "neutral (-80..-20)",
            Self::Oversold => "oversold (<-80)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub period: usize,
    pub zone: WrZone,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub mean_holding_days: f64,
}

/// Group a return set by the entry %R(`period`) zone.
///
/// Records without an indicator snapshot, or without that period, are ignored.
/// Zones with no records are omitted.
pub fn zone_breakdown(set: &ReturnSet, period: usize) -> Vec<ZoneStats> {
    let mut zones: BTreeMap<WrZone, Vec<&ReturnRecord>> = BTreeMap::new();
    for record in &set.records {
        let Some(wr) = record
            .indicators
            .as_ref()
            .and_then(|snap| snap.williams.get(&period))
        else {
            continue;
        };
        zones.entry(WrZone::classify(*wr)).or_default().push(record);
    }

    zones
        .into_iter()
        .map(|(zone, records)| {
            let returns: Vec<f64> = records.iter().map(|r| r.return_pct).collect();
            ZoneStats {
                period,
                zone,
                count: returns.len(),
                mean: mean(&returns),
                median: median(&returns),
                std_dev: sample_std(&returns),
                mean_holding_days: mean_holding_days(records),
            }
        })
        .collect()
}

// ─── Indicator / return correlation ─────────────────────────────────

/// Pearson correlation between one entry or exit indicator and the pattern return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// `entry_j`, `exit_j`, `entry_wr14`, `exit_wr28`, ...
    pub factor: String,
    pub count: usize,
    pub coefficient: f64,
}

/// Pearson correlation coefficient. Fewer than two pairs or a constant side → 0.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let (mx, my) = (mean(xs), mean(ys));
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }
    if vx == 0.0 || vy == 0.0 {
        return 0.0;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// Correlate entry/exit J and %R with the entry-to-exit return of paired events.
///
/// Entry-only events are ignored, so single-phase scans yield an empty list.
/// %R factors come from the periods present in the first paired event's snapshot.
pub fn correlations(events: &[SignalEvent]) -> Vec<Correlation> {
    let paired: Vec<(&SignalEvent, &EventPoint)> = events
        .iter()
        .filter_map(|e| e.exit.as_ref().map(|x| (e, x)))
        .collect();
    let Some(&(_, first_exit)) = paired.first() else {
        return Vec::new();
    };
    let returns: Vec<f64> = paired
        .iter()
        .map(|(e, x)| percent_change(e.entry.price, x.price))
        .collect();

    let mut factors: Vec<(String, Vec<f64>)> = vec![
        ("entry_j".into(), paired.iter().map(|(e, _)| e.entry.j()).collect()),
        ("exit_j".into(), paired.iter().map(|(_, x)| x.j()).collect()),
    ];
    for &period in first_exit.indicators.williams.keys() {
        let wr = |p: &EventPoint| p.indicators.williams.get(&period).copied().unwrap_or(f64::NAN);
        factors.push((
            format!("entry_wr{period}"),
            paired.iter().map(|(e, _)| wr(&e.entry)).collect(),
        ));
        factors.push((
            format!("exit_wr{period}"),
            paired.iter().map(|(_, x)| wr(x)).collect(),
        ));
    }

    factors
        .into_iter()
        .map(|(factor, values)| {
            // pairwise complete observations only
            let (xs, ys): (Vec<f64>, Vec<f64>) = values
                .iter()
                .zip(&returns)
                .filter(|(x, _)| x.is_finite())
                .map(|(&x, &y)| (x, y))
                .unzip();
            Correlation {
                factor,
                count: xs.len(),
                coefficient: pearson(&xs, &ys),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kdjlab_core::frame::IndicatorSnapshot;
    use kdjlab_core::indicators::Kdj;

    fn record(return_pct: f64, holding_days: i64, wr14: Option<f64>) -> ReturnRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ReturnRecord {
            symbol: "X".into(),
            mode: ReturnMode::PatternBounded,
            entry_date: date,
            exit_date: date + chrono::Duration::days(holding_days),
            entry_price: 10.0,
            exit_price: 10.0 * (1.0 + return_pct / 100.0),
            return_pct,
            holding_days,
            indicators: wr14.map(|wr| IndicatorSnapshot {
                close: 10.0,
                kdj: Kdj::from_kd(50.0, 50.0),
                sma: BTreeMap::new(),
                williams: BTreeMap::from([(14, wr)]),
                macd: None,
                bollinger: None,
            }),
        }
    }

    fn set(records: Vec<ReturnRecord>, excluded: usize) -> ReturnSet {
        ReturnSet {
            mode: ReturnMode::PatternBounded,
            records,
            excluded,
        }
    }

    #[test]
    fn stats_of_known_set() {
        let s = set(
            vec![
                record(4.0, 2, None),
                record(-2.0, 4, None),
                record(1.0, 6, None),
            ],
            2,
        );
        let stats = ReturnStats::compute(&s);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.excluded, 2);
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert_eq!(stats.median, 1.0);
        assert!((stats.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.best, 4.0);
        assert_eq!(stats.worst, -2.0);
        assert!((stats.mean_holding_days - 4.0).abs() < 1e-12);
        // sample var = (9 + 9 + 0) / 2
        assert!((stats.std_dev - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_set_is_all_zero() {
        let stats = ReturnStats::compute(&set(vec![], 4));
        assert_eq!(stats.count, 0);
        assert_eq!(stats.excluded, 4);
        assert_eq!((stats.mean, stats.median, stats.win_rate), (0.0, 0.0, 0.0));
        assert_eq!((stats.best, stats.worst), (0.0, 0.0));
    }

    #[test]
    fn median_even_length() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn zero_return_is_not_a_win() {
        assert_eq!(win_rate(&[0.0, 1.0]), 0.5);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.005), -0.01);
    }

    #[test]
    fn zones_classify_at_boundaries() {
        assert_eq!(WrZone::classify(-10.0), WrZone::Overbought);
        assert_eq!(WrZone::classify(-20.0), WrZone::Neutral);
        assert_eq!(WrZone::classify(-80.0), WrZone::Neutral);
        assert_eq!(WrZone::classify(-85.0), WrZone::Oversold);
    }

    #[test]
    fn zone_breakdown_groups_records() {
        let s = set(
            vec![
                record(2.0, 3, Some(-90.0)),
                record(4.0, 5, Some(-95.0)),
                record(-1.0, 1, Some(-50.0)),
                record(9.0, 1, None),
            ],
            0,
        );
        let zones = zone_breakdown(&s, 14);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone, WrZone::Neutral);
        assert_eq!(zones[0].count, 1);
        assert_eq!(zones[1].zone, WrZone::Oversold);
        assert_eq!(zones[1].count, 2);
        assert!((zones[1].mean - 3.0).abs() < 1e-12);
        assert!((zones[1].mean_holding_days - 4.0).abs() < 1e-12);
        // returns 2 and 4: sample std sqrt(2)
        assert!((zones[1].std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(zones[0].std_dev, 0.0);

        assert!(zone_breakdown(&s, 28).is_empty());
    }

    fn point(bar_index: usize, price: f64, j: f64, wr14: f64) -> EventPoint {
        let date =
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(bar_index as i64);
        EventPoint {
            bar_index,
            date,
            price,
            indicators: IndicatorSnapshot {
                close: price,
                // K = D = J
                kdj: Kdj::from_kd(j, j),
                sma: BTreeMap::new(),
                williams: BTreeMap::from([(14, wr14)]),
                macd: None,
                bollinger: None,
            },
        }
    }

    fn paired(entry_j: f64, exit_price: f64, exit_wr14: f64) -> SignalEvent {
        SignalEvent::paired(
            "X",
            point(0, 10.0, entry_j, -90.0),
            5.0,
            point(2, exit_price, 10.0, exit_wr14),
        )
    }

    #[test]
    fn pearson_known_values() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn constant_factor_correlates_to_zero() {
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn correlations_cover_j_and_wr_at_entry_and_exit() {
        // deeper entry J pairs with a bigger rebound; exit %R tracks the return
        let events = vec![
            paired(-30.0, 13.0, -10.0),
            paired(-20.0, 12.0, -20.0),
            paired(-10.0, 11.0, -30.0),
        ];
        let corr = correlations(&events);
        let factors: Vec<&str> = corr.iter().map(|c| c.factor.as_str()).collect();
        assert_eq!(factors, ["entry_j", "exit_j", "entry_wr14", "exit_wr14"]);
        assert!(corr.iter().all(|c| c.count == 3));

        let by = |name: &str| corr.iter().find(|c| c.factor == name).unwrap().coefficient;
        assert!((by("entry_j") + 1.0).abs() < 1e-9);
        assert!((by("exit_wr14") - 1.0).abs() < 1e-9);
        // exit J and entry %R are constant across events
        assert_eq!(by("exit_j"), 0.0);
        assert_eq!(by("entry_wr14"), 0.0);
    }

    #[test]
    fn entry_only_events_have_no_correlations() {
        let event = SignalEvent::entry_only("X", point(0, 10.0, -5.0, -90.0), 3.0);
        assert!(correlations(&[event]).is_empty());
    }
}
