//! IndicatorFrame — one symbol's series augmented with every requested indicator.
//!
//! Built in a single forward traversal: each bar is fed once to every indicator
//! state machine, and the outputs are stored column-wise. The frame borrows the
//! series; the series itself is never modified.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Series};
use crate::indicators::{
    Bollinger, BollingerBands, BollingerParams, Indicator, Kdj, KdjIndicator, KdjParams, Macd,
    MacdIndicator, MacdParams, Sma, WilliamsR,
};

/// Which indicators to compute for each symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSpec {
    /// Moving-average windows (the trend filter must be one of them).
    pub sma_windows: Vec<usize>,
    pub kdj: KdjParams,
    /// Williams %R lookbacks.
    pub williams_periods: Vec<usize>,
    pub macd: Option<MacdParams>,
    pub bollinger: Option<BollingerParams>,
}

impl Default for IndicatorSpec {
    /// Full set: MA 5/20/60, KDJ(9,3,3), %R 14/28, MACD(12,26,9), BOLL(20,2).
    fn default() -> Self {
        Self {
            sma_windows: vec![5, 20, 60],
            kdj: KdjParams::default(),
            williams_periods: vec![14, 28],
            macd: Some(MacdParams::default()),
            bollinger: Some(BollingerParams::default()),
        }
    }
}

impl IndicatorSpec {
    /// Moving averages and KDJ only.
    pub fn minimal() -> Self {
        Self {
            williams_periods: Vec::new(),
            macd: None,
            bollinger: None,
            ..Self::default()
        }
    }

    /// True when anything beyond MA/KDJ is requested (%R, MACD, BOLL).
    pub fn has_auxiliary(&self) -> bool {
        !self.williams_periods.is_empty() || self.macd.is_some() || self.bollinger.is_some()
    }
}

/// Indicator values of one bar, detached from the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub kdj: Kdj,
    pub sma: BTreeMap<usize, f64>,
    pub williams: BTreeMap<usize, f64>,
    pub macd: Option<Macd>,
    pub bollinger: Option<BollingerBands>,
}

/// A series plus its derived indicator columns. Every column has `len()` entries.
///
/// Columns are public so callers (and tests) can inspect or substitute them;
/// the detector only reads them.
#[derive(Debug, Clone)]
pub struct IndicatorFrame<'a> {
    series: &'a Series,
    pub sma: BTreeMap<usize, Vec<f64>>,
    pub kdj: Vec<Kdj>,
    pub williams: BTreeMap<usize, Vec<f64>>,
    pub macd: Option<Vec<Macd>>,
    pub bollinger: Option<Vec<BollingerBands>>,
}

impl<'a> IndicatorFrame<'a> {
    /// Compute every indicator in `spec` over `series` in one pass.
    ///
    /// Windows and periods must be >= 1 (guaranteed by `StrategyVariant::validate`).
    pub fn compute(series: &'a Series, spec: &IndicatorSpec) -> Self {
        let n = series.len();

        let sma_windows: BTreeSet<usize> = spec.sma_windows.iter().copied().collect();
        let mut smas: Vec<Sma> = sma_windows.iter().map(|&w| Sma::new(w)).collect();
        let mut sma_cols: Vec<Vec<f64>> = vec![Vec::with_capacity(n); smas.len()];

        let wr_periods: BTreeSet<usize> = spec.williams_periods.iter().copied().collect();
        let mut wrs: Vec<WilliamsR> = wr_periods.iter().map(|&p| WilliamsR::new(p)).collect();
        let mut wr_cols: Vec<Vec<f64>> = vec![Vec::with_capacity(n); wrs.len()];

        let mut kdj = KdjIndicator::new(spec.kdj);
        let mut kdj_col = Vec::with_capacity(n);

        let mut macd = spec.macd.map(|p| (MacdIndicator::new(p), Vec::with_capacity(n)));
        let mut boll = spec.bollinger.map(|p| (Bollinger::new(p), Vec::with_capacity(n)));

        for bar in series.bars() {
            for (sma, col) in smas.iter_mut().zip(sma_cols.iter_mut()) {
                col.push(sma.update(bar));
            }
            for (wr, col) in wrs.iter_mut().zip(wr_cols.iter_mut()) {
                col.push(wr.update(bar));
            }
            kdj_col.push(kdj.update(bar));
            if let Some((ind, col)) = macd.as_mut() {
                col.push(ind.update(bar));
            }
            if let Some((ind, col)) = boll.as_mut() {
                col.push(ind.update(bar));
            }
        }

        Self {
            series,
            sma: sma_windows.into_iter().zip(sma_cols).collect(),
            kdj: kdj_col,
            williams: wr_periods.into_iter().zip(wr_cols).collect(),
            macd: macd.map(|(_, col)| col),
            bollinger: boll.map(|(_, col)| col),
        }
    }

    pub fn series(&self) -> &'a Series {
        self.series
    }

    pub fn symbol(&self) -> &'a str {
        self.series.symbol()
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.series.bars()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn date(&self, index: usize) -> NaiveDate {
        self.series.bars()[index].date
    }

    pub fn close(&self, index: usize) -> f64 {
        self.series.bars()[index].close
    }

    /// J column as a plain slice.
    pub fn j_values(&self) -> Vec<f64> {
        self.kdj.iter().map(|v| v.j).collect()
    }

    /// Moving-average column for `window`, if it was computed.
    pub fn sma(&self, window: usize) -> Option<&[f64]> {
        self.sma.get(&window).map(|v| v.as_slice())
    }

    pub fn williams(&self, period: usize) -> Option<&[f64]> {
        self.williams.get(&period).map(|v| v.as_slice())
    }

    /// Copy out every indicator value at `index`.
    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        IndicatorSnapshot {
            close: self.close(index),
            kdj: self.kdj[index],
            sma: self.sma.iter().map(|(w, col)| (*w, col[index])).collect(),
            williams: self.williams.iter().map(|(p, col)| (*p, col[index])).collect(),
            macd: self.macd.as_ref().map(|col| col[index]),
            bollinger: self.bollinger.as_ref().map(|col| col[index]),
        }
    }
}
