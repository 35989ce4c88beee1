//! ReturnCalculator — forward returns of detected events.
//!
//! Fixed horizon: the close exactly `days` bars after entry. Entries without that
//! many future bars are excluded and counted.
//! Pattern-bounded: entry-to-exit of a paired event, with calendar holding days.
//!
//! Values are full precision; rounding belongs to the reporting layer.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Series;
use crate::frame::IndicatorSnapshot;
use crate::signals::SignalEvent;

/// Signed percentage change from `from` to `to`.
pub fn percent_change(from: f64, to: f64) -> f64 {
    (to / from - 1.0) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReturnMode {
    FixedHorizon { days: usize },
    PatternBounded,
}

impl ReturnMode {
    /// Short label used in file names and tables ("5d", "pattern").
    pub fn label(&self) -> String {
        match self {
            Self::FixedHorizon { days } => format!("{days}d"),
            Self::PatternBounded => "pattern".to_string(),
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedHorizon { days } => write!(f, "{days}-bar forward return"),
            Self::PatternBounded => write!(f, "entry-to-exit return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub symbol: String,
    pub mode: ReturnMode,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub return_pct: f64,
    /// Calendar days between entry and exit.
    pub holding_days: i64,
    /// Indicator values at entry, when the variant reports them.
    pub indicators: Option<IndicatorSnapshot>,
}

/// Records of one mode plus how many events could not be measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSet {
    pub mode: ReturnMode,
    pub records: Vec<ReturnRecord>,
    /// Events without enough future bars (fixed horizon) or without an exit.
    pub excluded: usize,
}

impl ReturnSet {
    pub fn empty(mode: ReturnMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
            excluded: 0,
        }
    }

    /// Fold another symbol's set of the same mode into this one.
    pub fn merge(&mut self, other: ReturnSet) {
        debug_assert_eq!(self.mode, other.mode);
        self.records.extend(other.records);
        self.excluded += other.excluded;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReturnCalculator {
    include_indicators: bool,
}

impl ReturnCalculator {
    pub fn new(include_indicators: bool) -> Self {
        Self { include_indicators }
    }

    fn snapshot(&self, event: &SignalEvent) -> Option<IndicatorSnapshot> {
        self.include_indicators
            .then(|| event.entry.indicators.clone())
    }

    /// Returns `days` bars after each entry, measured on the series the events
    /// came from.
    pub fn fixed_horizon(&self, series: &Series, events: &[SignalEvent], days: usize) -> ReturnSet {
        let mode = ReturnMode::FixedHorizon { days };
        let bars = series.bars();
        let mut set = ReturnSet::empty(mode);
        for event in events {
            let exit_index = event.entry.bar_index + days;
            let Some(exit_bar) = bars.get(exit_index) else {
                set.excluded += 1;
                continue;
            };
            set.records.push(ReturnRecord {
                symbol: event.symbol.clone(),
                mode,
                entry_date: event.entry.date,
                exit_date: exit_bar.date,
                entry_price: event.entry.price,
                exit_price: exit_bar.close,
                return_pct: percent_change(event.entry.price, exit_bar.close),
                holding_days: (exit_bar.date - event.entry.date).num_days(),
                indicators: self.snapshot(event),
            });
        }
        set
    }

    /// Entry-to-exit returns of paired events. Unpaired events are counted as excluded.
    pub fn pattern_bounded(&self, events: &[SignalEvent]) -> ReturnSet {
        let mode = ReturnMode::PatternBounded;
        let mut set = ReturnSet::empty(mode);
        for event in events {
            let Some(exit) = event.exit.as_ref() else {
                set.excluded += 1;
                continue;
            };
            set.records.push(ReturnRecord {
                symbol: event.symbol.clone(),
                mode,
                entry_date: event.entry.date,
                exit_date: exit.date,
                entry_price: event.entry.price,
                exit_price: exit.price,
                return_pct: percent_change(event.entry.price, exit.price),
                holding_days: (exit.date - event.entry.date).num_days(),
                indicators: self.snapshot(event),
            });
        }
        set
    }

    pub fn compute(&self, mode: ReturnMode, series: &Series, events: &[SignalEvent]) -> ReturnSet {
        match mode {
            ReturnMode::FixedHorizon { days } => self.fixed_horizon(series, events, days),
            ReturnMode::PatternBounded => self.pattern_bounded(events),
        }
    }
}
