//! Signal events — J reversal patterns detected on one symbol's indicator frame.
//!
//! An event always has an entry (J crosses from >= 0 into negative territory while
//! the close is above the trend filter). Two-phase variants pair it with the first
//! later bar where J crosses back to >= 0.

pub mod detector;

pub use detector::{crosses_above_zero, crosses_below_zero, EventIter, SignalDetector};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frame::{IndicatorFrame, IndicatorSnapshot};

/// One side of an event: where it happened and what the indicators read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPoint {
    /// Position in the symbol's (possibly resampled) series.
    pub bar_index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub indicators: IndicatorSnapshot,
}

impl EventPoint {
    pub fn at(frame: &IndicatorFrame<'_>, index: usize) -> Self {
        Self {
            bar_index: index,
            date: frame.date(index),
            price: frame.close(index),
            indicators: frame.snapshot(index),
        }
    }

    pub fn j(&self) -> f64 {
        self.indicators.kdj.j
    }
}

/// A detected entry, plus its exit for two-phase variants. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub entry: EventPoint,
    /// J on the bar before entry (always >= 0).
    pub prev_j: f64,
    pub exit: Option<EventPoint>,
    /// Calendar days from entry to exit.
    pub holding_days: Option<i64>,
    /// J(exit) - J(entry).
    pub j_rise: Option<f64>,
}

impl SignalEvent {
    pub fn entry_only(symbol: impl Into<String>, entry: EventPoint, prev_j: f64) -> Self {
        Self {
            symbol: symbol.into(),
            entry,
            prev_j,
            exit: None,
            holding_days: None,
            j_rise: None,
        }
    }

    pub fn paired(symbol: impl Into<String>, entry: EventPoint, prev_j: f64, exit: EventPoint) -> Self {
        let holding_days = (exit.date - entry.date).num_days();
        let j_rise = exit.j() - entry.j();
        Self {
            symbol: symbol.into(),
            entry,
            prev_j,
            exit: Some(exit),
            holding_days: Some(holding_days),
            j_rise: Some(j_rise),
        }
    }

    pub fn is_paired(&self) -> bool {
        self.exit.is_some()
    }
}

/// Order events by entry date, then symbol.
pub fn sort_events(events: &mut [SignalEvent]) {
    events.sort_by(|a, b| {
        a.entry
            .date
            .cmp(&b.entry.date)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}
