//! Series — the date-ordered bar history of exactly one symbol.
//!
//! Every recursive indicator assumes chronological order with no gaps in index
//! position, so ordering is checked once here and relied upon everywhere else.
//! Calendar gaps (weekends, suspensions) are fine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;

/// Why a bar list was rejected as a `Series`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar for '{found}' on {date} does not belong to series '{expected}'")]
    SymbolMismatch {
        expected: String,
        found: String,
        date: chrono::NaiveDate,
    },

    #[error("'{symbol}': bar dated {date} does not follow {previous} (dates must be strictly increasing)")]
    OutOfOrder {
        symbol: String,
        previous: chrono::NaiveDate,
        date: chrono::NaiveDate,
    },

    #[error("'{symbol}': bar on {date} has non-finite OHLCV values")]
    NonFinite {
        symbol: String,
        date: chrono::NaiveDate,
    },

    #[error("'{symbol}': bar on {date} fails OHLC sanity (high < low, price outside range, or close <= 0)")]
    Insane {
        symbol: String,
        date: chrono::NaiveDate,
    },
}

/// Validated, chronologically ordered bars for one symbol.
///
/// Immutable once built: indicator frames borrow it, they never modify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series, checking symbol consistency, strict date order, finiteness
    /// and OHLC sanity (see [`Bar::is_sane`]).
    ///
    /// An empty bar list is a valid (empty) series.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        let mut previous: Option<chrono::NaiveDate> = None;

        for bar in &bars {
            if bar.symbol != symbol {
                return Err(SeriesError::SymbolMismatch {
                    expected: symbol,
                    found: bar.symbol.clone(),
                    date: bar.date,
                });
            }
            if bar.is_void() {
                return Err(SeriesError::NonFinite {
                    symbol,
                    date: bar.date,
                });
            }
            if !bar.is_sane() {
                return Err(SeriesError::Insane {
                    symbol,
                    date: bar.date,
                });
            }
            if let Some(prev) = previous {
                if bar.date <= prev {
                    return Err(SeriesError::OutOfOrder {
                        symbol,
                        previous: prev,
                        date: bar.date,
                    });
                }
            }
            previous = Some(bar.date);
        }

        Ok(Self { symbol, bars })
    }

    /// Bars already known to be ordered and finite (e.g. produced by resampling a valid series).
    pub(crate) fn from_validated(symbol: String, bars: Vec<Bar>) -> Self {
        Self { symbol, bars }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
