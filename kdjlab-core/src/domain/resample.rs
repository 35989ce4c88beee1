//! Weekly resampling of a daily series.
//!
//! Weeks start on Monday and each weekly bar is labelled with that Monday,
//! whether or not the market traded on it. Aggregation: open = first,
//! high = max, low = min, close = last, volume = sum.

use chrono::{Datelike, Duration, NaiveDate};

use super::{Bar, Series};

/// Monday of the calendar week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Collapse a daily series into one bar per calendar week.
pub fn resample_weekly(series: &Series) -> Series {
    let mut weekly: Vec<Bar> = Vec::new();

    for bar in series.bars() {
        let week = week_start(bar.date);
        match weekly.last_mut() {
            Some(current) if current.date == week => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => weekly.push(Bar {
                symbol: bar.symbol.clone(),
                date: week,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }

    Series::from_validated(series.symbol().to_string(), weekly)
}
