//! Indicator engine.
//!
//! Every indicator is a small forward-only state machine: `update` consumes the
//! next bar of one symbol and returns that bar's value. `compute` resets the
//! state and runs a whole slice, so each call is independent of the last.
//! Values exist from the first bar onwards (partial windows, fixed seeds), so no
//! output is ever NaN for finite input.
//!
//! Indicators never see more than one symbol; the caller owns one instance per
//! series. Multiple indicators are driven together in a single pass by
//! [`crate::frame::IndicatorFrame`].

pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod sma;
pub mod williams;
pub mod window;

pub use bollinger::{Bollinger, BollingerBands, BollingerParams};
pub use ema::{ema_of_series, Ema};
pub use kdj::{Kdj, KdjIndicator, KdjParams, KDJ_SEED};
pub use macd::{Macd, MacdIndicator, MacdParams};
pub use sma::Sma;
pub use williams::{WilliamsR, WILLIAMS_FLAT};
pub use window::RollingWindow;

use crate::domain::Bar;

/// Trait for streaming per-symbol indicators.
///
/// # Look-ahead contamination guard
/// The value returned for bar t may depend only on bars 0..=t. Every indicator
/// must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    type Output: Copy;

    /// Human-readable name (e.g., "ma20", "wr_14").
    fn name(&self) -> &str;

    /// Forget all carried state.
    fn reset(&mut self);

    /// Consume the next bar (in date order) and return its value.
    fn update(&mut self, bar: &Bar) -> Self::Output;

    /// Compute the indicator over a whole series from a fresh state.
    fn compute(&mut self, bars: &[Bar]) -> Vec<Self::Output> {
        self.reset();
        bars.iter().map(|bar| self.update(bar)).collect()
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
