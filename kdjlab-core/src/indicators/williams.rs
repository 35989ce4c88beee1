//! Williams %R momentum oscillator.
//!
//! WR[t] = (max(high, period) - close[t]) / (max(high, period) - min(low, period)) * -100
//!
//! Ranges from 0 (close at the window high) to -100 (close at the window low).
//! Partial window at the start; a flat window yields -50, the midpoint.

use super::window::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

/// %R reported when the window has no high/low range.
pub const WILLIAMS_FLAT: f64 = -50.0;

#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
    name: String,
    lows: RollingWindow,
    highs: RollingWindow,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Williams %R period must be >= 1");
        Self {
            period,
            name: format!("wr_{period}"),
            lows: RollingWindow::new(period),
            highs: RollingWindow::new(period),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for WilliamsR {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.lows.clear();
        self.highs.clear();
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.lows.push(bar.low);
        self.highs.push(bar.high);
        let highest = self.highs.max();
        let range = highest - self.lows.min();
        if range > 0.0 {
            (highest - bar.close) / range * -100.0
        } else {
            WILLIAMS_FLAT
        }
    }
}
