//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window. The first `period - 1`
//! values average whatever bars are available, so the output is never NaN.

use super::window::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    window: RollingWindow,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("ma{period}"),
            window: RollingWindow::new(period),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.window.push(bar.close);
        self.window.mean()
    }
}
