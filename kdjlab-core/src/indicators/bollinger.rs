//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, window)
//! - Upper: middle + k * stddev(close, window)
//! - Lower: middle - k * stddev(close, window)
//!
//! Uses the sample stddev (divide by N - 1) over a partial window at the start.
//! A single-observation window has zero width.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub window: usize,
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self { window: 20, k: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    k: f64,
    name: String,
    window: RollingWindow,
}

impl Bollinger {
    pub fn new(params: BollingerParams) -> Self {
        assert!(params.window >= 1, "Bollinger window must be >= 1");
        Self {
            k: params.k,
            name: format!("boll_{}_{}", params.window, params.k),
            window: RollingWindow::new(params.window),
        }
    }
}

impl Indicator for Bollinger {
    type Output = BollingerBands;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn update(&mut self, bar: &Bar) -> BollingerBands {
        self.window.push(bar.close);
        let mid = self.window.mean();
        let width = self.k * self.window.sample_std();
        BollingerBands {
            mid,
            upper: mid + width,
            lower: mid - width,
        }
    }
}
