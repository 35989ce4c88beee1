//! MACD trend-following oscillator.
//!
//! DIF = EMA(close, fast) - EMA(close, slow)
//! DEA = EMA(DIF, signal)
//! histogram = 2 * (DIF - DEA)
//!
//! All three EMAs use the adjust=false recursion seeded with the first value.

use serde::{Deserialize, Serialize};

use super::ema::Ema;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct MacdIndicator {
    name: String,
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl MacdIndicator {
    pub fn new(params: MacdParams) -> Self {
        Self {
            name: format!("macd_{}_{}_{}", params.fast, params.slow, params.signal),
            fast: Ema::new(params.fast),
            slow: Ema::new(params.slow),
            signal: Ema::new(params.signal),
        }
    }
}

impl Indicator for MacdIndicator {
    type Output = Macd;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
    }

    fn update(&mut self, bar: &Bar) -> Macd {
        let dif = self.fast.step(bar.close) - self.slow.step(bar.close);
        let dea = self.signal.step(dif);
        Macd {
            dif,
            dea,
            histogram: 2.0 * (dif - dea),
        }
    }
}
