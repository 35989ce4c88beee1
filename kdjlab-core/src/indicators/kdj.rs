//! KDJ stochastic oscillator.
//!
//! RSV[t] = (close[t] - min(low, n)) / (max(high, n) - min(low, n)) * 100
//! K[0] = D[0] = 50
//! K[t] = ((k_period - 1) * K[t-1] + RSV[t]) / k_period
//! D[t] = ((d_period - 1) * D[t-1] + K[t]) / d_period
//! J[t] = 3K[t] - 2D[t]
//!
//! The high/low window is partial at the start of the series. A flat window
//! (max high == min low) yields RSV = 50, the same neutral value as the seed.
//! J is deliberately unbounded: it overshoots below 0 and above 100.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

/// Seed for K and D on the first bar, also the flat-window RSV.
pub const KDJ_SEED: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdjParams {
    /// RSV lookback.
    pub n: usize,
    /// K smoothing period.
    pub k_period: usize,
    /// D smoothing period.
    pub d_period: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            n: 9,
            k_period: 3,
            d_period: 3,
        }
    }
}

/// One bar's oscillator triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl Kdj {
    pub fn from_kd(k: f64, d: f64) -> Self {
        Self {
            k,
            d,
            j: 3.0 * k - 2.0 * d,
        }
    }
}

/// Raw stochastic value of `close` within `[low, high]`, with the flat-range fallback.
pub fn rsv(close: f64, lowest: f64, highest: f64) -> f64 {
    let range = highest - lowest;
    if range > 0.0 {
        (close - lowest) / range * 100.0
    } else {
        KDJ_SEED
    }
}

/// Smoothing carry between bars.
#[derive(Debug, Clone, Copy)]
struct KdCarry {
    k: f64,
    d: f64,
}

#[derive(Debug, Clone)]
pub struct KdjIndicator {
    params: KdjParams,
    name: String,
    lows: RollingWindow,
    highs: RollingWindow,
    carry: Option<KdCarry>,
}

impl KdjIndicator {
    pub fn new(params: KdjParams) -> Self {
        assert!(params.n >= 1, "KDJ n must be >= 1");
        assert!(params.k_period >= 1, "KDJ k_period must be >= 1");
        assert!(params.d_period >= 1, "KDJ d_period must be >= 1");
        Self {
            params,
            name: format!("kdj_{}_{}_{}", params.n, params.k_period, params.d_period),
            lows: RollingWindow::new(params.n),
            highs: RollingWindow::new(params.n),
            carry: None,
        }
    }

    pub fn params(&self) -> KdjParams {
        self.params
    }
}

impl Indicator for KdjIndicator {
    type Output = Kdj;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.lows.clear();
        self.highs.clear();
        self.carry = None;
    }

    fn update(&mut self, bar: &Bar) -> Kdj {
        self.lows.push(bar.low);
        self.highs.push(bar.high);

        let next = match self.carry {
            None => KdCarry {
                k: KDJ_SEED,
                d: KDJ_SEED,
            },
            Some(prev) => {
                let rsv = rsv(bar.close, self.lows.min(), self.highs.max());
                let kp = self.params.k_period as f64;
                let dp = self.params.d_period as f64;
                let k = ((kp - 1.0) * prev.k + rsv) / kp;
                let d = ((dp - 1.0) * prev.d + k) / dp;
                KdCarry { k, d }
            }
        };
        self.carry = Some(next);
        Kdj::from_kd(next.k, next.d)
    }
}
