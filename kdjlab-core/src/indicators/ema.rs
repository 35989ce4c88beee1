//! Exponential Moving Average (EMA), recursive "adjust = false" form.
//!
//! EMA[0] = value[0]
//! EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1],  alpha = 2 / (span + 1)
//!
//! Defined from the first observation, no warmup.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    alpha: f64,
    name: String,
    prev: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            alpha: 2.0 / (span as f64 + 1.0),
            name: format!("ema_{span}"),
            prev: None,
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Advance the recursion by one arbitrary value (used for EMA-of-DIF).
    pub fn step(&mut self, value: f64) -> f64 {
        let ema = match self.prev {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.prev = Some(ema);
        ema
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.prev = None;
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.step(bar.close)
    }
}

/// EMA of an arbitrary value slice, same recursion as [`Ema`].
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Ema::new(span);
    values.iter().map(|&v| ema.step(v)).collect()
}
