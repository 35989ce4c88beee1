//! SignalDetector — one forward pass over a frame, carrying only the previous J.
//!
//! Entry at bar t (t >= 1): close(t) > trend(t), J(t) < 0 and J(t-1) >= 0.
//! Two-phase exit: the first k > t with J(k) >= 0 and J(k-1) < 0. An entry with no
//! exit before the end of the series produces nothing. When a gate is set, the pair
//! is emitted only if J(exit) - J(entry) is strictly above it.
//!
//! The scan re-arms on every qualifying crossing; it never latches on an open
//! pattern. Because J stays negative from an entry until its exit, no second entry
//! can fall inside an unresolved pattern anyway.

use crate::frame::IndicatorFrame;
use crate::strategy::{ConfigError, ExitRule, StrategyVariant};

use super::{EventPoint, SignalEvent};

/// J moved from non-negative (zero included) into negative.
pub fn crosses_below_zero(prev_j: f64, j: f64) -> bool {
    prev_j >= 0.0 && j < 0.0
}

/// J moved from negative back to non-negative.
pub fn crosses_above_zero(prev_j: f64, j: f64) -> bool {
    prev_j < 0.0 && j >= 0.0
}

/// Detector parameterized by a strategy variant. Holds no per-symbol state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDetector {
    trend_window: usize,
    exit: ExitRule,
}

impl SignalDetector {
    pub fn new(variant: &StrategyVariant) -> Self {
        Self {
            trend_window: variant.trend_window,
            exit: variant.exit,
        }
    }

    pub fn trend_window(&self) -> usize {
        self.trend_window
    }

    pub fn exit_rule(&self) -> ExitRule {
        self.exit
    }

    /// Lazy event sequence over one frame. Each call starts from scratch.
    ///
    /// Fails if the frame lacks the trend-filter moving average.
    pub fn events<'f>(&self, frame: &'f IndicatorFrame<'f>) -> Result<EventIter<'f>, ConfigError> {
        let trend = frame
            .sma(self.trend_window)
            .ok_or(ConfigError::MissingTrendColumn(self.trend_window))?;
        Ok(EventIter {
            frame,
            trend,
            exit: self.exit,
            cursor: 0,
            prev_j: None,
        })
    }

    /// Collect every event of one frame, in entry order.
    pub fn detect(&self, frame: &IndicatorFrame<'_>) -> Result<Vec<SignalEvent>, ConfigError> {
        Ok(self.events(frame)?.collect())
    }
}

/// Iterator over one symbol's events. The carried state is the scan position and
/// the previous bar's J.
#[derive(Debug, Clone)]
pub struct EventIter<'f> {
    frame: &'f IndicatorFrame<'f>,
    trend: &'f [f64],
    exit: ExitRule,
    cursor: usize,
    prev_j: Option<f64>,
}

impl<'f> EventIter<'f> {
    fn j(&self, index: usize) -> f64 {
        self.frame.kdj[index].j
    }

    fn is_entry(&self, index: usize, prev_j: f64) -> bool {
        crosses_below_zero(prev_j, self.j(index)) && self.frame.close(index) > self.trend[index]
    }

    /// First bar after `entry` where J crosses back to >= 0.
    fn find_exit(&self, entry: usize) -> Option<usize> {
        (entry + 1..self.frame.len()).find(|&k| crosses_above_zero(self.j(k - 1), self.j(k)))
    }

    fn resolve(&self, entry: usize, prev_j: f64) -> Option<SignalEvent> {
        let symbol = self.frame.symbol();
        match self.exit {
            ExitRule::EntryOnly => Some(SignalEvent::entry_only(
                symbol,
                EventPoint::at(self.frame, entry),
                prev_j,
            )),
            ExitRule::JRecross { min_j_rise } => {
                let Some(exit) = self.find_exit(entry) else {
                    tracing::trace!(symbol, entry = %self.frame.date(entry), "entry without exit dropped");
                    return None;
                };
                let rise = self.j(exit) - self.j(entry);
                if let Some(threshold) = min_j_rise {
                    if rise <= threshold {
                        tracing::debug!(
                            symbol,
                            entry = %self.frame.date(entry),
                            exit = %self.frame.date(exit),
                            rise,
                            threshold,
                            "pattern below J-rise gate"
                        );
                        return None;
                    }
                }
                Some(SignalEvent::paired(
                    symbol,
                    EventPoint::at(self.frame, entry),
                    prev_j,
                    EventPoint::at(self.frame, exit),
                ))
            }
        }
    }
}

impl Iterator for EventIter<'_> {
    type Item = SignalEvent;

    fn next(&mut self) -> Option<SignalEvent> {
        while self.cursor < self.frame.len() {
            let t = self.cursor;
            let j = self.j(t);
            let prev = self.prev_j.replace(j);
            self.cursor += 1;

            let Some(prev_j) = prev else { continue };
            if !self.is_entry(t, prev_j) {
                continue;
            }
            if let Some(event) = self.resolve(t, prev_j) {
                return Some(event);
            }
        }
        None
    }
}
