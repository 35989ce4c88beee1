//! KdjLab Core — indicator engine, KDJ reversal detection, forward returns.
//!
//! This crate contains the per-symbol computation:
//! - Domain types (bars, validated series, weekly resampling)
//! - Streaming indicators (MA, KDJ, Williams %R, MACD, Bollinger)
//! - Single-pass indicator frames
//! - J zero-cross signal detector (entry-only or entry/exit pairs with a J-rise gate)
//! - Fixed-horizon and pattern-bounded return calculation
//! - Strategy variants, presets and fingerprints
//!
//! Everything here is pure and in-memory. Symbols never share state, so callers
//! may process them in parallel.

pub mod domain;
pub mod fingerprint;
pub mod frame;
pub mod indicators;
pub mod returns;
pub mod signals;
pub mod strategy;

pub use domain::{Bar, Series, SeriesError};
pub use frame::{IndicatorFrame, IndicatorSnapshot, IndicatorSpec};
pub use returns::{ReturnCalculator, ReturnMode, ReturnRecord, ReturnSet};
pub use signals::{EventPoint, SignalDetector, SignalEvent};
pub use strategy::{ConfigError, ExitRule, StrategyVariant, Timeframe};
