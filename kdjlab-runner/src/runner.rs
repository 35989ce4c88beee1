//! Scan runner — fans a strategy variant out over every symbol of a universe.
//!
//! Two entry points:
//! - `run_scan()`: takes a loaded universe and a variant. Used by tests and callers
//!   that manage their own data.
//! - `run_from_config()`: resolves the variant, loads the files, then scans. Used by the CLI.
//!
//! Each symbol is processed by exactly one worker (resample, frame, detect,
//! returns); results are merged and sorted after all workers finish.

use std::collections::BTreeMap;

use kdjlab_core::domain::{resample_weekly, Series};
use kdjlab_core::fingerprint::{ConfigHash, DatasetHash};
use kdjlab_core::frame::IndicatorFrame;
use kdjlab_core::returns::{ReturnCalculator, ReturnMode, ReturnSet};
use kdjlab_core::signals::{sort_events, SignalDetector, SignalEvent};
use kdjlab_core::strategy::{ConfigError, StrategyVariant, Timeframe};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{RunConfig, RunConfigError};
use crate::data_loader::{load_universe, LoadError, LoadOptions, SkippedSymbol, Universe};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("run config error: {0}")]
    RunConfig(#[from] RunConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted scan results.
pub const SCHEMA_VERSION: u32 = 1;

/// How to execute a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Fan out over symbols with rayon. Output is identical either way.
    pub parallel: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Complete result of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub variant: StrategyVariant,
    pub variant_fingerprint: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub symbols_scanned: usize,
    /// Bars fed to the indicator engine (after resampling).
    pub bars_scanned: usize,
    pub skipped: Vec<SkippedSymbol>,
    /// Display names of scanned symbols, when known.
    pub names: BTreeMap<String, String>,
    /// Sorted by entry date, then symbol.
    pub events: Vec<SignalEvent>,
    /// One set per return mode of the variant, in mode order.
    pub returns: Vec<ReturnSet>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ScanResult {
    pub fn return_set(&self, mode: ReturnMode) -> Option<&ReturnSet> {
        self.returns.iter().find(|set| set.mode == mode)
    }

    /// Fixed horizons do not apply to two-phase variants.
    pub fn horizons_applicable(&self) -> bool {
        !self.variant.is_two_phase()
    }

    pub fn name_of(&self, symbol: &str) -> Option<&str> {
        self.names.get(symbol).map(String::as_str)
    }
}

/// One worker's output.
#[derive(Debug)]
struct SymbolScan {
    bars: usize,
    events: Vec<SignalEvent>,
    returns: Vec<ReturnSet>,
}

fn scan_symbol(
    series: &Series,
    variant: &StrategyVariant,
    modes: &[ReturnMode],
) -> Result<SymbolScan, ConfigError> {
    let weekly;
    let series = match variant.timeframe {
        Timeframe::Daily => series,
        Timeframe::Weekly => {
            weekly = resample_weekly(series);
            &weekly
        }
    };

    let frame = IndicatorFrame::compute(series, &variant.indicators);
    let events = SignalDetector::new(variant).detect(&frame)?;
    let calculator = ReturnCalculator::new(variant.indicators.has_auxiliary());
    let returns = modes
        .iter()
        .map(|&mode| calculator.compute(mode, series, &events))
        .collect();

    tracing::debug!(
        symbol = series.symbol(),
        bars = series.len(),
        events = events.len(),
        "symbol scanned"
    );
    Ok(SymbolScan {
        bars: series.len(),
        events,
        returns,
    })
}

/// Run `variant` over every series of `universe`.
///
/// The variant is validated first; nothing is computed for an invalid one.
pub fn run_scan(
    universe: &Universe,
    variant: &StrategyVariant,
    options: &ScanOptions,
) -> Result<ScanResult, RunError> {
    variant.validate()?;
    let modes = variant.return_modes();

    tracing::info!(
        variant = %variant.name,
        fingerprint = variant.fingerprint().short(),
        symbols = universe.symbol_count(),
        parallel = options.parallel,
        "scan started"
    );

    let scans: Vec<SymbolScan> = if options.parallel {
        universe
            .series
            .par_iter()
            .map(|series| scan_symbol(series, variant, &modes))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        universe
            .series
            .iter()
            .map(|series| scan_symbol(series, variant, &modes))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut events = Vec::new();
    let mut returns: Vec<ReturnSet> = modes.iter().map(|&m| ReturnSet::empty(m)).collect();
    let mut bars_scanned = 0;
    for scan in scans {
        bars_scanned += scan.bars;
        events.extend(scan.events);
        for (total, set) in returns.iter_mut().zip(scan.returns) {
            total.merge(set);
        }
    }
    sort_events(&mut events);
    returns.iter_mut().for_each(ReturnSet::sort);

    for set in &returns {
        tracing::info!(
            mode = %set.mode,
            records = set.len(),
            excluded = set.excluded,
            "returns computed"
        );
    }
    tracing::info!(events = events.len(), bars = bars_scanned, "scan finished");

    let names = universe
        .series
        .iter()
        .filter_map(|s| {
            universe
                .name_of(s.symbol())
                .map(|name| (s.symbol().to_string(), name.to_string()))
        })
        .collect();

    Ok(ScanResult {
        schema_version: SCHEMA_VERSION,
        variant: variant.clone(),
        variant_fingerprint: variant.fingerprint(),
        dataset_hash: universe.dataset_hash.clone(),
        symbols_scanned: universe.symbol_count(),
        bars_scanned,
        skipped: universe.skipped.clone(),
        names,
        events,
        returns,
    })
}

/// Resolve the variant, load the data files, and scan.
///
/// Configuration problems surface before any file is read.
pub fn run_from_config(config: &RunConfig) -> Result<ScanResult, RunError> {
    let variant = config.resolve_variant()?;
    let universe = load_universe(&LoadOptions {
        prices: config.data.prices.clone(),
        constituents: config.data.constituents.clone(),
    })?;
    run_scan(
        &universe,
        &variant,
        &ScanOptions {
            parallel: config.parallel,
        },
    )
}
