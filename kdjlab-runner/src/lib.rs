//! KDJLab Runner — scan orchestration, statistics, artifacts.
//!
//! This crate builds on `kdjlab-core` to provide:
//! - TOML run configuration with preset selection and overrides
//! - CSV universe loading (prices plus optional constituents)
//! - Per-symbol fan-out of detection and return measurement
//! - Return statistics and Williams %R zone breakdowns
//! - JSON/CSV export and a plain-text report

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{DataConfig, Overrides, RunConfig, RunConfigError, StrategySource};
pub use data_loader::{load_universe, LoadError, LoadOptions, SkippedSymbol, Universe};
pub use export::{
    export_json, export_returns_csv, export_signals_csv, generate_report, import_json,
    load_artifacts, save_artifacts,
};
pub use metrics::{correlations, Correlation, ReturnStats, WrZone, ZoneStats};
pub use runner::{run_from_config, run_scan, RunError, ScanOptions, ScanResult, SCHEMA_VERSION};
