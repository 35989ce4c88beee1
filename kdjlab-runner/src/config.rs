//! Serializable scan configuration.
//!
//! A `RunConfig` is one TOML document: where the data lives, which strategy
//! variant to run (a preset name or a full inline definition), optional
//! overrides, and where to write the artifacts.
//!
//! ```toml
//! parallel = true
//! output = "out"
//!
//! [data]
//! prices = "data/hs300_stock_data.csv"
//! constituents = "data/hs300_stocks.csv"
//!
//! [strategy]
//! preset = "c"
//!
//! [overrides]
//! trend_filter = 60
//! gate = 60.0
//! ```

use std::path::{Path, PathBuf};

use kdjlab_core::strategy::{ConfigError, StrategyVariant};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("strategy error: {0}")]
    Strategy(#[from] ConfigError),
}

/// Input files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// Daily prices: date, code, open, high, low, close, volume.
    pub prices: PathBuf,
    /// Index constituents: code, code_name. When set, only listed codes are scanned.
    #[serde(default)]
    pub constituents: Option<PathBuf>,
}

/// Strategy selection: a named preset or a complete inline variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StrategySource {
    Preset(String),
    Custom(StrategyVariant),
}

/// Parameters applied on top of the selected variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Overrides {
    /// Trend-filter moving average (20 or 60).
    pub trend_filter: Option<usize>,
    /// Minimum J rise between entry and exit. Makes the variant two-phase.
    pub gate: Option<f64>,
    /// Forward horizons for entry-only variants.
    pub horizons: Option<Vec<usize>>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.trend_filter.is_none() && self.gate.is_none() && self.horizons.is_none()
    }
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub data: DataConfig,
    pub strategy: StrategySource,
    #[serde(default)]
    pub overrides: Overrides,
    /// Artifact directory. Nothing is written when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Fan out over symbols with rayon.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl RunConfig {
    /// Minimal config: a preset over one price file.
    pub fn new(prices: impl Into<PathBuf>, preset: &str) -> Self {
        Self {
            data: DataConfig {
                prices: prices.into(),
                constituents: None,
            },
            strategy: StrategySource::Preset(preset.to_string()),
            overrides: Overrides::default(),
            output: None,
            parallel: true,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file. Relative data and output paths are kept
    /// as written (resolved against the working directory).
    pub fn load(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Build the effective variant: preset or inline definition, then overrides,
    /// then validation. Fails before any data is touched.
    pub fn resolve_variant(&self) -> Result<StrategyVariant, RunConfigError> {
        let mut variant = match &self.strategy {
            StrategySource::Preset(name) => StrategyVariant::preset(name)?,
            StrategySource::Custom(variant) => variant.clone(),
        };
        if let Some(window) = self.overrides.trend_filter {
            variant = variant.with_trend_window(window);
        }
        if let Some(gate) = self.overrides.gate {
            variant = variant.with_gate(Some(gate));
        }
        if let Some(horizons) = &self.overrides.horizons {
            variant = variant.with_horizons(horizons.clone());
        }
        variant.validate()?;
        Ok(variant)
    }
}
