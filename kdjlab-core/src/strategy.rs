//! Strategy variants — one configuration value parameterizing the detector and
//! the return calculation.
//!
//! A variant picks the trend filter, the exit rule (entry-only or J re-cross with
//! an optional magnitude gate), the indicators to compute, the forward horizons,
//! and the bar timeframe. Named presets cover the standard variants; anything
//! else can be written out in TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::ConfigHash;
use crate::frame::IndicatorSpec;
use crate::returns::ReturnMode;

/// Moving-average windows accepted as a trend filter.
pub const SUPPORTED_TREND_WINDOWS: [usize; 2] = [20, 60];

/// Forward horizons (in bars) used when none are configured.
pub const DEFAULT_HORIZONS: [usize; 3] = [5, 10, 30];

/// Configuration problems. Raised before any symbol is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown strategy variant '{0}' (available: {available})", available = preset_names().join(", "))]
    UnknownVariant(String),

    #[error("trend filter ma{0} is not supported (use ma20 or ma60)")]
    UnsupportedTrendWindow(usize),

    #[error("trend filter ma{0} is not among the computed moving averages")]
    MissingTrendColumn(usize),

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("entry-only variant '{0}' needs at least one forward horizon")]
    NoHorizons(String),

    #[error("failed to parse strategy TOML: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Bar granularity fed to the indicator engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    Daily,
    /// Resample to Monday-start calendar weeks first.
    Weekly,
}

/// What happens after an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitRule {
    /// Single-phase: the entry is the event, returns use fixed horizons.
    EntryOnly,
    /// Two-phase: wait for J to cross back to >= 0. With `min_j_rise`, only
    /// emit when J(exit) - J(entry) is strictly greater than it.
    JRecross { min_j_rise: Option<f64> },
}

impl ExitRule {
    pub fn is_two_phase(&self) -> bool {
        matches!(self, Self::JRecross { .. })
    }

    pub fn gate(&self) -> Option<f64> {
        match self {
            Self::EntryOnly => None,
            Self::JRecross { min_j_rise } => *min_j_rise,
        }
    }
}

fn default_horizons() -> Vec<usize> {
    DEFAULT_HORIZONS.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVariant {
    pub name: String,
    #[serde(default)]
    pub timeframe: Timeframe,
    /// Window of the moving average the close must exceed at entry.
    pub trend_window: usize,
    pub exit: ExitRule,
    #[serde(default)]
    pub indicators: IndicatorSpec,
    /// Forward horizons (bars) for entry-only variants.
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,
}

/// Preset names with one-line descriptions.
pub const PRESETS: [(&str, &str); 5] = [
    ("a", "close > MA20, J turns negative; fixed 5/10/30-bar returns with MACD/BOLL/%R snapshot"),
    ("b", "close > MA20, J turns negative then back to >= 0; entry-to-exit return"),
    ("c", "as b, but only when J rises by more than 20 between entry and exit"),
    ("ma60", "close > MA60, J turns negative; fixed 5/10/30-bar returns, MA/KDJ only"),
    ("weekly", "as b on weekly bars (Monday-start weeks), MA/KDJ only"),
];

/// All preset names in declaration order.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

impl StrategyVariant {
    /// Look up a named preset (case-insensitive).
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let variant = match name.to_ascii_lowercase().as_str() {
            "a" => Self {
                name: "a".into(),
                timeframe: Timeframe::Daily,
                trend_window: 20,
                exit: ExitRule::EntryOnly,
                indicators: IndicatorSpec::default(),
                horizons: default_horizons(),
            },
            "b" => Self {
                name: "b".into(),
                timeframe: Timeframe::Daily,
                trend_window: 20,
                exit: ExitRule::JRecross { min_j_rise: None },
                indicators: IndicatorSpec::default(),
                horizons: default_horizons(),
            },
            "c" => Self {
                name: "c".into(),
                exit: ExitRule::JRecross {
                    min_j_rise: Some(20.0),
                },
                ..Self::preset("b")?
            },
            "ma60" => Self {
                name: "ma60".into(),
                timeframe: Timeframe::Daily,
                trend_window: 60,
                exit: ExitRule::EntryOnly,
                indicators: IndicatorSpec::minimal(),
                horizons: default_horizons(),
            },
            "weekly" => Self {
                name: "weekly".into(),
                timeframe: Timeframe::Weekly,
                trend_window: 20,
                exit: ExitRule::JRecross { min_j_rise: None },
                indicators: IndicatorSpec::minimal(),
                horizons: default_horizons(),
            },
            _ => return Err(ConfigError::UnknownVariant(name.to_string())),
        };
        Ok(variant)
    }

    /// Parse a full variant from TOML and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let variant: Self = toml::from_str(content)?;
        variant.validate()?;
        Ok(variant)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Switch the trend filter, adding the moving average if it is not computed yet.
    pub fn with_trend_window(mut self, window: usize) -> Self {
        self.trend_window = window;
        if !self.indicators.sma_windows.contains(&window) {
            self.indicators.sma_windows.push(window);
        }
        self
    }

    /// Set (or clear) the J-rise gate. Turns an entry-only variant into a two-phase one.
    pub fn with_gate(mut self, min_j_rise: Option<f64>) -> Self {
        self.exit = ExitRule::JRecross { min_j_rise };
        self
    }

    pub fn with_horizons(mut self, horizons: Vec<usize>) -> Self {
        self.horizons = horizons;
        self
    }

    pub fn is_two_phase(&self) -> bool {
        self.exit.is_two_phase()
    }

    /// Return sets this variant produces: one per horizon when entry-only,
    /// the entry-to-exit set when two-phase (horizons do not apply there).
    pub fn return_modes(&self) -> Vec<ReturnMode> {
        if self.is_two_phase() {
            vec![ReturnMode::PatternBounded]
        } else {
            self.horizons
                .iter()
                .map(|&days| ReturnMode::FixedHorizon { days })
                .collect()
        }
    }

    /// Deterministic identity of every parameter of this variant.
    pub fn fingerprint(&self) -> ConfigHash {
        // serde_json preserves declaration order and BTreeMap key order
        let json = serde_json::to_string(self).expect("StrategyVariant must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }

    /// Fail fast on anything that would make per-symbol processing meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_TREND_WINDOWS.contains(&self.trend_window) {
            return Err(ConfigError::UnsupportedTrendWindow(self.trend_window));
        }
        if !self.indicators.sma_windows.contains(&self.trend_window) {
            return Err(ConfigError::MissingTrendColumn(self.trend_window));
        }

        let spec = &self.indicators;
        let mut windows: Vec<(&str, usize)> = Vec::new();
        windows.extend(spec.sma_windows.iter().map(|&w| ("sma_window", w)));
        windows.extend(spec.williams_periods.iter().map(|&p| ("williams_period", p)));
        windows.push(("kdj.n", spec.kdj.n));
        windows.push(("kdj.k_period", spec.kdj.k_period));
        windows.push(("kdj.d_period", spec.kdj.d_period));
        if let Some(macd) = spec.macd {
            windows.push(("macd.fast", macd.fast));
            windows.push(("macd.slow", macd.slow));
            windows.push(("macd.signal", macd.signal));
        }
        if let Some(boll) = spec.bollinger {
            windows.push(("bollinger.window", boll.window));
            if !boll.k.is_finite() || boll.k < 0.0 {
                return Err(invalid("bollinger.k", boll.k, "must be finite and >= 0"));
            }
        }
        if let Some((name, value)) = windows.into_iter().find(|(_, v)| *v == 0) {
            return Err(invalid(name, value, "must be >= 1"));
        }

        if let Some(gate) = self.exit.gate() {
            if !gate.is_finite() {
                return Err(invalid("min_j_rise", gate, "must be finite"));
            }
        }

        if !self.is_two_phase() {
            if self.horizons.is_empty() {
                return Err(ConfigError::NoHorizons(self.name.clone()));
            }
            if self.horizons.contains(&0) {
                return Err(invalid("horizon", 0, "must be >= 1"));
            }
        }

        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
