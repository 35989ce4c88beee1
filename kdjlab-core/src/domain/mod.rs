//! Domain types for KDJLab: bars, per-symbol series, weekly resampling.

pub mod bar;
pub mod resample;
pub mod series;

pub use bar::Bar;
pub use resample::{resample_weekly, week_start};
pub use series::{Series, SeriesError};

/// Symbol type alias (exchange code, e.g. "sh.600519").
pub type Symbol = String;
