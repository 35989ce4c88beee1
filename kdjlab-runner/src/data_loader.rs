//! Universe loading for the runner.
//!
//! Reads a long-format daily price CSV (one row per code and date) and an
//! optional constituents CSV carrying display names. Implements the cleaning
//! policy:
//! 1. Rows are ordered by (code, date); the first of duplicate (code, date) rows wins
//! 2. With a constituents file, only listed codes are kept
//! 3. Each code becomes a validated `Series`; a code whose bars fail validation
//!    is skipped and recorded, never fatal
//!
//! Missing files and unparsable rows are errors.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use kdjlab_core::domain::{Bar, Series};
use kdjlab_core::fingerprint::DatasetHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV {source_name}{}: {message}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Csv {
        source_name: String,
        line: Option<u64>,
        message: String,
    },
}

impl LoadError {
    fn csv(source_name: &str, err: csv::Error) -> Self {
        Self::Csv {
            source_name: source_name.to_string(),
            line: err.position().map(|p| p.line()),
            message: err.to_string(),
        }
    }
}

/// Input files.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub prices: PathBuf,
    pub constituents: Option<PathBuf>,
}

/// One row of the price file. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    code: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    /// Suspended days may leave volume blank.
    #[serde(default)]
    volume: Option<f64>,
}

impl From<PriceRow> for Bar {
    fn from(row: PriceRow) -> Self {
        Bar {
            symbol: row.code,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConstituentRow {
    code: String,
    code_name: String,
}

/// A symbol left out of the scan, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// All series of a scan, ordered by symbol, plus load provenance.
#[derive(Debug, Clone)]
pub struct Universe {
    pub series: Vec<Series>,
    /// Display names from the constituents file (empty without one).
    pub names: BTreeMap<String, String>,
    pub skipped: Vec<SkippedSymbol>,
    /// Rows dropped as repeated (code, date) pairs.
    pub duplicate_rows: usize,
    /// BLAKE3 over every kept bar.
    pub dataset_hash: DatasetHash,
}

impl Universe {
    /// Group bars into per-symbol series.
    ///
    /// With `names`, symbols missing from it are dropped (inner join).
    pub fn from_bars(mut bars: Vec<Bar>, names: Option<BTreeMap<String, String>>) -> Self {
        // stable: among equal (code, date) the earliest row stays first
        bars.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));

        let before = bars.len();
        bars.dedup_by(|later, earlier| later.symbol == earlier.symbol && later.date == earlier.date);
        let duplicate_rows = before - bars.len();
        if duplicate_rows > 0 {
            tracing::warn!(duplicate_rows, "dropped repeated (code, date) rows");
        }

        let mut grouped: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        for bar in bars {
            grouped.entry(bar.symbol.clone()).or_default().push(bar);
        }

        if let Some(names) = &names {
            let before = grouped.len();
            grouped.retain(|symbol, _| names.contains_key(symbol));
            tracing::info!(
                kept = grouped.len(),
                dropped = before - grouped.len(),
                "joined prices with constituents"
            );
        }

        let mut series = Vec::with_capacity(grouped.len());
        let mut skipped = Vec::new();
        for (symbol, bars) in grouped {
            match Series::new(symbol.clone(), bars) {
                Ok(s) => series.push(s),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
                    skipped.push(SkippedSymbol {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let dataset_hash = DatasetHash::of_series(&series);
        Self {
            series,
            names: names.unwrap_or_default(),
            skipped,
            duplicate_rows,
            dataset_hash,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn bar_count(&self) -> usize {
        self.series.iter().map(Series::len).sum()
    }

    pub fn name_of(&self, symbol: &str) -> Option<&str> {
        self.names.get(symbol).map(String::as_str)
    }
}

/// Parse price rows from any reader. `source_name` labels errors.
pub fn read_prices<R: Read>(reader: R, source_name: &str) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<PriceRow>()
        .map(|row| row.map(Bar::from).map_err(|e| LoadError::csv(source_name, e)))
        .collect()
}

/// Parse constituents (code → name) from any reader.
pub fn read_constituents<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<BTreeMap<String, String>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut names = BTreeMap::new();
    for row in rdr.deserialize::<ConstituentRow>() {
        let row = row.map_err(|e| LoadError::csv(source_name, e))?;
        names.entry(row.code).or_insert(row.code_name);
    }
    Ok(names)
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the scan universe from disk.
pub fn load_universe(opts: &LoadOptions) -> Result<Universe, LoadError> {
    let names = match &opts.constituents {
        Some(path) => {
            let names = read_constituents(open(path)?, &path.display().to_string())?;
            tracing::info!(path = %path.display(), constituents = names.len(), "loaded constituents");
            Some(names)
        }
        None => None,
    };

    let bars = read_prices(open(&opts.prices)?, &opts.prices.display().to_string())?;
    tracing::info!(path = %opts.prices.display(), rows = bars.len(), "loaded prices");

    let universe = Universe::from_bars(bars, names);
    tracing::info!(
        symbols = universe.symbol_count(),
        bars = universe.bar_count(),
        skipped = universe.skipped.len(),
        dataset = %universe.dataset_hash,
        "universe ready"
    );
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: &str = "\
date,code,open,high,low,close,volume,amount
2024-01-03,sh.600000,10.1,10.4,10.0,10.3,1200,0
2024-01-02,sh.600000,10.0,10.2,9.9,10.1,1000,0
2024-01-02,sz.000001,8.0,8.1,7.9,8.05,500,0
2024-01-02,sh.600000,99.0,99.0,99.0,99.0,1,0
";

    #[test]
    fn groups_sorts_and_dedups() {
        let bars = read_prices(PRICES.as_bytes(), "prices").unwrap();
        assert_eq!(bars.len(), 4);
        let u = Universe::from_bars(bars, None);
        assert_eq!(u.symbol_count(), 2);
        assert_eq!(u.duplicate_rows, 1);

        let s = &u.series[0];
        assert_eq!(s.symbol(), "sh.600000");
        assert_eq!(s.len(), 2);
        // first occurrence of 2024-01-02 kept
        assert_eq!(s.bars()[0].close, 10.1);
        assert_eq!(s.bars()[1].close, 10.3);
        assert_eq!(u.bar_count(), 3);
    }

    #[test]
    fn constituents_inner_join() {
        let names = read_constituents(
            "updateDate,code,code_name\n2024-01-01,sz.000001,平安银行\n".as_bytes(),
            "hs300",
        )
        .unwrap();
        let bars = read_prices(PRICES.as_bytes(), "prices").unwrap();
        let u = Universe::from_bars(bars, Some(names));
        assert_eq!(u.symbol_count(), 1);
        assert_eq!(u.series[0].symbol(), "sz.000001");
        assert_eq!(u.name_of("sz.000001"), Some("平安银行"));
    }

    #[test]
    fn invalid_symbol_is_skipped() {
        let text = "\
date,code,open,high,low,close,volume
2024-01-02,A,1,1,1,NaN,1
2024-01-02,B,1,1,1,1,1
";
        let bars = read_prices(text.as_bytes(), "prices").unwrap();
        let u = Universe::from_bars(bars, None);
        assert_eq!(u.symbol_count(), 1);
        assert_eq!(u.skipped.len(), 1);
        assert_eq!(u.skipped[0].symbol, "A");
    }

    #[test]
    fn symbol_with_insane_bars_is_skipped() {
        let text = "\
date,code,open,high,low,close,volume
2024-01-02,A,11,10,12,11,1
2024-01-03,A,5,5,6,0,1
2024-01-04,A,1,1,2,-3,1
2024-01-02,B,10,10.5,9.5,10.2,1
";
        let bars = read_prices(text.as_bytes(), "prices").unwrap();
        let u = Universe::from_bars(bars, None);
        assert_eq!(u.symbol_count(), 1);
        assert_eq!(u.series[0].symbol(), "B");
        assert_eq!(u.skipped.len(), 1);
        assert_eq!(u.skipped[0].symbol, "A");
        assert!(u.skipped[0].reason.contains("sanity"));
    }

    #[test]
    fn blank_volume_reads_as_zero() {
        let text = "date,code,open,high,low,close,volume\n2024-01-02,A,1,1,1,1,\n";
        let bars = read_prices(text.as_bytes(), "prices").unwrap();
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn malformed_row_reports_line() {
        let text = "date,code,open,high,low,close,volume\n2024-01-02,A,x,1,1,1,1\n";
        let err = read_prices(text.as_bytes(), "prices").unwrap_err();
        match err {
            LoadError::Csv { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let opts = LoadOptions {
            prices: PathBuf::from("/nonexistent/prices.csv"),
            constituents: None,
        };
        assert!(matches!(load_universe(&opts), Err(LoadError::NotFound(_))));
    }
}
