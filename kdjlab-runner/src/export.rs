//! Reporting and export — JSON, CSV, and plain-text artifact generation.
//!
//! Provides three export formats for scan results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: signal list and one return table per mode
//! - **Text**: the summary printed by the CLI
//!
//! Values are rounded to two decimals here and nowhere earlier.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use kdjlab_core::frame::IndicatorSnapshot;
use kdjlab_core::returns::{percent_change, ReturnMode, ReturnSet};

use crate::metrics::{correlations, monthly_counts, round2, zone_breakdown, ReturnStats};
use crate::runner::{ScanResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ScanResult` to pretty JSON.
pub fn export_json(result: &ScanResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize ScanResult to JSON")
}

/// Deserialize a `ScanResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScanResult> {
    let result: ScanResult =
        serde_json::from_str(json).context("failed to deserialize ScanResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn fmt2(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Indicator column names of a snapshot, e.g. `entry_ma20`, `entry_wr14`.
fn snapshot_header(prefix: &str, snap: &IndicatorSnapshot) -> Vec<String> {
    let mut cols: Vec<String> = snap.sma.keys().map(|w| format!("{prefix}_ma{w}")).collect();
    cols.extend(snap.williams.keys().map(|p| format!("{prefix}_wr{p}")));
    if snap.macd.is_some() {
        cols.extend(["dif", "dea", "macd"].map(|c| format!("{prefix}_{c}")));
    }
    if snap.bollinger.is_some() {
        cols.extend(["boll_mid", "boll_upper", "boll_lower"].map(|c| format!("{prefix}_{c}")));
    }
    cols
}

fn snapshot_values(snap: &IndicatorSnapshot) -> Vec<String> {
    let mut vals: Vec<String> = snap.sma.values().map(|&v| fmt2(v)).collect();
    vals.extend(snap.williams.values().map(|&v| fmt2(v)));
    if let Some(m) = snap.macd {
        vals.extend([m.dif, m.dea, m.histogram].map(|v| format!("{v:.4}")));
    }
    if let Some(b) = snap.bollinger {
        vals.extend([b.mid, b.upper, b.lower].map(fmt2));
    }
    vals
}

/// Export every detected event, one row each.
///
/// Columns: symbol, name, entry_date, entry_price, exit_date, exit_price,
/// return_pct, prev_j, entry_j, exit_j, j_rise, holding_days, one
/// `return_<label>` column per fixed horizon (blank when the event was excluded),
/// then the entry (and, for two-phase variants, exit) indicator snapshot columns.
pub fn export_signals_csv(result: &ScanResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = [
        "symbol",
        "name",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "return_pct",
        "prev_j",
        "entry_j",
        "exit_j",
        "j_rise",
        "holding_days",
    ]
    .map(String::from)
    .to_vec();

    let mut horizon_returns: Vec<HashMap<(&str, NaiveDate), f64>> = Vec::new();
    for set in &result.returns {
        if let ReturnMode::FixedHorizon { .. } = set.mode {
            header.push(format!("return_{}", set.mode.label()));
            horizon_returns.push(
                set.records
                    .iter()
                    .map(|r| ((r.symbol.as_str(), r.entry_date), r.return_pct))
                    .collect(),
            );
        }
    }

    // every event of a scan carries the same indicator set
    let template = result.events.first().map(|e| &e.entry.indicators);
    let entry_cols = template.map(|s| snapshot_header("entry", s)).unwrap_or_default();
    let exit_cols = if result.variant.is_two_phase() {
        template.map(|s| snapshot_header("exit", s)).unwrap_or_default()
    } else {
        Vec::new()
    };
    header.extend(entry_cols);
    header.extend(exit_cols.iter().cloned());
    wtr.write_record(&header)?;

    for e in &result.events {
        let exit = e.exit.as_ref();
        let mut row = vec![
            e.symbol.clone(),
            result.name_of(&e.symbol).unwrap_or("").to_string(),
            e.entry.date.to_string(),
            fmt2(e.entry.price),
            exit.map(|x| x.date.to_string()).unwrap_or_default(),
            exit.map(|x| fmt2(x.price)).unwrap_or_default(),
            exit.map(|x| fmt2(percent_change(e.entry.price, x.price)))
                .unwrap_or_default(),
            fmt2(e.prev_j),
            fmt2(e.entry.j()),
            exit.map(|x| fmt2(x.j())).unwrap_or_default(),
            e.j_rise.map(fmt2).unwrap_or_default(),
            e.holding_days.map(|d| d.to_string()).unwrap_or_default(),
        ];
        row.extend(horizon_returns.iter().map(|lookup| {
            lookup
                .get(&(e.symbol.as_str(), e.entry.date))
                .map(|&r| fmt2(r))
                .unwrap_or_default()
        }));
        row.extend(snapshot_values(&e.entry.indicators));
        if !exit_cols.is_empty() {
            match exit {
                Some(x) => row.extend(snapshot_values(&x.indicators)),
                None => row.extend(std::iter::repeat(String::new()).take(exit_cols.len())),
            }
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export one return set.
///
/// Columns: symbol, name, entry_date, exit_date, entry_price, exit_price,
/// return_pct, holding_days.
pub fn export_returns_csv(set: &ReturnSet, result: &ScanResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "name",
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "return_pct",
        "holding_days",
    ])?;
    for r in &set.records {
        wtr.write_record([
            r.symbol.as_str(),
            result.name_of(&r.symbol).unwrap_or(""),
            &r.entry_date.to_string(),
            &r.exit_date.to_string(),
            &fmt2(r.entry_price),
            &fmt2(r.exit_price),
            &fmt2(r.return_pct),
            &r.holding_days.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set of a scan into `output_dir`:
/// - `scan.json` — the full `ScanResult`
/// - `signals.csv` — one row per event
/// - `returns_<mode>.csv` — one file per return set (`returns_5d.csv`, `returns_pattern.csv`)
///
/// Returns the paths written.
pub fn save_artifacts(result: &ScanResult, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    let mut write = |name: String, content: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    write("scan.json".into(), export_json(result)?)?;
    write("signals.csv".into(), export_signals_csv(result)?)?;
    for set in &result.returns {
        write(
            format!("returns_{}.csv", set.mode.label()),
            export_returns_csv(set, result)?,
        )?;
    }

    tracing::info!(dir = %output_dir.display(), files = written.len(), "artifacts saved");
    Ok(written)
}

/// Load a `ScanResult` from an artifact directory's scan.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<ScanResult> {
    let path = dir.join("scan.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Text report ────────────────────────────────────────────────────

/// Human-readable summary: totals, per-mode statistics, %R zones, monthly counts.
pub fn generate_report(result: &ScanResult) -> String {
    let mut out = String::with_capacity(2048);
    let v = &result.variant;

    let _ = writeln!(out, "=== Scan: variant '{}' ===", v.name);
    let _ = writeln!(
        out,
        "trend filter ma{} | {:?} bars | {}",
        v.trend_window,
        v.timeframe,
        match v.exit.gate() {
            Some(g) if v.is_two_phase() => format!("J re-cross, rise > {g}"),
            _ if v.is_two_phase() => "J re-cross".to_string(),
            _ => "entry only".to_string(),
        }
    );
    let _ = writeln!(out, "fingerprint {}", result.variant_fingerprint.short());
    let _ = writeln!(out, "dataset     {}", result.dataset_hash);
    let _ = writeln!(
        out,
        "symbols {} | bars {} | skipped {}",
        result.symbols_scanned,
        result.bars_scanned,
        result.skipped.len()
    );
    let _ = writeln!(out, "total signals: {}", result.events.len());
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<24} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "returns", "count", "excluded", "mean%", "median%", "win%", "std%", "hold d"
    );
    for set in &result.returns {
        let s = ReturnStats::compute(set);
        let _ = writeln!(
            out,
            "{:<24} {:>6} {:>8} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            set.mode.to_string(),
            s.count,
            s.excluded,
            round2(s.mean),
            round2(s.median),
            round2(s.win_rate * 100.0),
            round2(s.std_dev),
            round2(s.mean_holding_days),
        );
    }
    if !result.horizons_applicable() {
        let _ = writeln!(out, "{:<24} not applicable", "fixed horizons");
    }

    let periods = &v.indicators.williams_periods;
    if let Some(set) = result.returns.first().filter(|_| !periods.is_empty()) {
        out.push('\n');
        let _ = writeln!(out, "--- {} by entry %R zone ---", set.mode);
        for &period in periods {
            for z in zone_breakdown(set, period) {
                let _ = writeln!(
                    out,
                    "wr{:<3} {:<20} {:>6} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                    period,
                    z.zone.label(),
                    z.count,
                    round2(z.mean),
                    round2(z.median),
                    round2(z.std_dev),
                    round2(z.mean_holding_days),
                );
            }
        }
    }

    let corr = correlations(&result.events);
    if !corr.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "--- correlation with entry-to-exit return ---");
        for c in &corr {
            let _ = writeln!(out, "{:<12} {:>6} {:>8.2}", c.factor, c.count, round2(c.coefficient));
        }
    }

    let monthly = monthly_counts(&result.events);
    if !monthly.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "--- signals per month ---");
        for (month, count) in monthly {
            let _ = writeln!(out, "{month} {count:>5}");
        }
    }

    if !result.skipped.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "--- skipped symbols ---");
        for s in &result.skipped {
            let _ = writeln!(out, "{}: {}", s.symbol, s.reason);
        }
    }

    out
}
