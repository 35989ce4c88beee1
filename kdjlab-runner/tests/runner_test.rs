//! File-to-artifact pipeline: CSV inputs and TOML config on disk, scan, export, reload.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use kdjlab_core::returns::ReturnMode;
use kdjlab_runner::{
    generate_report, load_artifacts, run_from_config, save_artifacts, LoadError, RunConfig,
    RunError,
};

const DIPPER: &str = "sh.600000";
const RISER: &str = "sz.000001";
const UNLISTED: &str = "sz.000002";

/// 70 rising closes with a two-day dip at bars 50 and 51.
fn dip_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..70).map(|i| 10.0 + i as f64 * 10.0 / 69.0).collect();
    closes[50] -= 2.0;
    closes[51] -= 2.2;
    closes
}

fn rising_closes() -> Vec<f64> {
    (0..70).map(|i| 5.0 + i as f64 * 0.1).collect()
}

fn append_rows(out: &mut String, code: &str, closes: &[f64]) {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    for (i, &close) in closes.iter().enumerate() {
        let open = if i == 0 { close } else { closes[i - 1] };
        let date = base + chrono::Duration::days(i as i64);
        writeln!(
            out,
            "{date},{code},{open},{},{},{close},1000",
            open.max(close) + 0.05,
            open.min(close) - 0.05
        )
        .unwrap();
    }
}

fn write_inputs(dir: &Path) {
    let mut prices = String::from("date,code,open,high,low,close,volume\n");
    append_rows(&mut prices, RISER, &rising_closes());
    append_rows(&mut prices, DIPPER, &dip_closes());
    append_rows(&mut prices, UNLISTED, &dip_closes());
    std::fs::write(dir.join("prices.csv"), prices).unwrap();

    let constituents = format!(
        "updateDate,code,code_name\n2024-01-01,{DIPPER},浦发银行\n2024-01-01,{RISER},平安银行\n"
    );
    std::fs::write(dir.join("hs300.csv"), constituents).unwrap();
}

fn write_config(dir: &Path, strategy: &str) -> RunConfig {
    let text = format!(
        r#"
output = "{out}"

[data]
prices = "{prices}"
constituents = "{constituents}"

{strategy}
"#,
        out = dir.join("out").display(),
        prices = dir.join("prices.csv").display(),
        constituents = dir.join("hs300.csv").display(),
    );
    let path = dir.join("run.toml");
    std::fs::write(&path, text).unwrap();
    RunConfig::load(&path).unwrap()
}

#[test]
fn pattern_scan_from_files() {
    let tmp = tempfile::tempdir().unwrap();
    write_inputs(tmp.path());
    let config = write_config(
        tmp.path(),
        "[strategy]\npreset = \"b\"\n\n[overrides]\ntrend_filter = 60",
    );

    let result = run_from_config(&config).unwrap();
    assert_eq!(result.symbols_scanned, 2);
    assert_eq!(result.bars_scanned, 140);
    assert_eq!(result.variant.trend_window, 60);

    assert_eq!(result.events.len(), 1);
    let event = &result.events[0];
    assert_eq!(event.symbol, DIPPER);
    assert_eq!(event.entry.date, NaiveDate::from_ymd_opt(2024, 2, 22).unwrap());
    assert_eq!(event.holding_days, Some(1));

    let set = result.return_set(ReturnMode::PatternBounded).unwrap();
    assert_eq!(set.len(), 1);
    assert!(set.records[0].return_pct > 0.0);
    assert!(!result.horizons_applicable());
    assert_eq!(result.name_of(DIPPER), Some("浦发银行"));
}

#[test]
fn artifacts_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    write_inputs(tmp.path());
    let config = write_config(
        tmp.path(),
        "[strategy]\npreset = \"b\"\n\n[overrides]\ntrend_filter = 60",
    );
    let result = run_from_config(&config).unwrap();

    let out = config.output.clone().unwrap();
    let written = save_artifacts(&result, &out).unwrap();
    assert_eq!(written.len(), 3);
    assert!(out.join("scan.json").exists());
    assert!(out.join("returns_pattern.csv").exists());

    let signals = std::fs::read_to_string(out.join("signals.csv")).unwrap();
    let mut lines = signals.lines();
    assert!(lines.next().unwrap().starts_with("symbol,name,entry_date,entry_price"));
    assert!(lines.next().unwrap().starts_with("sh.600000,浦发银行,2024-02-22,"));
    assert!(lines.next().is_none());

    let reloaded = load_artifacts(&out).unwrap();
    assert_eq!(reloaded.variant, result.variant);
    assert_eq!(reloaded.dataset_hash, result.dataset_hash);
    assert_eq!(reloaded.events.len(), 1);
}

#[test]
fn horizon_scan_excludes_short_tails() {
    let tmp = tempfile::tempdir().unwrap();
    write_inputs(tmp.path());
    let config = write_config(tmp.path(), "[strategy]\npreset = \"ma60\"");
    let result = run_from_config(&config).unwrap();

    assert_eq!(result.events.len(), 1);
    let counts: Vec<(usize, usize)> = result
        .returns
        .iter()
        .map(|set| (set.len(), set.excluded))
        .collect();
    assert_eq!(counts, vec![(1, 0), (1, 0), (0, 1)]);

    let report = generate_report(&result);
    assert!(report.contains("total signals: 1"));
    assert!(report.contains("2024-02"));
}

#[test]
fn dataset_hash_is_stable_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    write_inputs(tmp.path());
    let config = write_config(tmp.path(), "[strategy]\npreset = \"a\"");
    let first = run_from_config(&config).unwrap();
    let second = run_from_config(&config).unwrap();
    assert_eq!(first.dataset_hash, second.dataset_hash);
    assert_eq!(first.variant_fingerprint, second.variant_fingerprint);
}

#[test]
fn missing_price_file_is_reported() {
    let config = RunConfig::new("/nonexistent/prices.csv", "a");
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::NotFound(_))));
}

#[test]
fn bad_preset_fails_before_reading_data() {
    // the price path does not exist; the preset error must win
    let config = RunConfig::new("/nonexistent/prices.csv", "zzz");
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::RunConfig(_)));
}
