//! KDJLab CLI — run reversal scans and inspect strategy presets.
//!
//! Commands:
//! - `run` — scan a price file with a TOML config or a named preset
//! - `presets` — list presets, or print one as TOML

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kdjlab_core::strategy::{StrategyVariant, PRESETS};
use kdjlab_runner::{generate_report, run_from_config, save_artifacts, RunConfig};

#[derive(Parser)]
#[command(
    name = "kdjlab",
    about = "KDJLab CLI — KDJ oversold-reversal scanner for daily equity data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a price file from a TOML config file or a named preset.
    Run {
        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset (see `kdjlab presets`).
        #[arg(long)]
        preset: Option<String>,

        /// Daily price CSV (required with --preset, overrides the config's path).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Constituents CSV; only listed codes are scanned.
        #[arg(long)]
        constituents: Option<PathBuf>,

        /// Trend-filter moving average: 20 or 60.
        #[arg(long)]
        trend_filter: Option<usize>,

        /// Minimum J rise between entry and exit (makes the variant two-phase).
        #[arg(long)]
        gate: Option<f64>,

        /// Forward horizons in bars, comma-separated (e.g. 5,10,30).
        #[arg(long, value_delimiter = ',')]
        horizons: Option<Vec<usize>>,

        /// Artifact directory for scan.json and the CSV exports.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Process symbols one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// List strategy presets.
    Presets {
        /// Print this preset as a TOML variant definition.
        #[arg(long)]
        show: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            preset,
            prices,
            constituents,
            trend_filter,
            gate,
            horizons,
            output,
            sequential,
        } => {
            let mut run_config = build_run_config(config, preset, prices)?;
            if constituents.is_some() {
                run_config.data.constituents = constituents;
            }
            if trend_filter.is_some() {
                run_config.overrides.trend_filter = trend_filter;
            }
            if gate.is_some() {
                run_config.overrides.gate = gate;
            }
            if horizons.is_some() {
                run_config.overrides.horizons = horizons;
            }
            if output.is_some() {
                run_config.output = output;
            }
            if sequential {
                run_config.parallel = false;
            }
            run_scan_cmd(&run_config)
        }
        Commands::Presets { show } => run_presets(show.as_deref()),
    }
}

fn build_run_config(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    prices: Option<PathBuf>,
) -> Result<RunConfig> {
    match (config_path, preset_name) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (None, None) => bail!("one of --config or --preset is required"),
        (Some(path), None) => {
            let mut config = RunConfig::load(&path)?;
            if let Some(prices) = prices {
                config.data.prices = prices;
            }
            Ok(config)
        }
        (None, Some(name)) => {
            let Some(prices) = prices else {
                bail!("--prices is required with --preset");
            };
            Ok(RunConfig::new(prices, &name))
        }
    }
}

fn run_scan_cmd(config: &RunConfig) -> Result<()> {
    // surface strategy mistakes before touching the data files
    let variant = config.resolve_variant()?;
    tracing::info!(
        variant = %variant.name,
        fingerprint = %variant.fingerprint().short(),
        prices = %config.data.prices.display(),
        "resolved strategy"
    );

    let result = run_from_config(config)?;
    println!();
    print!("{}", generate_report(&result));

    if let Some(dir) = &config.output {
        save_artifacts(&result, dir)?;
        println!();
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn run_presets(show: Option<&str>) -> Result<()> {
    if let Some(name) = show {
        let variant = StrategyVariant::preset(name)?;
        print!("{}", variant.to_toml()?);
        return Ok(());
    }

    println!("{:<8} {}", "Preset", "Description");
    println!("{}", "-".repeat(60));
    for (name, description) in PRESETS {
        println!("{name:<8} {description}");
    }
    Ok(())
}
