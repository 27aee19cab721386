use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use home_energy_forecast::config::Config;
use home_energy_forecast::domain::{parse_timestamp, SnapshotExtras};
use home_energy_forecast::forecast::{
    schema_coverage, ForecastEngine, CONSUMPTION_FEATURES, PV_FEATURES,
};
use home_energy_forecast::ml::ModelHandle;
use home_energy_forecast::repo::ForecastStore;
use home_energy_forecast::{serving, telemetry};
use itertools::Itertools;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use validator::Validate;

#[derive(Parser)]
#[command(name = "home-energy-forecast")]
#[command(about = "Hourly PV and household consumption forecasts from pre-trained models", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); defaults to config/default.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one forecast and store it
    Run {
        /// First hour to forecast, "YYYY-MM-DD HH:MM:SS" (default: now)
        #[arg(long, value_parser = parse_anchor)]
        anchor: Option<NaiveDateTime>,

        /// Override the configured horizon (1-168)
        #[arg(long)]
        horizon: Option<u32>,

        /// Override the configured RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the rows instead of storing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Describe the configured model artifacts
    Inspect,

    /// Print stored forecast data
    Show {
        /// Number of upcoming hours to print
        #[arg(short, long, default_value_t = 24)]
        limit: u32,

        /// Also print averages over the latest `limit` hours
        #[arg(long)]
        stats: bool,

        /// Also print the latest state of every device
        #[arg(long)]
        devices: bool,
    },
}

fn parse_anchor(raw: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(raw).map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {e}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load(cli.config.as_deref())?;
    telemetry::init_tracing(&cfg.logging);

    match cli.command {
        Command::Run {
            anchor,
            horizon,
            seed,
            dry_run,
        } => run(cfg, anchor, horizon, seed, dry_run).await,
        Command::Inspect => inspect(&cfg),
        Command::Show {
            limit,
            stats,
            devices,
        } => show(&cfg, limit, stats, devices).await,
    }
}

fn load_model(path: &Path, what: &str) -> Result<ModelHandle> {
    let handle = ModelHandle::load(path)
        .with_context(|| format!("Failed to load {what} model from {}", path.display()))?;
    info!(model = what, summary = %handle.describe(), "Loaded model");
    Ok(handle)
}

async fn run(
    mut cfg: Config,
    anchor: Option<NaiveDateTime>,
    horizon: Option<u32>,
    seed: Option<u64>,
    dry_run: bool,
) -> Result<()> {
    if let Some(horizon) = horizon {
        cfg.forecast.horizon_hours = horizon;
    }
    if seed.is_some() {
        cfg.forecast.seed = seed;
    }
    cfg.validate().context("Invalid command line overrides")?;

    let pv = load_model(&cfg.models.pv_path, "pv")?;
    let consumption = load_model(&cfg.models.consumption_path, "consumption")?;
    let engine = ForecastEngine::new(pv, consumption, &cfg.forecast);

    let anchor = anchor.unwrap_or_else(|| Local::now().naive_local());
    let run = engine.run(anchor);

    if run.summary.failures() > 0 {
        warn!(
            failures = run.summary.failures(),
            first_error = run.summary.first_error.as_deref().unwrap_or_default(),
            "Forecast run used fallback values"
        );
    }

    if dry_run {
        print_json(&run)?;
        return Ok(());
    }

    let store = ForecastStore::connect(&cfg.db.url)
        .await
        .with_context(|| format!("Failed to open database {}", cfg.db.url))?;
    let extras = SnapshotExtras {
        grid_power: cfg.forecast.grid_power,
        system_efficiency: cfg.forecast.system_efficiency,
    };
    let written = store
        .writer()
        .upsert(&run.rows, extras)
        .await
        .context("Failed to store forecast")?;
    store.close().await;

    println!(
        "stored {written} hours (pv ok {}/{}, consumption ok {}/{})",
        run.summary.pv_ok, run.summary.steps, run.summary.consumption_ok, run.summary.steps
    );
    Ok(())
}

fn inspect(cfg: &Config) -> Result<()> {
    let targets: [(&str, &Path, &[&str]); 2] = [
        ("pv", cfg.models.pv_path.as_path(), &PV_FEATURES[..]),
        (
            "consumption",
            cfg.models.consumption_path.as_path(),
            &CONSUMPTION_FEATURES[..],
        ),
    ];

    for (what, path, schema) in targets {
        let handle = load_model(path, what)?;
        println!("{what}: {}", handle.describe());
        println!("  artifact: {}", path.display());

        match handle.feature_order() {
            Some(order) => {
                let missing = schema_coverage(order, schema);
                if missing.is_empty() {
                    println!("  all {} declared features are produced", order.len());
                } else {
                    println!(
                        "  {} declared features are never produced: {}",
                        missing.len(),
                        missing.iter().join(", ")
                    );
                }
            }
            None => println!("  uses the natural order of {} features", schema.len()),
        }
    }
    Ok(())
}

async fn show(cfg: &Config, limit: u32, stats: bool, devices: bool) -> Result<()> {
    let store = ForecastStore::connect(&cfg.db.url)
        .await
        .with_context(|| format!("Failed to open database {}", cfg.db.url))?;
    let now = Local::now().naive_local();

    print_json(&serving::read_current(&store).await?)?;
    print_json(&serving::read_forecast(&store, now, limit).await?)?;
    if stats {
        print_json(&serving::read_aggregate_stats(&store, limit).await?)?;
    }
    if devices {
        print_json(&serving::read_device_states(&store).await?)?;
    }

    store.close().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
