use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "HEF__";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub models: ModelsConfig,
    #[validate(nested)]
    pub db: DbConfig,
    #[validate(nested)]
    pub forecast: ForecastConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ModelsConfig {
    pub pv_path: PathBuf,
    pub consumption_path: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            pv_path: PathBuf::from("models/pv_model.json"),
            consumption_path: PathBuf::from("models/consumption_model.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DbConfig {
    #[validate(length(min = 1))]
    pub url: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/energy.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ForecastConfig {
    /// Hours per run
    #[validate(range(min = 1, max = 168))]
    pub horizon_hours: u32,
    /// Fixed RNG seed; entropy when unset
    pub seed: Option<u64>,
    /// State of charge written on every row (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub battery_soc: f64,
    /// Grid exchange written on the snapshot (W)
    pub grid_power: i64,
    /// System efficiency written on the snapshot (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub system_efficiency: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_hours: 24,
            seed: None,
            battery_soc: 70.0,
            grid_power: 0,
            system_efficiency: 92.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

impl Config {
    /// Layer `path` (or [`DEFAULT_CONFIG_PATH`]) under `HEF__` environment
    /// variables, then validate. A missing file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate().context("Invalid configuration")?;
        Ok(cfg)
    }
}
