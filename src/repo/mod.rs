//! Forecast persistence on SQLite
//!
//! [`ForecastStore`] owns the pool and the schema; typed repositories borrow
//! the pool for the duration of a call.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::error::PersistenceError;

pub mod devices;
pub mod forecasts;

pub use devices::DeviceRepository;
pub use forecasts::{ForecastReader, ForecastWriter};

/// Largest number of rows any read returns (one week of hours)
pub const MAX_READ_LIMIT: u32 = 168;

/// Clamp a requested row count to `[1, MAX_READ_LIMIT]`
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_READ_LIMIT)
}

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS predictions (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp    TEXT NOT NULL UNIQUE,
        hour         INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
        pv_power     REAL NOT NULL CHECK (pv_power >= 0),
        consumption  REAL NOT NULL CHECK (consumption >= 150),
        surplus      REAL NOT NULL CHECK (surplus >= 0),
        deficit      REAL NOT NULL CHECK (deficit >= 0),
        battery_soc  REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS current_data (
        id                 INTEGER PRIMARY KEY CHECK (id = 1),
        timestamp          TEXT NOT NULL,
        hour               INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
        pv_power           REAL NOT NULL CHECK (pv_power >= 0),
        consumption        REAL NOT NULL CHECK (consumption >= 150),
        surplus            REAL NOT NULL CHECK (surplus >= 0),
        deficit            REAL NOT NULL CHECK (deficit >= 0),
        battery_soc        REAL NOT NULL,
        grid_power         INTEGER NOT NULL,
        system_efficiency  REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS devices (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        device_name        TEXT NOT NULL CHECK (length(device_name) > 0),
        status             TEXT NOT NULL CHECK (status IN ('on', 'off')),
        power_consumption  REAL NOT NULL CHECK (power_consumption >= 0),
        timestamp          TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_predictions_timestamp ON predictions(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_devices_name_time ON devices(device_name, timestamp DESC)",
];

/// Handle on the forecast database
#[derive(Debug, Clone)]
pub struct ForecastStore {
    pool: SqlitePool,
}

impl ForecastStore {
    /// Open (creating if needed) the database at `url` and ensure the schema
    pub async fn connect(url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if let Some(parent) = options
            .get_filename()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self::from_pool(pool).await?;
        info!(url, "Opened forecast store");
        Ok(store)
    }

    /// Private in-memory database; lives as long as the store
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        // Every connection to :memory: is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PersistenceError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn writer(&self) -> ForecastWriter<'_> {
        ForecastWriter::new(&self.pool)
    }

    pub fn reader(&self) -> ForecastReader<'_> {
        ForecastReader::new(&self.pool)
    }

    pub fn devices(&self) -> DeviceRepository<'_> {
        DeviceRepository::new(&self.pool)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
