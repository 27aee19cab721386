use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::domain::{format_timestamp, parse_timestamp, DeviceEvent, DeviceState, DeviceStatus};
use crate::error::PersistenceError;

#[derive(Debug, Clone, FromRow)]
struct DeviceRecord {
    device_name: String,
    status: String,
    power_consumption: f64,
    timestamp: String,
}

impl TryFrom<DeviceRecord> for DeviceState {
    type Error = PersistenceError;

    fn try_from(rec: DeviceRecord) -> Result<Self, Self::Error> {
        let status = DeviceStatus::from_str(&rec.status)
            .map_err(|_| PersistenceError::CorruptRow(format!("device status `{}`", rec.status)))?;
        let timestamp = parse_timestamp(&rec.timestamp).map_err(|e| {
            PersistenceError::CorruptRow(format!("timestamp `{}`: {e}", rec.timestamp))
        })?;
        Ok(Self {
            device_name: rec.device_name,
            status,
            power_consumption: rec.power_consumption,
            timestamp,
        })
    }
}

/// Append-only device event log
pub struct DeviceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DeviceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, event: &DeviceEvent) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO devices (device_name, status, power_consumption, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.device_name)
        .bind(event.status.to_string())
        .bind(event.power_consumption)
        .bind(format_timestamp(event.timestamp))
        .execute(self.pool)
        .await?;

        debug!(
            device = %event.device_name,
            status = %event.status,
            power = event.power_consumption,
            "Recorded device event"
        );
        Ok(result.last_insert_rowid())
    }

    /// Latest event per device, ordered by device name
    pub async fn latest_states(&self) -> Result<Vec<DeviceState>, PersistenceError> {
        let records = sqlx::query_as::<_, DeviceRecord>(
            r#"
            SELECT d.device_name, d.status, d.power_consumption, d.timestamp
            FROM devices d
            WHERE d.id = (
                SELECT latest.id
                FROM devices latest
                WHERE latest.device_name = d.device_name
                ORDER BY latest.timestamp DESC, latest.id DESC
                LIMIT 1
            )
            ORDER BY d.device_name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        records.into_iter().map(DeviceState::try_from).collect()
    }
}
