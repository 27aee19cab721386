use chrono::NaiveDateTime;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use super::clamp_limit;
use crate::domain::{
    format_timestamp, parse_timestamp, round2, AggregateStats, CurrentSnapshot, ForecastRow,
    SnapshotExtras,
};
use crate::error::PersistenceError;

/// `predictions` table row as stored
#[derive(Debug, Clone, FromRow)]
struct PredictionRecord {
    timestamp: String,
    hour: i64,
    pv_power: f64,
    consumption: f64,
    surplus: f64,
    deficit: f64,
    battery_soc: f64,
}

impl TryFrom<PredictionRecord> for ForecastRow {
    type Error = PersistenceError;

    fn try_from(rec: PredictionRecord) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&rec.timestamp).map_err(|e| {
            PersistenceError::CorruptRow(format!("timestamp `{}`: {e}", rec.timestamp))
        })?;
        let hour = u32::try_from(rec.hour)
            .ok()
            .filter(|h| *h < 24)
            .ok_or_else(|| PersistenceError::CorruptRow(format!("hour {}", rec.hour)))?;

        Ok(Self {
            timestamp,
            hour,
            pv_power: rec.pv_power,
            consumption: rec.consumption,
            surplus: rec.surplus,
            deficit: rec.deficit,
            battery_soc: rec.battery_soc,
        })
    }
}

/// `current_data` row as stored
#[derive(Debug, Clone, FromRow)]
struct SnapshotRecord {
    #[sqlx(flatten)]
    row: PredictionRecord,
    grid_power: i64,
    system_efficiency: f64,
}

impl TryFrom<SnapshotRecord> for CurrentSnapshot {
    type Error = PersistenceError;

    fn try_from(rec: SnapshotRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            row: rec.row.try_into()?,
            extras: SnapshotExtras {
                grid_power: rec.grid_power,
                system_efficiency: rec.system_efficiency,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRecord {
    samples: i64,
    avg_pv_power: f64,
    avg_consumption: f64,
    avg_surplus: f64,
    avg_deficit: f64,
    system_efficiency: Option<f64>,
}

/// Writes forecast batches together with the current snapshot
pub struct ForecastWriter<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ForecastWriter<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace `rows` by timestamp and overwrite the snapshot from
    /// the first row, all in one transaction.
    ///
    /// Returns the number of rows written. An empty batch touches nothing.
    pub async fn upsert(
        &self,
        rows: &[ForecastRow],
        extras: SnapshotExtras,
    ) -> Result<usize, PersistenceError> {
        let Some(first) = rows.first() else {
            debug!("Empty forecast batch, nothing to store");
            return Ok(0);
        };

        // Dropping the transaction on error rolls it back
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO predictions
                    (timestamp, hour, pv_power, consumption, surplus, deficit, battery_soc)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(timestamp) DO UPDATE SET
                    hour = excluded.hour,
                    pv_power = excluded.pv_power,
                    consumption = excluded.consumption,
                    surplus = excluded.surplus,
                    deficit = excluded.deficit,
                    battery_soc = excluded.battery_soc
                "#,
            )
            .bind(format_timestamp(row.timestamp))
            .bind(i64::from(row.hour))
            .bind(row.pv_power)
            .bind(row.consumption)
            .bind(row.surplus)
            .bind(row.deficit)
            .bind(row.battery_soc)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO current_data
                (id, timestamp, hour, pv_power, consumption, surplus, deficit,
                 battery_soc, grid_power, system_efficiency)
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                timestamp = excluded.timestamp,
                hour = excluded.hour,
                pv_power = excluded.pv_power,
                consumption = excluded.consumption,
                surplus = excluded.surplus,
                deficit = excluded.deficit,
                battery_soc = excluded.battery_soc,
                grid_power = excluded.grid_power,
                system_efficiency = excluded.system_efficiency
            "#,
        )
        .bind(format_timestamp(first.timestamp))
        .bind(i64::from(first.hour))
        .bind(first.pv_power)
        .bind(first.consumption)
        .bind(first.surplus)
        .bind(first.deficit)
        .bind(first.battery_soc)
        .bind(extras.grid_power)
        .bind(extras.system_efficiency)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            rows = rows.len(),
            first = %first.timestamp,
            "Stored forecast batch"
        );
        Ok(rows.len())
    }
}

/// Bounded read queries over stored forecasts
pub struct ForecastReader<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ForecastReader<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The snapshot written by the latest run, if any run has completed
    pub async fn current(&self) -> Result<Option<CurrentSnapshot>, PersistenceError> {
        let record = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            SELECT timestamp, hour, pv_power, consumption, surplus, deficit,
                   battery_soc, grid_power, system_efficiency
            FROM current_data
            WHERE id = 1
            "#,
        )
        .fetch_optional(self.pool)
        .await?;

        record.map(CurrentSnapshot::try_from).transpose()
    }

    /// Up to `limit` rows at or after `from`, oldest first
    pub async fn next_rows(
        &self,
        from: NaiveDateTime,
        limit: u32,
    ) -> Result<Vec<ForecastRow>, PersistenceError> {
        let records = sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT timestamp, hour, pv_power, consumption, surplus, deficit, battery_soc
            FROM predictions
            WHERE timestamp >= ?
            ORDER BY timestamp ASC
            LIMIT ?
            "#,
        )
        .bind(format_timestamp(from))
        .bind(i64::from(clamp_limit(limit)))
        .fetch_all(self.pool)
        .await?;

        records.into_iter().map(ForecastRow::try_from).collect()
    }

    /// The `limit` latest rows, newest first
    pub async fn recent_rows(&self, limit: u32) -> Result<Vec<ForecastRow>, PersistenceError> {
        let records = sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT timestamp, hour, pv_power, consumption, surplus, deficit, battery_soc
            FROM predictions
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(clamp_limit(limit)))
        .fetch_all(self.pool)
        .await?;

        records.into_iter().map(ForecastRow::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, PersistenceError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM predictions")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Averages over the `window` latest rows; zeros when nothing is stored.
    ///
    /// The snapshot efficiency is read in the same statement, so both halves
    /// of the reply come from one committed run.
    pub async fn aggregate_stats(&self, window: u32) -> Result<AggregateStats, PersistenceError> {
        let stats = sqlx::query_as::<_, StatsRecord>(
            r#"
            SELECT COUNT(*) AS samples,
                   COALESCE(AVG(pv_power), 0.0) AS avg_pv_power,
                   COALESCE(AVG(consumption), 0.0) AS avg_consumption,
                   COALESCE(AVG(surplus), 0.0) AS avg_surplus,
                   COALESCE(AVG(deficit), 0.0) AS avg_deficit,
                   (SELECT system_efficiency FROM current_data WHERE id = 1)
                       AS system_efficiency
            FROM (
                SELECT pv_power, consumption, surplus, deficit
                FROM predictions
                ORDER BY timestamp DESC
                LIMIT ?
            )
            "#,
        )
        .bind(i64::from(clamp_limit(window)))
        .fetch_one(self.pool)
        .await?;

        Ok(AggregateStats {
            avg_pv_power: round2(stats.avg_pv_power),
            avg_consumption: round2(stats.avg_consumption),
            avg_surplus: round2(stats.avg_surplus),
            avg_deficit: round2(stats.avg_deficit),
            samples: u32::try_from(stats.samples).unwrap_or(u32::MAX),
            system_efficiency: stats.system_efficiency,
        })
    }
}
