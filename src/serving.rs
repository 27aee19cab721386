//! Query surface for the dashboard and the embedded controller.
//!
//! These are plain async functions over a [`ForecastStore`]; request
//! framing and routing live outside this crate.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{
    truncate_to_hour, AggregateStats, CurrentSnapshot, DeviceEvent, DeviceState, DeviceStatus,
    ForecastRow,
};
use crate::error::ServingError;
use crate::repo::ForecastStore;

/// Result of [`read_current`]; "no data" is a normal answer before the first run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum CurrentReading {
    Available(CurrentSnapshot),
    NoData,
}

pub async fn read_current(store: &ForecastStore) -> Result<CurrentReading, ServingError> {
    Ok(match store.reader().current().await? {
        Some(snapshot) => CurrentReading::Available(snapshot),
        None => CurrentReading::NoData,
    })
}

/// Up to `limit` (1-168) hours starting with the hour containing `now`
pub async fn read_forecast(
    store: &ForecastStore,
    now: NaiveDateTime,
    limit: u32,
) -> Result<Vec<ForecastRow>, ServingError> {
    Ok(store
        .reader()
        .next_rows(truncate_to_hour(now), limit)
        .await?)
}

/// Validate and append one device report; returns the stored event
pub async fn record_device_event(
    store: &ForecastStore,
    device_name: &str,
    status: DeviceStatus,
    power_consumption: f64,
    now: NaiveDateTime,
) -> Result<DeviceEvent, ServingError> {
    let event = DeviceEvent::new(device_name, status, power_consumption, now)?;
    store.devices().record(&event).await?;
    Ok(event)
}

pub async fn read_device_states(store: &ForecastStore) -> Result<Vec<DeviceState>, ServingError> {
    Ok(store.devices().latest_states().await?)
}

pub async fn read_aggregate_stats(
    store: &ForecastStore,
    window: u32,
) -> Result<AggregateStats, ServingError> {
    Ok(store.reader().aggregate_stats(window).await?)
}
