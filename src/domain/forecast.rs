use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::round2;

/// One hour of forecast, keyed by `timestamp`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: NaiveDateTime,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Expected PV generation (W), never negative
    pub pv_power: f64,
    /// Expected household draw (W), never below 150
    pub consumption: f64,
    /// `max(0, pv_power - consumption)`
    pub surplus: f64,
    /// `max(0, consumption - pv_power)`
    pub deficit: f64,
    /// Battery state of charge (%)
    pub battery_soc: f64,
}

impl ForecastRow {
    /// Build a row from already clamped predictions.
    ///
    /// Surplus and deficit are derived before rounding so that they do not
    /// inherit the rounding error of both inputs.
    pub fn from_predictions(
        timestamp: NaiveDateTime,
        hour: u32,
        pv_power: f64,
        consumption: f64,
        battery_soc: f64,
    ) -> Self {
        Self {
            timestamp,
            hour,
            pv_power: round2(pv_power),
            consumption: round2(consumption),
            surplus: round2((pv_power - consumption).max(0.0)),
            deficit: round2((consumption - pv_power).max(0.0)),
            battery_soc,
        }
    }
}

/// Values that only live on the current-state row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotExtras {
    /// Grid exchange (W), integral by convention
    pub grid_power: i64,
    /// Overall system efficiency (%)
    pub system_efficiency: f64,
}

/// The single "now" row shown by the dashboard: the first hour of the
/// latest run plus the snapshot extras
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    #[serde(flatten)]
    pub row: ForecastRow,
    #[serde(flatten)]
    pub extras: SnapshotExtras,
}

/// Averages over the most recent stored forecast hours
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub avg_pv_power: f64,
    pub avg_consumption: f64,
    pub avg_surplus: f64,
    pub avg_deficit: f64,
    /// Number of rows the averages cover
    pub samples: u32,
    /// From the current snapshot, `None` before the first run
    pub system_efficiency: Option<f64>,
}
