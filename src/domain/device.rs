//! Device events reported by the embedded controller

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    Off,
}

/// A validated state report, ready to append
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device_name: String,
    pub status: DeviceStatus,
    /// Draw at the time of the report (W)
    pub power_consumption: f64,
    pub timestamp: NaiveDateTime,
}

impl DeviceEvent {
    pub fn new(
        device_name: &str,
        status: DeviceStatus,
        power_consumption: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let device_name = device_name.trim();
        if device_name.is_empty() {
            return Err(ValidationError::EmptyDeviceName);
        }
        if !power_consumption.is_finite() || power_consumption < 0.0 {
            return Err(ValidationError::InvalidPower(power_consumption));
        }
        Ok(Self {
            device_name: device_name.to_string(),
            status,
            power_consumption,
            timestamp,
        })
    }
}

/// Latest known state of one device; same shape as the event that set it
pub type DeviceState = DeviceEvent;
