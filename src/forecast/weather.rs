//! Weather synthesis
//!
//! The forecaster has no live weather feed. Hourly weather is synthesized
//! from seasonal and diurnal sine curves plus bounded uniform noise so that
//! the PV model receives physically plausible inputs.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::solar::{daylight_phase, is_daylight};

const PEAK_RADIATION_W_M2: f64 = 800.0;
const BASE_TEMPERATURE_C: f64 = 20.0;
const SEASONAL_TEMPERATURE_AMPLITUDE: f64 = 10.0;
const DIURNAL_TEMPERATURE_AMPLITUDE: f64 = 5.0;
const BASE_HUMIDITY_PERCENT: f64 = 50.0;
const SEASONAL_HUMIDITY_AMPLITUDE: f64 = 20.0;
const MIN_HUMIDITY_PERCENT: f64 = 20.0;
const MAX_HUMIDITY_PERCENT: f64 = 90.0;
const BASE_WIND_SPEED_MS: f64 = 3.0;
const BASE_PRESSURE_HPA: f64 = 1013.0;

/// One hour of (synthesized or supplied) weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Global radiation (W/m²), 0 outside the daylight window
    pub radiation: f64,
    /// Air temperature (Celsius)
    pub temperature: f64,
    /// Relative humidity (%), within [20, 90]
    pub humidity: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Air pressure (hPa)
    pub pressure: f64,
    /// Sunshine proxy, radiation / 10
    pub sunshine: f64,
}

/// Generates [`WeatherSample`]s from (hour, day of year).
///
/// Randomness is drawn from the caller's RNG in a fixed order (radiation,
/// temperature, humidity, wind, pressure), so a seeded RNG reproduces the
/// same weather.
#[derive(Debug, Clone)]
pub struct WeatherSynthesizer {
    radiation_noise: Uniform<f64>,
    temperature_noise: Uniform<f64>,
    humidity_noise: Uniform<f64>,
    wind_noise: Uniform<f64>,
    pressure_noise: Uniform<f64>,
}

impl Default for WeatherSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherSynthesizer {
    pub fn new() -> Self {
        Self {
            radiation_noise: Uniform::new(-50.0, 50.0),
            temperature_noise: Uniform::new(-2.0, 2.0),
            humidity_noise: Uniform::new(-10.0, 10.0),
            wind_noise: Uniform::new(-1.0, 2.0),
            pressure_noise: Uniform::new(-10.0, 10.0),
        }
    }

    /// Synthesize weather for `hour` (0-23) on `day_of_year` (1-366)
    pub fn sample<R: Rng + ?Sized>(&self, hour: u32, day_of_year: u32, rng: &mut R) -> WeatherSample {
        let (radiation, sunshine) = if is_daylight(hour) {
            let arch = PEAK_RADIATION_W_M2 * daylight_phase(hour).sin();
            let radiation = (arch + self.radiation_noise.sample(rng)).max(0.0);
            (radiation, radiation / 10.0)
        } else {
            (0.0, 0.0)
        };

        let season = (2.0 * PI * f64::from(day_of_year) / 365.0).sin();

        let temperature = BASE_TEMPERATURE_C
            + SEASONAL_TEMPERATURE_AMPLITUDE * season
            + DIURNAL_TEMPERATURE_AMPLITUDE * daylight_phase(hour).sin()
            + self.temperature_noise.sample(rng);

        let humidity = (BASE_HUMIDITY_PERCENT
            + SEASONAL_HUMIDITY_AMPLITUDE * season
            + self.humidity_noise.sample(rng))
        .clamp(MIN_HUMIDITY_PERCENT, MAX_HUMIDITY_PERCENT);

        let wind_speed = (BASE_WIND_SPEED_MS + self.wind_noise.sample(rng)).max(0.0);
        let pressure = BASE_PRESSURE_HPA + self.pressure_noise.sample(rng);

        WeatherSample {
            radiation,
            temperature,
            humidity,
            wind_speed,
            pressure,
            sunshine,
        }
    }
}
