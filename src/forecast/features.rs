//! Feature engineering for the PV and consumption models
//!
//! Each builder emits a [`FeatureVector`] whose names (and natural order)
//! are fixed per domain and never depend on the input values. The PV schema
//! has 84 features, the consumption schema 83.
//!
//! The models were trained on history-derived statistics (moving averages,
//! rolling deviations, lags, deltas). No history is kept here, so those
//! features are synthetic proxies: fixed fractional multiples of the current
//! instantaneous value, e.g. `Radiation_Lag1 = 0.95 * radiation`. This
//! matches what the trained models were fed in production.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::Rng;
use std::collections::HashSet;
use std::f64::consts::PI;

use super::consumption::ConsumptionBaseline;
use super::solar::SolarGeometry;
use super::weather::{WeatherSample, WeatherSynthesizer};
use crate::ml::FeatureVector;

/// Radiation treated as the daily maximum when normalising (W/m²)
const MAX_DAILY_RADIATION: f64 = 1000.0;
/// Share of radiation assumed to turn into production for the production proxies
const PRODUCTION_PER_RADIATION: f64 = 0.15;

/// PV model input schema, in natural order
pub const PV_FEATURES: [&str; 84] = [
    // Raw weather
    "WindSpeed",
    "Sunshine",
    "AirPressure",
    "Radiation",
    "AirTemperature",
    "RelativeAirHumidity",
    // Calendar
    "Hour",
    "Month",
    "DayOfYear",
    "DayOfWeek",
    "Quarter",
    "WeekOfYear",
    // Cyclical encodings
    "Hour_sin",
    "Hour_cos",
    "Month_sin",
    "Month_cos",
    "DayOfYear_sin",
    "DayOfYear_cos",
    "DayOfWeek_sin",
    "DayOfWeek_cos",
    // Sun position and time windows
    "SunElevation",
    "SunAzimuth",
    "AirMass",
    "IsDay",
    "IsPeakSun",
    "IsMorning",
    "IsAfternoon",
    "IsWeekend",
    "Season",
    // Interactions
    "Radiation_Temp",
    "Radiation_SunElev",
    "Radiation_Sunshine",
    "Radiation_Sunshine_Ratio",
    "Radiation_AirMass",
    "Wind_Temp",
    "Temp_Humidity",
    "Pressure_Temp",
    "Radiation_Temp_SunElev",
    "Radiation_Sunshine_Humidity",
    // Weather window proxies
    "Radiation_MA2",
    "Radiation_MA3",
    "Radiation_MA6",
    "Radiation_MA12",
    "Radiation_Std3",
    "Radiation_Std6",
    "Radiation_Max3",
    "Radiation_Min3",
    "Temp_MA2",
    "Temp_MA3",
    "Temp_MA6",
    "Temp_Std3",
    "Wind_MA2",
    "Wind_MA3",
    "Wind_Std3",
    "Sunshine_MA3",
    "Sunshine_MA6",
    // Production window proxies
    "Production_MA2",
    "Production_MA3",
    "Production_Std3",
    // Lag proxies
    "Radiation_Lag1",
    "Production_Lag1",
    "Radiation_Lag2",
    "Production_Lag2",
    "Radiation_Lag3",
    "Production_Lag3",
    "Radiation_Lag6",
    "Production_Lag6",
    "Temp_Lag1",
    "Sunshine_Lag1",
    "Temp_Lag2",
    "Sunshine_Lag2",
    "Temp_Lag3",
    "Sunshine_Lag3",
    // Deltas and trends
    "Radiation_Delta1",
    "Radiation_Delta2",
    "Temp_Delta1",
    "Production_Delta1",
    "Radiation_Trend3",
    "Temp_Trend3",
    // Ratios and squares
    "Radiation_to_MaxDaily",
    "Production_to_Radiation",
    "Radiation_Squared",
    "SunElevation_Squared",
    "Sunshine_Squared",
];

/// Consumption model input schema, in natural order
pub const CONSUMPTION_FEATURES: [&str; 83] = [
    "Consumption_Std",
    // Calendar
    "Year",
    "Month",
    "Day",
    "Hour",
    "DayOfWeek",
    "DayOfYear",
    "WeekOfYear",
    "Quarter",
    // Cyclical encodings
    "Hour_sin",
    "Hour_cos",
    "Month_sin",
    "Month_cos",
    "DayOfYear_sin",
    "DayOfYear_cos",
    "DayOfWeek_sin",
    "DayOfWeek_cos",
    "TimeOfDay",
    // Time windows
    "IsWeekend",
    "IsPeakMorning",
    "IsPeakEvening",
    "IsPeakHour",
    "IsWorkingHour",
    "IsNight",
    "IsSleepTime",
    "Season",
    "Within_Hour_Std",
    "Within_Hour_Range",
    // Lag proxies
    "Consumption_Lag1h",
    "Consumption_Lag2h",
    "Consumption_Lag3h",
    "Consumption_Lag6h",
    "Consumption_Lag12h",
    "Consumption_Lag24h",
    "Consumption_Lag48h",
    "Consumption_Lag72h",
    "Consumption_Lag168h",
    // Window proxies
    "Consumption_MA3h",
    "Consumption_MA6h",
    "Consumption_Std6h",
    "Consumption_MA12h",
    "Consumption_Std12h",
    "Consumption_MA24h",
    "Consumption_Std24h",
    "Consumption_Max24h",
    "Consumption_Min24h",
    "Consumption_MA48h",
    "Consumption_Std48h",
    "Consumption_Max48h",
    "Consumption_Min48h",
    "Consumption_MA72h",
    "Consumption_Std72h",
    "Consumption_Max72h",
    "Consumption_Min72h",
    "Consumption_MA168h",
    "Consumption_Std168h",
    "Consumption_Max168h",
    "Consumption_Min168h",
    // Deltas and trends
    "Consumption_Delta1h",
    "Consumption_Delta3h",
    "Consumption_Delta6h",
    "Consumption_Delta24h",
    "Consumption_Trend6h",
    "Consumption_Trend24h",
    // Aggregates
    "DailyMean",
    "DailyStd",
    "DailyMax",
    "DailyMin",
    "WeeklyMean",
    "WeeklyStd",
    "HourlyMean",
    "HourlyStd",
    "MonthlyMean",
    "DayOfWeekMean",
    // Ratios
    "DayOfWeekStd",
    "Consumption_to_DailyMean",
    "Consumption_to_HourlyMean",
    "Consumption_to_WeeklyMean",
    // Same-hour comparisons
    "SameHourYesterday",
    "SameHourLastWeek",
    "SameHour2DaysAgo",
    // Change rates
    "ChangeRate_1h",
    "ChangeRate_6h",
];

/// Contract shared by the PV and consumption feature builders.
///
/// A builder is a pure function of the timestamp, the optional override and
/// the RNG draws it makes; it holds no state between calls.
pub trait FeatureBuilder {
    /// Externally supplied input that replaces the synthesized one
    type Override;

    /// The fixed feature names this builder emits, in natural order
    fn schema(&self) -> &'static [&'static str];

    fn build<R: Rng + ?Sized>(
        &self,
        at: NaiveDateTime,
        overrides: Option<Self::Override>,
        rng: &mut R,
    ) -> FeatureVector;
}

/// Calendar fields shared by both schemas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calendar {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub day_of_year: u32,
    /// 0 = Monday, 6 = Sunday
    pub day_of_week: u32,
    /// ISO 8601 week number
    pub week_of_year: u32,
    pub quarter: u32,
    /// 1 = winter, 2 = spring, 3 = summer, 4 = autumn
    pub season: u32,
}

impl Calendar {
    pub fn new(at: NaiveDateTime) -> Self {
        let month = at.month();
        Self {
            year: at.year(),
            month,
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            day_of_year: at.ordinal(),
            day_of_week: at.weekday().num_days_from_monday(),
            week_of_year: at.iso_week().week(),
            quarter: (month - 1) / 3 + 1,
            season: (month % 12 + 3) / 3,
        }
    }

    pub fn is_weekend(&self) -> bool {
        self.day_of_week >= 5
    }

    /// sin/cos pairs for hour, month, day of year and day of week
    fn cyclical(&self) -> [(&'static str, f64); 8] {
        let (hour_sin, hour_cos) = cycle(self.hour, 24.0);
        let (month_sin, month_cos) = cycle(self.month, 12.0);
        let (doy_sin, doy_cos) = cycle(self.day_of_year, 365.0);
        let (dow_sin, dow_cos) = cycle(self.day_of_week, 7.0);
        [
            ("Hour_sin", hour_sin),
            ("Hour_cos", hour_cos),
            ("Month_sin", month_sin),
            ("Month_cos", month_cos),
            ("DayOfYear_sin", doy_sin),
            ("DayOfYear_cos", doy_cos),
            ("DayOfWeek_sin", dow_sin),
            ("DayOfWeek_cos", dow_cos),
        ]
    }
}

fn cycle(value: u32, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * f64::from(value) / period;
    (angle.sin(), angle.cos())
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Builds the 84-feature PV vector
#[derive(Debug, Clone, Default)]
pub struct PvFeatureBuilder {
    weather: WeatherSynthesizer,
}

impl PvFeatureBuilder {
    pub fn new(weather: WeatherSynthesizer) -> Self {
        Self { weather }
    }
}

impl FeatureBuilder for PvFeatureBuilder {
    type Override = WeatherSample;

    fn schema(&self) -> &'static [&'static str] {
        &PV_FEATURES
    }

    fn build<R: Rng + ?Sized>(
        &self,
        at: NaiveDateTime,
        overrides: Option<WeatherSample>,
        rng: &mut R,
    ) -> FeatureVector {
        let cal = Calendar::new(at);
        let w = overrides.unwrap_or_else(|| self.weather.sample(cal.hour, cal.day_of_year, rng));
        let sun = SolarGeometry::position(cal.hour, cal.day_of_year);

        let (rad, temp, hum, wind, pres, sun_h) = (
            w.radiation,
            w.temperature,
            w.humidity,
            w.wind_speed,
            w.pressure,
            w.sunshine,
        );
        let elev = sun.elevation_deg;
        let production = rad * PRODUCTION_PER_RADIATION;
        let hour = cal.hour;

        let mut pairs = Vec::with_capacity(PV_FEATURES.len());
        pairs.extend([
            ("WindSpeed", wind),
            ("Sunshine", sun_h),
            ("AirPressure", pres),
            ("Radiation", rad),
            ("AirTemperature", temp),
            ("RelativeAirHumidity", hum),
            ("Hour", f64::from(hour)),
            ("Month", f64::from(cal.month)),
            ("DayOfYear", f64::from(cal.day_of_year)),
            ("DayOfWeek", f64::from(cal.day_of_week)),
            ("Quarter", f64::from(cal.quarter)),
            ("WeekOfYear", f64::from(cal.week_of_year)),
        ]);
        pairs.extend(cal.cyclical());
        pairs.extend([
            ("SunElevation", elev),
            ("SunAzimuth", sun.azimuth_deg),
            ("AirMass", sun.air_mass),
            ("IsDay", flag((6..=18).contains(&hour))),
            ("IsPeakSun", flag((10..=14).contains(&hour))),
            ("IsMorning", flag((6..12).contains(&hour))),
            ("IsAfternoon", flag((12..18).contains(&hour))),
            ("IsWeekend", flag(cal.is_weekend())),
            ("Season", f64::from(cal.season)),
            ("Radiation_Temp", rad * temp),
            ("Radiation_SunElev", rad * elev),
            ("Radiation_Sunshine", rad * sun_h),
            ("Radiation_Sunshine_Ratio", rad / (sun_h + 0.01)),
            ("Radiation_AirMass", rad / (sun.air_mass + 0.01)),
            ("Wind_Temp", wind * temp),
            ("Temp_Humidity", temp * hum),
            ("Pressure_Temp", pres * temp),
            ("Radiation_Temp_SunElev", rad * temp * elev),
            ("Radiation_Sunshine_Humidity", rad * sun_h * hum),
        ]);
        pairs.extend([
            ("Radiation_MA2", rad * 0.98),
            ("Radiation_MA3", rad * 0.97),
            ("Radiation_MA6", rad * 0.95),
            ("Radiation_MA12", rad * 0.93),
            ("Radiation_Std3", rad * 0.1),
            ("Radiation_Std6", rad * 0.12),
            ("Radiation_Max3", rad * 1.15),
            ("Radiation_Min3", rad * 0.85),
            ("Temp_MA2", temp * 0.99),
            ("Temp_MA3", temp * 0.98),
            ("Temp_MA6", temp * 0.97),
            ("Temp_Std3", temp * 0.05),
            ("Wind_MA2", wind * 0.99),
            ("Wind_MA3", wind * 0.98),
            ("Wind_Std3", wind * 0.15),
            ("Sunshine_MA3", sun_h * 0.98),
            ("Sunshine_MA6", sun_h * 0.96),
            ("Production_MA2", production * 0.98),
            ("Production_MA3", production * 0.97),
            ("Production_Std3", production * 0.1),
        ]);
        pairs.extend([
            ("Radiation_Lag1", rad * 0.95),
            ("Production_Lag1", production * 0.95),
            ("Radiation_Lag2", rad * 0.90),
            ("Production_Lag2", production * 0.90),
            ("Radiation_Lag3", rad * 0.85),
            ("Production_Lag3", production * 0.85),
            ("Radiation_Lag6", rad * 0.75),
            ("Production_Lag6", production * 0.75),
            ("Temp_Lag1", temp * 0.98),
            ("Sunshine_Lag1", sun_h * 0.95),
            ("Temp_Lag2", temp * 0.96),
            ("Sunshine_Lag2", sun_h * 0.90),
            ("Temp_Lag3", temp * 0.94),
            ("Sunshine_Lag3", sun_h * 0.85),
            ("Radiation_Delta1", rad * 0.05),
            ("Radiation_Delta2", rad * 0.08),
            ("Temp_Delta1", temp * 0.02),
            ("Production_Delta1", production * 0.05),
            ("Radiation_Trend3", if hour < 12 { 0.02 } else { -0.02 }),
            ("Temp_Trend3", if hour < 14 { 0.01 } else { -0.01 }),
            ("Radiation_to_MaxDaily", rad / MAX_DAILY_RADIATION),
            ("Production_to_Radiation", production / (rad + 0.01)),
            ("Radiation_Squared", rad.powi(2)),
            ("SunElevation_Squared", elev.powi(2)),
            ("Sunshine_Squared", sun_h.powi(2)),
        ]);

        debug_assert_eq!(pairs.len(), PV_FEATURES.len());
        FeatureVector::from_pairs(pairs)
    }
}

/// Builds the 83-feature consumption vector
#[derive(Debug, Clone, Default)]
pub struct ConsumptionFeatureBuilder {
    baseline: ConsumptionBaseline,
}

impl ConsumptionFeatureBuilder {
    pub fn new(baseline: ConsumptionBaseline) -> Self {
        Self { baseline }
    }
}

impl FeatureBuilder for ConsumptionFeatureBuilder {
    /// Instantaneous household consumption (W)
    type Override = f64;

    fn schema(&self) -> &'static [&'static str] {
        &CONSUMPTION_FEATURES
    }

    fn build<R: Rng + ?Sized>(
        &self,
        at: NaiveDateTime,
        overrides: Option<f64>,
        rng: &mut R,
    ) -> FeatureVector {
        let cal = Calendar::new(at);
        let hour = cal.hour;
        let base = overrides
            .unwrap_or_else(|| self.baseline.estimate(hour, cal.is_weekend(), rng));

        let peak_morning = (7..=9).contains(&hour);
        let peak_evening = (18..=21).contains(&hour);

        let daily_mean = base * 0.95;
        let weekly_mean = base * 0.96;
        let hourly_mean = base;
        let monthly_mean = base * 0.97;
        let day_of_week_mean = base * if cal.is_weekend() { 0.95 } else { 1.05 };

        let mut pairs = Vec::with_capacity(CONSUMPTION_FEATURES.len());
        pairs.extend([
            ("Consumption_Std", base * 0.15),
            ("Year", f64::from(cal.year)),
            ("Month", f64::from(cal.month)),
            ("Day", f64::from(cal.day)),
            ("Hour", f64::from(hour)),
            ("DayOfWeek", f64::from(cal.day_of_week)),
            ("DayOfYear", f64::from(cal.day_of_year)),
            ("WeekOfYear", f64::from(cal.week_of_year)),
            ("Quarter", f64::from(cal.quarter)),
        ]);
        pairs.extend(cal.cyclical());
        pairs.extend([
            ("TimeOfDay", f64::from(hour) + f64::from(cal.minute) / 60.0),
            ("IsWeekend", flag(cal.is_weekend())),
            ("IsPeakMorning", flag(peak_morning)),
            ("IsPeakEvening", flag(peak_evening)),
            ("IsPeakHour", flag(peak_morning || peak_evening)),
            ("IsWorkingHour", flag((8..=17).contains(&hour))),
            ("IsNight", flag(hour < 6 || hour >= 22)),
            ("IsSleepTime", flag(hour >= 23 || hour < 6)),
            ("Season", f64::from(cal.season)),
            ("Within_Hour_Std", base * 0.05),
            ("Within_Hour_Range", base * 0.1),
        ]);
        pairs.extend([
            ("Consumption_Lag1h", base * 0.98),
            ("Consumption_Lag2h", base * 0.96),
            ("Consumption_Lag3h", base * 0.94),
            ("Consumption_Lag6h", base * 0.90),
            ("Consumption_Lag12h", base * 0.85),
            ("Consumption_Lag24h", base * 0.95),
            ("Consumption_Lag48h", base * 0.93),
            ("Consumption_Lag72h", base * 0.91),
            ("Consumption_Lag168h", base * 0.94),
        ]);
        pairs.extend([
            ("Consumption_MA3h", base * 0.99),
            ("Consumption_MA6h", base * 0.98),
            ("Consumption_Std6h", base * 0.08),
            ("Consumption_MA12h", base * 0.97),
            ("Consumption_Std12h", base * 0.10),
            ("Consumption_MA24h", base * 0.96),
            ("Consumption_Std24h", base * 0.12),
            ("Consumption_Max24h", base * 1.25),
            ("Consumption_Min24h", base * 0.75),
            ("Consumption_MA48h", base * 0.95),
            ("Consumption_Std48h", base * 0.13),
            ("Consumption_Max48h", base * 1.30),
            ("Consumption_Min48h", base * 0.70),
            ("Consumption_MA72h", base * 0.94),
            ("Consumption_Std72h", base * 0.14),
            ("Consumption_Max72h", base * 1.35),
            ("Consumption_Min72h", base * 0.68),
            ("Consumption_MA168h", base * 0.93),
            ("Consumption_Std168h", base * 0.15),
            ("Consumption_Max168h", base * 1.40),
            ("Consumption_Min168h", base * 0.65),
        ]);
        pairs.extend([
            ("Consumption_Delta1h", base * 0.02),
            ("Consumption_Delta3h", base * 0.04),
            ("Consumption_Delta6h", base * 0.06),
            ("Consumption_Delta24h", base * 0.03),
            ("Consumption_Trend6h", if (6..=12).contains(&hour) { 0.01 } else { -0.01 }),
            ("Consumption_Trend24h", 0.005),
            ("DailyMean", daily_mean),
            ("DailyStd", daily_mean * 0.15),
            ("DailyMax", daily_mean * 1.30),
            ("DailyMin", daily_mean * 0.70),
            ("WeeklyMean", weekly_mean),
            ("WeeklyStd", weekly_mean * 0.18),
            ("HourlyMean", hourly_mean),
            ("HourlyStd", hourly_mean * 0.12),
            ("MonthlyMean", monthly_mean),
            ("DayOfWeekMean", day_of_week_mean),
            ("DayOfWeekStd", day_of_week_mean * 0.20),
            ("Consumption_to_DailyMean", ratio(base, daily_mean)),
            ("Consumption_to_HourlyMean", ratio(base, hourly_mean)),
            ("Consumption_to_WeeklyMean", ratio(base, weekly_mean)),
            ("SameHourYesterday", base * 0.95),
            ("SameHourLastWeek", base * 0.94),
            ("SameHour2DaysAgo", base * 0.93),
            ("ChangeRate_1h", 0.02),
            ("ChangeRate_6h", 0.05),
        ]);

        debug_assert_eq!(pairs.len(), CONSUMPTION_FEATURES.len());
        FeatureVector::from_pairs(pairs)
    }
}

// A supplied baseline of 0 would otherwise turn the ratio features into NaN
fn ratio(value: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        value / mean
    }
}

/// Declared names that a schema can never satisfy, in declaration order
pub fn schema_coverage(declared: &[String], schema: &[&str]) -> Vec<String> {
    let known: HashSet<&str> = schema.iter().copied().collect();
    declared
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_schemas_have_unique_names() {
        let pv: HashSet<_> = PV_FEATURES.iter().collect();
        let cons: HashSet<_> = CONSUMPTION_FEATURES.iter().collect();
        assert_eq!(pv.len(), 84);
        assert_eq!(cons.len(), 83);
    }

    #[test]
    fn test_pv_vector_matches_schema() {
        let builder = PvFeatureBuilder::default();
        let mut rng = StdRng::seed_from_u64(42);
        let fv = builder.build(at(2026, 6, 21, 12), None, &mut rng);
        assert_eq!(fv.names(), &PV_FEATURES[..]);
    }

    #[test]
    fn test_consumption_vector_matches_schema() {
        let builder = ConsumptionFeatureBuilder::default();
        let mut rng = StdRng::seed_from_u64(42);
        let fv = builder.build(at(2026, 1, 3, 19), None, &mut rng);
        assert_eq!(fv.names(), &CONSUMPTION_FEATURES[..]);
    }

    #[test]
    fn test_calendar_fields() {
        // 2026-01-03 is a Saturday in ISO week 1
        let cal = Calendar::new(at(2026, 1, 3, 19));
        assert_eq!(cal.day_of_week, 5);
        assert!(cal.is_weekend());
        assert_eq!(cal.week_of_year, 1);
        assert_eq!(cal.quarter, 1);
        assert_eq!(cal.season, 1);

        let cal = Calendar::new(at(2026, 7, 15, 8));
        assert_eq!(cal.quarter, 3);
        assert_eq!(cal.season, 3);
        assert_eq!(cal.day_of_year, 196);
    }

    #[test]
    fn test_pv_override_is_used() {
        let builder = PvFeatureBuilder::default();
        let weather = WeatherSample {
            radiation: 500.0,
            temperature: 25.0,
            humidity: 40.0,
            wind_speed: 2.0,
            pressure: 1010.0,
            sunshine: 50.0,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let fv = builder.build(at(2026, 6, 21, 11), Some(weather), &mut rng);

        assert_eq!(fv.get("Radiation"), Some(500.0));
        assert_eq!(fv.get("Radiation_Lag1"), Some(475.0));
        assert_eq!(fv.get("Radiation_Temp"), Some(12_500.0));
        assert_eq!(fv.get("Production_MA2"), Some(500.0 * 0.15 * 0.98));
        assert_eq!(fv.get("Radiation_Trend3"), Some(0.02));
        assert_eq!(fv.get("IsPeakSun"), Some(1.0));
        assert_eq!(fv.get("IsMorning"), Some(1.0));
        assert_eq!(fv.get("IsAfternoon"), Some(0.0));
    }

    #[test]
    fn test_pv_night_values() {
        let builder = PvFeatureBuilder::default();
        let mut rng = StdRng::seed_from_u64(9);
        let fv = builder.build(at(2026, 3, 10, 23), None, &mut rng);

        assert_eq!(fv.get("Radiation"), Some(0.0));
        assert_eq!(fv.get("SunElevation"), Some(0.0));
        assert_eq!(fv.get("AirMass"), Some(10.0));
        assert_eq!(fv.get("IsDay"), Some(0.0));
    }

    #[test]
    fn test_consumption_override_is_used() {
        let builder = ConsumptionFeatureBuilder::default();
        let mut rng = StdRng::seed_from_u64(0);
        // Wednesday 08:00
        let fv = builder.build(at(2026, 10, 14, 8), Some(400.0), &mut rng);

        assert_eq!(fv.get("HourlyMean"), Some(400.0));
        assert_eq!(fv.get("Consumption_Lag24h"), Some(380.0));
        assert_eq!(fv.get("Consumption_to_HourlyMean"), Some(1.0));
        assert_eq!(fv.get("DayOfWeekMean"), Some(420.0));
        assert_eq!(fv.get("IsPeakMorning"), Some(1.0));
        assert_eq!(fv.get("IsPeakHour"), Some(1.0));
        assert_eq!(fv.get("IsWorkingHour"), Some(1.0));
        assert_eq!(fv.get("IsNight"), Some(0.0));
        assert_eq!(fv.get("Consumption_Trend6h"), Some(0.01));
        assert_eq!(fv.get("TimeOfDay"), Some(8.0));
    }

    #[test]
    fn test_zero_baseline_has_no_nan() {
        let builder = ConsumptionFeatureBuilder::default();
        let mut rng = StdRng::seed_from_u64(0);
        let fv = builder.build(at(2026, 10, 14, 2), Some(0.0), &mut rng);
        assert!(fv.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_schema_coverage() {
        let declared = vec![
            "Radiation".to_string(),
            "CloudCover".to_string(),
            "Hour".to_string(),
        ];
        assert_eq!(schema_coverage(&declared, &PV_FEATURES), vec!["CloudCover"]);
        assert!(schema_coverage(&declared[..1], &PV_FEATURES).is_empty());
    }

    proptest! {
        #[test]
        fn pv_schema_is_fixed(
            day in 0i64..730,
            hour in 0u32..24,
            seed in any::<u64>(),
            radiation in -10.0f64..2000.0,
            use_override in any::<bool>(),
        ) {
            let ts = at(2025, 1, 1, hour) + chrono::Duration::days(day);
            let weather = WeatherSample {
                radiation,
                temperature: 10.0,
                humidity: 50.0,
                wind_speed: 3.0,
                pressure: 1013.0,
                sunshine: radiation / 10.0,
            };
            let fv = PvFeatureBuilder::default().build(
                ts,
                use_override.then_some(weather),
                &mut StdRng::seed_from_u64(seed),
            );
            prop_assert_eq!(fv.names(), &PV_FEATURES[..]);
        }

        #[test]
        fn consumption_schema_is_fixed(
            day in 0i64..730,
            hour in 0u32..24,
            seed in any::<u64>(),
            baseline in proptest::option::of(0.0f64..5000.0),
        ) {
            let ts = at(2025, 1, 1, hour) + chrono::Duration::days(day);
            let fv = ConsumptionFeatureBuilder::default().build(
                ts,
                baseline,
                &mut StdRng::seed_from_u64(seed),
            );
            prop_assert_eq!(fv.names(), &CONSUMPTION_FEATURES[..]);
        }
    }
}
