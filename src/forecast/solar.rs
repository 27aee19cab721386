//! # Solar Geometry
//!
//! Simplified sun-position model used to feed the PV feature builder.
//! This is not an astronomical calculation: elevation and azimuth follow a
//! fixed 06:00-18:00 daylight arch with a seasonal offset, which is the
//! shape the PV model was trained against.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// First hour of the daylight window (inclusive)
pub const SUNRISE_HOUR: u32 = 6;
/// Last hour of the daylight window (inclusive)
pub const SUNSET_HOUR: u32 = 18;

/// Air mass reported when the sun is at or below the horizon.
///
/// This is a sentinel meaning "undefined / night", not a physical value.
pub const NIGHT_AIR_MASS: f64 = 10.0;

const PEAK_ELEVATION_DEG: f64 = 60.0;
const SEASONAL_ELEVATION_DEG: f64 = 20.0;
/// Day of year of the spring equinox, where the seasonal offset crosses zero
const EQUINOX_DAY: f64 = 80.0;

/// Sun position for one hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Elevation above the horizon in degrees (>= 0)
    pub elevation_deg: f64,
    /// Azimuth in degrees (90 = east at sunrise, 270 = west at sunset, 0 at night)
    pub azimuth_deg: f64,
    /// Relative optical path length (1 at zenith, capped at 10)
    pub air_mass: f64,
}

/// Whether `hour` falls inside the daylight window [6, 18]
pub fn is_daylight(hour: u32) -> bool {
    (SUNRISE_HOUR..=SUNSET_HOUR).contains(&hour)
}

/// Half-sine phase across the daylight window: 0 at sunrise, pi/2 at noon, pi at sunset
pub(crate) fn daylight_phase(hour: u32) -> f64 {
    (f64::from(hour) - f64::from(SUNRISE_HOUR)) * PI / 12.0
}

/// Stateless sun-position calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarGeometry;

impl SolarGeometry {
    /// Sun elevation in degrees, clipped at 0
    pub fn elevation(hour: u32, day_of_year: u32) -> f64 {
        if !is_daylight(hour) {
            return 0.0;
        }
        let seasonal = (2.0 * PI * (f64::from(day_of_year) - EQUINOX_DAY) / 365.0).sin();
        let elevation =
            PEAK_ELEVATION_DEG * daylight_phase(hour).sin() + seasonal * SEASONAL_ELEVATION_DEG;
        elevation.max(0.0)
    }

    /// Sun azimuth in degrees: linear east-to-west sweep across daylight, 0 at night
    pub fn azimuth(hour: u32) -> f64 {
        if !is_daylight(hour) {
            return 0.0;
        }
        90.0 + 180.0 * (f64::from(hour) - f64::from(SUNRISE_HOUR)) / 12.0
    }

    /// Kasten-Young air mass approximation, capped at [`NIGHT_AIR_MASS`]
    pub fn air_mass(elevation_deg: f64) -> f64 {
        if elevation_deg <= 0.0 {
            return NIGHT_AIR_MASS;
        }
        let elevation_rad = elevation_deg.to_radians();
        let am = 1.0
            / (elevation_rad.sin() + 0.50572 * (6.07995 + elevation_deg).powf(-1.6364));
        am.min(NIGHT_AIR_MASS)
    }

    /// Full sun position for an hour of a given day
    pub fn position(hour: u32, day_of_year: u32) -> SolarPosition {
        let elevation_deg = Self::elevation(hour, day_of_year);
        SolarPosition {
            elevation_deg,
            azimuth_deg: Self::azimuth(hour),
            air_mass: Self::air_mass(elevation_deg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_night_position() {
        let pos = SolarGeometry::position(2, 172);
        assert_eq!(pos.elevation_deg, 0.0);
        assert_eq!(pos.azimuth_deg, 0.0);
        assert_eq!(pos.air_mass, NIGHT_AIR_MASS);
    }

    #[test]
    fn test_noon_is_highest() {
        let noon = SolarGeometry::elevation(12, 172);
        for hour in 6..=18 {
            assert!(SolarGeometry::elevation(hour, 172) <= noon);
        }
        // Summer solstice: 60 + ~20
        assert!(noon > 75.0 && noon <= 80.0);
    }

    #[test]
    fn test_winter_elevation_lower_than_summer() {
        assert!(SolarGeometry::elevation(12, 355) < SolarGeometry::elevation(12, 172));
    }

    #[test]
    fn test_azimuth_sweep() {
        assert_eq!(SolarGeometry::azimuth(6), 90.0);
        assert_eq!(SolarGeometry::azimuth(12), 180.0);
        assert_eq!(SolarGeometry::azimuth(18), 270.0);
        assert_eq!(SolarGeometry::azimuth(19), 0.0);
    }

    #[test]
    fn test_air_mass_at_zenith_is_close_to_one() {
        let am = SolarGeometry::air_mass(90.0);
        assert!((am - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_air_mass_sentinel() {
        assert_eq!(SolarGeometry::air_mass(0.0), NIGHT_AIR_MASS);
        assert_eq!(SolarGeometry::air_mass(-15.0), NIGHT_AIR_MASS);
        // Grazing sun is capped rather than reported as ~27
        assert_eq!(SolarGeometry::air_mass(0.5), NIGHT_AIR_MASS);
    }

    proptest! {
        #[test]
        fn air_mass_non_increasing(a in 0.001f64..90.0, b in 0.001f64..90.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            // The approximation flattens out within a hair of the zenith
            prop_assert!(SolarGeometry::air_mass(high) <= SolarGeometry::air_mass(low) + 1e-9);
            prop_assert!(SolarGeometry::air_mass(high) >= 1.0 - 1e-3);
        }

        #[test]
        fn elevation_never_negative(hour in 0u32..24, doy in 1u32..=366) {
            prop_assert!(SolarGeometry::elevation(hour, doy) >= 0.0);
        }
    }
}
