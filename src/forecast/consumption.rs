//! Rule-based household consumption baseline
//!
//! Used as the instantaneous consumption value from which the consumption
//! feature vector is derived when no measured baseline is supplied.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use strum::{Display, EnumIter};

/// Lowest household draw the forecaster will ever report (W)
pub const MIN_CONSUMPTION_W: f64 = 150.0;

const WEEKEND_FACTOR: f64 = 1.1;

/// Time-of-day load bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TimeBucket {
    /// 00:00-05:59
    Night,
    /// 06:00-08:59
    MorningPeak,
    /// 09:00-11:59
    LateMorning,
    /// 12:00-13:59
    Lunch,
    /// 14:00-17:59
    Afternoon,
    /// 18:00-21:59
    EveningPeak,
    /// 22:00-23:59
    LateNight,
}

impl TimeBucket {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=8 => Self::MorningPeak,
            9..=11 => Self::LateMorning,
            12..=13 => Self::Lunch,
            14..=17 => Self::Afternoon,
            18..=21 => Self::EveningPeak,
            _ => Self::LateNight,
        }
    }

    /// Typical weekday draw for this bucket (W)
    pub fn base_load_w(&self) -> f64 {
        match self {
            Self::Night => 150.0,
            Self::MorningPeak => 400.0,
            Self::LateMorning => 300.0,
            Self::Lunch => 350.0,
            Self::Afternoon => 280.0,
            Self::EveningPeak => 450.0,
            Self::LateNight => 200.0,
        }
    }
}

/// Derives a consumption baseline from the hour and weekday
#[derive(Debug, Clone)]
pub struct ConsumptionBaseline {
    noise: Uniform<f64>,
}

impl Default for ConsumptionBaseline {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumptionBaseline {
    pub fn new() -> Self {
        Self {
            noise: Uniform::new(-30.0, 30.0),
        }
    }

    /// Noise-free baseline: bucket load, x1.1 on weekends
    pub fn expected(hour: u32, is_weekend: bool) -> f64 {
        let base = TimeBucket::for_hour(hour).base_load_w();
        if is_weekend {
            base * WEEKEND_FACTOR
        } else {
            base
        }
    }

    /// Baseline with +-30 W noise, floored at [`MIN_CONSUMPTION_W`]
    pub fn estimate<R: Rng + ?Sized>(&self, hour: u32, is_weekend: bool, rng: &mut R) -> f64 {
        (Self::expected(hour, is_weekend) + self.noise.sample(rng)).max(MIN_CONSUMPTION_W)
    }
}
