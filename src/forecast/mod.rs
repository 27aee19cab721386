//! Forecast pipeline: synthesized inputs, feature vectors and the engine
//! that turns them into hourly rows.

pub mod consumption;
pub mod engine;
pub mod features;
pub mod solar;
pub mod weather;

pub use consumption::{ConsumptionBaseline, TimeBucket, MIN_CONSUMPTION_W};
pub use engine::{FailureReporter, ForecastEngine, ForecastRun, ForecastTarget, RunSummary};
pub use features::{
    schema_coverage, ConsumptionFeatureBuilder, FeatureBuilder, PvFeatureBuilder,
    CONSUMPTION_FEATURES, PV_FEATURES,
};
pub use solar::{SolarGeometry, SolarPosition};
pub use weather::{WeatherSample, WeatherSynthesizer};
