//! Hour-by-hour forecast runs
//!
//! Each step builds both feature vectors, predicts through the model
//! handles and clamps the results. A failing step falls back to fixed values
//! instead of aborting the run, so a run always yields one row per hour.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use super::consumption::MIN_CONSUMPTION_W;
use super::features::{
    schema_coverage, ConsumptionFeatureBuilder, FeatureBuilder, PvFeatureBuilder,
};
use crate::config::ForecastConfig;
use crate::domain::{truncate_to_hour, ForecastRow};
use crate::error::StepError;
use crate::ml::ModelHandle;

/// PV value used when a step fails (W)
pub const PV_FALLBACK_W: f64 = 0.0;
/// Consumption value used when a step fails (W)
pub const CONSUMPTION_FALLBACK_W: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ForecastTarget {
    Pv,
    Consumption,
}

/// Outcome counts of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: u32,
    pub pv_ok: u32,
    pub pv_failed: u32,
    pub consumption_ok: u32,
    pub consumption_failed: u32,
    /// Message of the first step failure, if any
    pub first_error: Option<String>,
}

impl RunSummary {
    pub fn failures(&self) -> u32 {
        self.pv_failed + self.consumption_failed
    }
}

/// Counts step outcomes; only the first failure of a run is logged loudly.
#[derive(Debug, Default)]
pub struct FailureReporter {
    summary: RunSummary,
}

impl FailureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, target: ForecastTarget) {
        match target {
            ForecastTarget::Pv => self.summary.pv_ok += 1,
            ForecastTarget::Consumption => self.summary.consumption_ok += 1,
        }
    }

    pub fn failure(&mut self, target: ForecastTarget, at: NaiveDateTime, err: &StepError) {
        match target {
            ForecastTarget::Pv => self.summary.pv_failed += 1,
            ForecastTarget::Consumption => self.summary.consumption_failed += 1,
        }

        if self.summary.first_error.is_none() {
            warn!(
                %target,
                timestamp = %at,
                error = %err,
                "Forecast step failed, using fallback (further failures logged at debug)"
            );
            self.summary.first_error = Some(format!("{target} at {at}: {err}"));
        } else {
            debug!(%target, timestamp = %at, error = %err, "Forecast step failed");
        }
    }

    pub fn finish(mut self, steps: u32) -> RunSummary {
        self.summary.steps = steps;
        self.summary
    }
}

/// Rows plus outcome counts of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRun {
    pub rows: Vec<ForecastRow>,
    pub summary: RunSummary,
}

pub struct ForecastEngine {
    pv_model: ModelHandle,
    consumption_model: ModelHandle,
    pv_features: PvFeatureBuilder,
    consumption_features: ConsumptionFeatureBuilder,
    horizon_hours: u32,
    battery_soc: f64,
    seed: Option<u64>,
}

impl ForecastEngine {
    pub fn new(pv_model: ModelHandle, consumption_model: ModelHandle, config: &ForecastConfig) -> Self {
        let pv_features = PvFeatureBuilder::default();
        let consumption_features = ConsumptionFeatureBuilder::default();

        warn_unsatisfiable(ForecastTarget::Pv, &pv_model, pv_features.schema());
        warn_unsatisfiable(
            ForecastTarget::Consumption,
            &consumption_model,
            consumption_features.schema(),
        );

        Self {
            pv_model,
            consumption_model,
            pv_features,
            consumption_features,
            horizon_hours: config.horizon_hours,
            battery_soc: config.battery_soc,
            seed: config.seed,
        }
    }

    pub fn horizon_hours(&self) -> u32 {
        self.horizon_hours
    }

    /// Forecast `horizon_hours` consecutive hours starting at `anchor`,
    /// truncated to the hour.
    ///
    /// With a configured seed, the same anchor always yields the same run.
    pub fn run(&self, anchor: NaiveDateTime) -> ForecastRun {
        let start = truncate_to_hour(anchor);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut reporter = FailureReporter::new();

        let rows: Vec<ForecastRow> = (0..self.horizon_hours)
            .map(|i| {
                let at = start + Duration::hours(i64::from(i));
                self.step(at, &mut rng, &mut reporter)
            })
            .collect();

        let summary = reporter.finish(self.horizon_hours);
        info!(
            start = %start,
            steps = summary.steps,
            pv_ok = summary.pv_ok,
            pv_failed = summary.pv_failed,
            consumption_ok = summary.consumption_ok,
            consumption_failed = summary.consumption_failed,
            "Forecast run finished"
        );

        ForecastRun { rows, summary }
    }

    fn step(&self, at: NaiveDateTime, rng: &mut StdRng, reporter: &mut FailureReporter) -> ForecastRow {
        // Draw order matters for reproducibility: PV weather first, then consumption
        let pv_vector = self.pv_features.build(at, None, rng);
        let consumption_vector = self.consumption_features.build(at, None, rng);

        let pv = match self.pv_model.predict(&pv_vector) {
            Ok(value) => {
                reporter.success(ForecastTarget::Pv);
                value.max(0.0)
            }
            Err(err) => {
                reporter.failure(ForecastTarget::Pv, at, &err);
                PV_FALLBACK_W
            }
        };

        let consumption = match self.consumption_model.predict(&consumption_vector) {
            Ok(value) => {
                reporter.success(ForecastTarget::Consumption);
                value.max(MIN_CONSUMPTION_W)
            }
            Err(err) => {
                reporter.failure(ForecastTarget::Consumption, at, &err);
                CONSUMPTION_FALLBACK_W
            }
        };

        ForecastRow::from_predictions(at, at.hour(), pv, consumption, self.battery_soc)
    }
}

fn warn_unsatisfiable(target: ForecastTarget, model: &ModelHandle, schema: &[&str]) {
    let Some(order) = model.feature_order() else {
        return;
    };
    let missing = schema_coverage(order, schema);
    if !missing.is_empty() {
        warn!(
            %target,
            ?missing,
            "Model declares features the builder never produces; every step will fall back"
        );
    }
}
