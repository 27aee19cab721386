#![cfg(test)]
//! Load Testing Suite
//!
//! Verifies the forecaster under sustained use:
//! - Full-week horizons
//! - Back-to-back runs overwriting overlapping hours
//! - Readers querying while runs are stored
//!
//! Key Performance Requirements:
//! - A 168-hour run completes in well under a second
//! - Repeated runs never grow the table past the distinct hours covered

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use home_energy_forecast::config::ForecastConfig;
use home_energy_forecast::domain::SnapshotExtras;
use home_energy_forecast::forecast::ForecastEngine;
use home_energy_forecast::ml::models::{LinearRegressionModel, TreeEnsembleModel};
use home_energy_forecast::ml::ModelHandle;
use home_energy_forecast::repo::ForecastStore;
use home_energy_forecast::serving;

const EXTRAS: SnapshotExtras = SnapshotExtras {
    grid_power: 0,
    system_efficiency: 92.0,
};

fn week_engine(seed: u64) -> ForecastEngine {
    let pv: TreeEnsembleModel = serde_json::from_value(serde_json::json!({
        "aggregation": "mean",
        "trees": [
            [{"feature": 0, "threshold": 100.0, "left": 1, "right": 2}, {"value": 0.0}, {"value": 900.0}],
            [{"feature": 0, "threshold": 500.0, "left": 1, "right": 2}, {"value": 200.0}, {"value": 2400.0}]
        ],
        "feature_names": ["Radiation"]
    }))
    .unwrap();
    let pv = ModelHandle::new(pv).with_feature_order(vec!["Radiation".to_string()]);
    let consumption = ModelHandle::new(LinearRegressionModel::new(vec![1.0], 25.0))
        .with_feature_order(vec!["HourlyMean".to_string()]);

    ForecastEngine::new(
        pv,
        consumption,
        &ForecastConfig {
            horizon_hours: 168,
            seed: Some(seed),
            ..ForecastConfig::default()
        },
    )
}

#[tokio::test]
#[ignore]
async fn stress_week_long_runs() {
    let engine = week_engine(1);
    let anchor = NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let start = Instant::now();
    let run = engine.run(anchor);
    let elapsed = start.elapsed();

    assert_eq!(run.rows.len(), 168);
    assert_eq!(run.summary.failures(), 0);
    println!("168-hour run took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1));
}

#[tokio::test]
#[ignore]
async fn stress_rolling_runs_with_readers() {
    let store = ForecastStore::in_memory().await.unwrap();
    let anchor = NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let start = Instant::now();
    // One run per hour for two weeks, each covering the following week
    for hour in 0..336u32 {
        let at = anchor + chrono::Duration::hours(i64::from(hour));
        let run = week_engine(u64::from(hour)).run(at);
        store.writer().upsert(&run.rows, EXTRAS).await.unwrap();

        let upcoming = serving::read_forecast(&store, at, 24).await.unwrap();
        assert_eq!(upcoming.len(), 24);
        assert_eq!(upcoming[0].timestamp, at);
    }
    let elapsed = start.elapsed();

    // 336 run starts plus the 167 trailing hours of the last run
    assert_eq!(store.reader().count().await.unwrap(), 336 + 167);
    let stats = serving::read_aggregate_stats(&store, 168).await.unwrap();
    assert_eq!(stats.samples, 168);

    println!("336 rolling runs stored in {elapsed:?}");
}
