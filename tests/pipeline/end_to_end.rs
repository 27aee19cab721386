use chrono::{NaiveDate, NaiveDateTime};
use home_energy_forecast::config::ForecastConfig;
use home_energy_forecast::domain::SnapshotExtras;
use home_energy_forecast::error::{PersistenceError, ServingError};
use home_energy_forecast::forecast::ForecastEngine;
use home_energy_forecast::ml::ModelHandle;
use home_energy_forecast::repo::ForecastStore;
use home_energy_forecast::serving::{self, CurrentReading};
use serde_json::json;
use tempfile::TempDir;

use super::write_artifact;

const EXTRAS: SnapshotExtras = SnapshotExtras {
    grid_power: 0,
    system_efficiency: 92.0,
};

fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 17)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn forecast_config(seed: u64) -> ForecastConfig {
    ForecastConfig {
        horizon_hours: 24,
        seed: Some(seed),
        ..ForecastConfig::default()
    }
}

/// PV: scaled linear model over two declared features.
/// Consumption: bare linear model that declares its own feature names.
fn realistic_models(dir: &TempDir) -> (ModelHandle, ModelHandle) {
    let pv = write_artifact(
        dir,
        "pv_model.json",
        &json!({
            "models": {
                "gb": {
                    "type": "tree_ensemble",
                    "aggregation": "sum",
                    "base_score": 0.0,
                    "learning_rate": 1.0,
                    "trees": [[{"value": -10.0}]]
                },
                "ridge": {"type": "linear", "coefficients": [2500.0, 0.0], "intercept": -10.0}
            },
            "best_model_name": "ridge",
            "scaler": {"type": "standard", "mean": [0.0, 0.0], "scale": [1000.0, 1.0]},
            "features": ["Radiation", "AirTemperature"]
        }),
    );
    let consumption = write_artifact(
        dir,
        "consumption_model.json",
        &json!({
            "type": "linear",
            "coefficients": [1.0, 0.0],
            "intercept": 0.0,
            "feature_names": ["HourlyMean", "Hour"]
        }),
    );
    (
        ModelHandle::load(&pv).unwrap(),
        ModelHandle::load(&consumption).unwrap(),
    )
}

#[tokio::test]
async fn test_seeded_run_is_reproducible_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let (pv, consumption) = realistic_models(&dir);
    let engine = ForecastEngine::new(pv, consumption, &forecast_config(42));

    let run = engine.run(anchor());
    assert_eq!(run.rows.len(), 24);
    assert_eq!(run.summary.failures(), 0);
    assert_eq!(run.summary.consumption_ok, 24);
    assert_eq!(run, engine.run(anchor()));

    for row in &run.rows {
        assert!(row.pv_power >= 0.0);
        assert!(row.consumption >= 150.0);
        assert!(row.surplus == 0.0 || row.deficit == 0.0);
    }
    // Radiation is 0 at night, so the -10 intercept is clamped away
    assert_eq!(run.rows[2].pv_power, 0.0);
    assert!(run.rows[12].pv_power > 1000.0);

    let store = ForecastStore::in_memory().await.unwrap();
    store.writer().upsert(&run.rows, EXTRAS).await.unwrap();

    let stored = serving::read_forecast(&store, anchor(), 168).await.unwrap();
    assert_eq!(stored, run.rows);

    match serving::read_current(&store).await.unwrap() {
        CurrentReading::Available(snapshot) => {
            assert_eq!(snapshot.row, run.rows[0]);
            assert_eq!(snapshot.extras, EXTRAS);
        }
        CurrentReading::NoData => panic!("snapshot missing after a run"),
    }
}

#[tokio::test]
async fn test_repeated_runs_do_not_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (pv, consumption) = realistic_models(&dir);
    let engine = ForecastEngine::new(pv, consumption, &forecast_config(7));
    let store = ForecastStore::in_memory().await.unwrap();

    let run = engine.run(anchor());
    assert_eq!(run.summary.failures(), 0);
    store.writer().upsert(&run.rows, EXTRAS).await.unwrap();
    store.writer().upsert(&run.rows, EXTRAS).await.unwrap();

    assert_eq!(store.reader().count().await.unwrap(), 24);
    assert_eq!(store.reader().recent_rows(168).await.unwrap().len(), 24);

    let stats = serving::read_aggregate_stats(&store, 24).await.unwrap();
    assert_eq!(stats.samples, 24);
    assert_eq!(stats.system_efficiency, Some(92.0));
}

#[tokio::test]
async fn test_out_of_range_predictions_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let pv = write_artifact(&dir, "pv.json", &json!({"model": {"type": "constant", "value": -50.0}}));
    let consumption = write_artifact(&dir, "cons.json", &json!({"type": "constant", "value": 80.0}));
    let engine = ForecastEngine::new(
        ModelHandle::load(&pv).unwrap(),
        ModelHandle::load(&consumption).unwrap(),
        &forecast_config(1),
    );

    let store = ForecastStore::in_memory().await.unwrap();
    store
        .writer()
        .upsert(&engine.run(anchor()).rows, EXTRAS)
        .await
        .unwrap();

    for row in serving::read_forecast(&store, anchor(), 24).await.unwrap() {
        assert_eq!(row.pv_power, 0.0);
        assert_eq!(row.consumption, 150.0);
        assert_eq!(row.deficit, 150.0);
    }
}

#[tokio::test]
async fn test_unsatisfiable_model_falls_back_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let pv = write_artifact(
        &dir,
        "pv.json",
        &json!({
            "model": {"type": "linear", "coefficients": [1.0]},
            "features": ["CloudCover"]
        }),
    );
    let consumption = write_artifact(&dir, "cons.json", &json!({"type": "constant", "value": 300.0}));
    let engine = ForecastEngine::new(
        ModelHandle::load(&pv).unwrap(),
        ModelHandle::load(&consumption).unwrap(),
        &forecast_config(1),
    );

    let run = engine.run(anchor());
    assert_eq!(run.rows.len(), 24);
    assert_eq!(run.summary.pv_failed, 24);
    assert_eq!(run.summary.consumption_ok, 24);
    assert!(run.rows.iter().all(|r| r.pv_power == 0.0 && r.deficit == 300.0));
}

#[tokio::test]
async fn test_failed_write_keeps_previous_forecast() {
    let dir = tempfile::tempdir().unwrap();
    let (pv, consumption) = realistic_models(&dir);
    let engine = ForecastEngine::new(pv, consumption, &forecast_config(11));
    let store = ForecastStore::in_memory().await.unwrap();

    let first = engine.run(anchor());
    assert_eq!(first.summary.failures(), 0);
    store.writer().upsert(&first.rows, EXTRAS).await.unwrap();

    let (pv, consumption) = realistic_models(&dir);
    let mut second = ForecastEngine::new(pv, consumption, &forecast_config(12)).run(anchor());
    assert_eq!(second.summary.failures(), 0);
    second.rows[10].pv_power = -1.0;

    let err = store.writer().upsert(&second.rows, EXTRAS).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Database(_)));

    assert_eq!(
        serving::read_forecast(&store, anchor(), 24).await.unwrap(),
        first.rows
    );
    assert_eq!(store.reader().current().await.unwrap().unwrap().row, first.rows[0]);
}

#[tokio::test]
async fn test_device_events_are_validated() {
    let store = ForecastStore::in_memory().await.unwrap();
    let err = serving::record_device_event(
        &store,
        "heat_pump",
        home_energy_forecast::domain::DeviceStatus::On,
        -5.0,
        anchor(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServingError::Validation(_)));
    assert!(serving::read_device_states(&store).await.unwrap().is_empty());
}
