use home_energy_forecast::error::ArtifactError;
use home_energy_forecast::ml::ModelHandle;
use serde_json::json;

use super::write_artifact;

#[test]
fn test_wrapped_artifact_with_scaler_and_features() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(
        &dir,
        "pv_model.json",
        &json!({
            "models": {
                "random_forest": {
                    "type": "tree_ensemble",
                    "trees": [[
                        {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                        {"value": 0.0},
                        {"value": 1500.0}
                    ]]
                },
                "linear": {"type": "linear", "coefficients": [1.0, 0.0], "intercept": 0.0}
            },
            "best_model_name": "random_forest",
            "scaler": {"type": "min_max", "data_min": [0.0, 0.0], "data_max": [1000.0, 40.0]},
            "features": ["Radiation", "AirTemperature"],
            "trained_at": "2024-05-01"
        }),
    );

    let handle = ModelHandle::load(&path).unwrap();
    let summary = handle.describe();
    assert_eq!(summary.kind, "random_forest");
    assert_eq!(summary.selected_name, "random_forest");
    assert_eq!(summary.feature_count, Some(2));
    assert_eq!(summary.scaler, Some("min_max"));
}

#[test]
fn test_artifact_without_estimator_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(
        &dir,
        "broken.json",
        &json!({"features": ["Hour"], "metrics": {"mae": 12.5}}),
    );

    let err = ModelHandle::load(&path).unwrap_err();
    match err {
        ArtifactError::NoEstimator { keys } => assert_eq!(keys, vec!["features", "metrics"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_artifact_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelHandle::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ArtifactError::NotFound(_)));
    assert!(err.to_string().contains("nope.json"));
}
