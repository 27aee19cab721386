//! Model artifact decoding
//!
//! Artifacts arrive in two shapes: a bare estimator, or a container mapping
//! that wraps one or more estimators together with an optional scaler and
//! an optional declared feature order. [`ModelArtifact::resolve`] decides
//! which shape it is looking at, once, at load time.
//!
//! Container resolution, first match wins:
//! 1. `model`, then `estimator`
//! 2. `models`: a named collection (honouring `best_model_name`) or a list
//! 3. any value in the mapping, in insertion order

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use super::models::{Estimator, EstimatorKind};
use super::scaler::ScalerKind;
use crate::error::ArtifactError;

/// Decoded artifact, before it is turned into a [`super::ModelHandle`]
#[derive(Debug, Clone, PartialEq)]
pub enum ModelArtifact {
    RawEstimator(EstimatorKind),
    WrappedEnsemble {
        /// Every predict-capable candidate considered, in artifact order
        candidates: Vec<(String, EstimatorKind)>,
        /// Name of the candidate chosen from `candidates`
        selected_name: String,
        scaler: Option<ScalerKind>,
        feature_order: Option<Vec<String>>,
    },
}

impl ModelArtifact {
    /// Read and resolve an artifact file
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::NotFound(path.to_path_buf())
            } else {
                ArtifactError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact = Self::resolve(&value)?;
        debug!(
            path = %path.display(),
            selected = artifact.selected_name(),
            "Resolved model artifact"
        );
        Ok(artifact)
    }

    pub fn resolve(value: &Value) -> Result<Self, ArtifactError> {
        if let Some(estimator) = EstimatorKind::from_value(value) {
            return Ok(Self::RawEstimator(estimator));
        }

        let Some(map) = value.as_object() else {
            return Err(ArtifactError::NoEstimator { keys: Vec::new() });
        };

        let scaler = extract_scaler(map)?;
        let feature_order = extract_features(map)?;
        let (candidates, selected_name) =
            select_candidates(map).ok_or_else(|| ArtifactError::NoEstimator {
                keys: map.keys().cloned().collect(),
            })?;

        Ok(Self::WrappedEnsemble {
            candidates,
            selected_name,
            scaler,
            feature_order,
        })
    }

    /// The selected estimator; `None` only for a hand-built empty container
    pub fn estimator(&self) -> Option<&EstimatorKind> {
        match self {
            Self::RawEstimator(estimator) => Some(estimator),
            Self::WrappedEnsemble {
                candidates,
                selected_name,
                ..
            } => candidates
                .iter()
                .find(|(name, _)| name == selected_name)
                .or(candidates.first())
                .map(|(_, estimator)| estimator),
        }
    }

    pub fn selected_name(&self) -> &str {
        match self {
            Self::RawEstimator(_) => "estimator",
            Self::WrappedEnsemble { selected_name, .. } => selected_name,
        }
    }

    /// Declared order, falling back to the names the estimator was fitted on
    pub fn feature_order(&self) -> Option<&[String]> {
        match self {
            Self::RawEstimator(estimator) => estimator.feature_names(),
            Self::WrappedEnsemble { feature_order, .. } => feature_order
                .as_deref()
                .or_else(|| self.estimator().and_then(Estimator::feature_names)),
        }
    }
}

fn extract_scaler(map: &Map<String, Value>) -> Result<Option<ScalerKind>, ArtifactError> {
    let Some(value) = map.get("scaler").filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let invalid = |reason: String| ArtifactError::InvalidEntry {
        key: "scaler".to_string(),
        reason,
    };
    let scaler: ScalerKind =
        serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;
    scaler.validate().map_err(invalid)?;
    Ok(Some(scaler))
}

fn extract_features(map: &Map<String, Value>) -> Result<Option<Vec<String>>, ArtifactError> {
    let Some(value) = map.get("features").filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    serde_json::from_value::<Vec<String>>(value.clone())
        .map(Some)
        .map_err(|e| ArtifactError::InvalidEntry {
            key: "features".to_string(),
            reason: e.to_string(),
        })
}

type Candidates = (Vec<(String, EstimatorKind)>, String);

fn single(name: String, estimator: EstimatorKind) -> Candidates {
    (vec![(name.clone(), estimator)], name)
}

fn select_candidates(map: &Map<String, Value>) -> Option<Candidates> {
    for key in ["model", "estimator"] {
        if let Some(estimator) = map.get(key).and_then(EstimatorKind::from_value) {
            return Some(single(key.to_string(), estimator));
        }
    }

    match map.get("models") {
        Some(Value::Object(named)) => {
            let candidates: Vec<(String, EstimatorKind)> = named
                .iter()
                .filter_map(|(name, v)| EstimatorKind::from_value(v).map(|e| (name.clone(), e)))
                .collect();

            if let Some((first, _)) = candidates.first() {
                let requested = map.get("best_model_name").and_then(Value::as_str);
                let selected = match requested {
                    Some(best) if candidates.iter().any(|(name, _)| name == best) => {
                        best.to_string()
                    }
                    Some(best) => {
                        warn!(
                            best_model_name = best,
                            fallback = %first,
                            "best_model_name does not name a usable model, using first entry"
                        );
                        first.clone()
                    }
                    None => first.clone(),
                };
                return Some((candidates, selected));
            }
        }
        Some(Value::Array(list)) => {
            if let Some(found) = list.iter().enumerate().find_map(|(i, v)| {
                EstimatorKind::from_value(v).map(|e| single(format!("models[{i}]"), e))
            }) {
                return Some(found);
            }
        }
        Some(other) => {
            if let Some(estimator) = EstimatorKind::from_value(other) {
                return Some(single("models".to_string(), estimator));
            }
        }
        None => {}
    }

    map.iter()
        .find_map(|(key, v)| EstimatorKind::from_value(v).map(|e| single(key.clone(), e)))
}
