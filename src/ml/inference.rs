//! ML Model Inference
//!
//! [`ModelHandle`] is the only thing the forecast engine sees of a model:
//! reorder the built vector, scale it, predict.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::artifact::ModelArtifact;
use super::models::Estimator;
use super::scaler::Scaler;
use super::FeatureVector;
use crate::error::{ArtifactError, StepError};

/// Uniform view over a resolved artifact
pub struct ModelHandle {
    selected_name: String,
    estimator: Box<dyn Estimator>,
    scaler: Option<Box<dyn Scaler>>,
    feature_order: Option<Vec<String>>,
}

/// What `inspect` prints about a loaded model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub kind: &'static str,
    pub selected_name: String,
    /// Number of declared features, `None` when the natural order is used
    pub feature_count: Option<usize>,
    pub scaler: Option<&'static str>,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.selected_name)?;
        match self.feature_count {
            Some(n) => write!(f, ", {n} declared features")?,
            None => write!(f, ", natural feature order")?,
        }
        match self.scaler {
            Some(kind) => write!(f, ", {kind} scaler"),
            None => write!(f, ", no scaler"),
        }
    }
}

impl ModelHandle {
    pub fn new(estimator: impl Estimator + 'static) -> Self {
        Self {
            selected_name: "estimator".to_string(),
            estimator: Box::new(estimator),
            scaler: None,
            feature_order: None,
        }
    }

    pub fn with_scaler(mut self, scaler: impl Scaler + 'static) -> Self {
        self.scaler = Some(Box::new(scaler));
        self
    }

    pub fn with_feature_order(mut self, order: Vec<String>) -> Self {
        self.feature_order = Some(order);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.selected_name = name.into();
        self
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        let feature_order = artifact.feature_order().map(<[String]>::to_vec);
        let selected_name = artifact.selected_name().to_string();

        let (estimator, scaler) = match artifact {
            ModelArtifact::RawEstimator(estimator) => (estimator, None),
            ModelArtifact::WrappedEnsemble {
                mut candidates,
                selected_name,
                scaler,
                ..
            } => {
                let idx = candidates
                    .iter()
                    .position(|(name, _)| *name == selected_name)
                    .unwrap_or(0);
                if candidates.is_empty() {
                    return Err(ArtifactError::NoEstimator { keys: Vec::new() });
                }
                (candidates.swap_remove(idx).1, scaler)
            }
        };

        let mut handle = Self::new(estimator).with_name(selected_name);
        if let Some(scaler) = scaler {
            handle = handle.with_scaler(scaler);
        }
        if let Some(order) = feature_order {
            handle = handle.with_feature_order(order);
        }
        Ok(handle)
    }

    /// Load, resolve and wrap an artifact file
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        Self::from_artifact(ModelArtifact::load(path)?)
    }

    pub fn feature_order(&self) -> Option<&[String]> {
        self.feature_order.as_deref()
    }

    /// Reorder, scale and predict one feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, StepError> {
        let row = features.reorder(self.feature_order.as_deref())?;
        let row = match &self.scaler {
            Some(scaler) => {
                let scaled = scaler.transform(&row)?;
                if scaled.len() != row.len() {
                    return Err(StepError::Scaling(format!(
                        "scaler changed row width from {} to {}",
                        row.len(),
                        scaled.len()
                    )));
                }
                scaled
            }
            None => row,
        };
        self.estimator.predict(&row)
    }

    pub fn describe(&self) -> ModelSummary {
        ModelSummary {
            kind: self.estimator.kind(),
            selected_name: self.selected_name.clone(),
            feature_count: self.feature_order.as_ref().map(Vec::len),
            scaler: self.scaler.as_ref().map(|s| s.kind()),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("selected_name", &self.selected_name)
            .field("kind", &self.estimator.kind())
            .field("scaler", &self.scaler.as_ref().map(|s| s.kind()))
            .field("feature_order", &self.feature_order)
            .finish()
    }
}
