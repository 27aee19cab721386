//! Machine Learning Module
//!
//! Runs pre-trained models; nothing here trains.
//! - Feature vectors with named, ordered inputs
//! - Estimators (linear, tree ensembles, constant) and optional scalers
//! - Model artifacts: decoding heterogeneous containers into a [`ModelHandle`]
//!
//! # Architecture
//! An artifact file is decoded once at load into a [`ModelArtifact`], which
//! is turned into a [`ModelHandle`]. The forecast engine only ever talks to
//! handles.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::StepError;

pub mod artifact;
pub mod inference;
pub mod models;
pub mod scaler;

pub use artifact::ModelArtifact;
pub use inference::{ModelHandle, ModelSummary};
pub use models::{Estimator, EstimatorKind};
pub use scaler::{Scaler, ScalerKind};

/// Named feature values in the order a builder produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    feature_names: Vec<&'static str>,
    features: Vec<f64>,
}

impl FeatureVector {
    pub fn from_pairs(pairs: Vec<(&'static str, f64)>) -> Self {
        let (feature_names, features) = pairs.into_iter().unzip();
        Self {
            feature_names,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.feature_names
    }

    pub fn values(&self) -> &[f64] {
        &self.features
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.features[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.feature_names
            .iter()
            .copied()
            .zip(self.features.iter().copied())
    }

    /// Values laid out in `order`, or in natural order when `order` is `None`.
    ///
    /// Fails on the first declared name the vector does not contain.
    pub fn reorder(&self, order: Option<&[String]>) -> Result<Vec<f64>, StepError> {
        let Some(order) = order else {
            return Ok(self.features.clone());
        };

        let index: HashMap<&str, f64> = self.iter().collect();
        order
            .iter()
            .map(|name| {
                index
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| StepError::MissingFeature(name.clone()))
            })
            .collect()
    }
}
