//! Error types shared across the forecast pipeline.
//!
//! Load-time failures ([`ArtifactError`]) abort startup, per-step failures
//! ([`StepError`]) are absorbed by the engine with a fallback value, and
//! write failures ([`PersistenceError`]) fail the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// A model artifact could not be turned into a usable handle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {} is not valid JSON: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No predict-capable value anywhere in the artifact.
    #[error("could not find a model in artifact; available keys: [{}]", keys.join(", "))]
    NoEstimator { keys: Vec<String> },

    #[error("artifact key `{key}` is malformed: {reason}")]
    InvalidEntry { key: String, reason: String },
}

/// Failure of a single forecast step. Recoverable: the engine substitutes a
/// fallback value and keeps going.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    /// A declared feature name is absent from the built vector.
    #[error("feature `{0}` missing from built feature vector")]
    MissingFeature(String),

    #[error("scaler failed: {0}")]
    Scaling(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// The store rejected a write or returned data it should never contain.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored row is invalid: {0}")]
    CorruptRow(String),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("device name must not be empty")]
    EmptyDeviceName,

    #[error("power consumption must be a finite, non-negative number (got {0})")]
    InvalidPower(f64),
}

/// Errors surfaced to the serving layer.
#[derive(Debug, Error)]
pub enum ServingError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
