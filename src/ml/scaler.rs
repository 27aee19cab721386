//! Feature scalers applied between reordering and prediction

use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Maps an ordered row to a row of identical width
pub trait Scaler: Send + Sync {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StepError>;

    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalerKind {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerKind {
    pub fn validate(&self) -> Result<(), String> {
        let (a, b, what) = match self {
            Self::Standard(s) => (s.mean.len(), s.scale.len(), "mean/scale"),
            Self::MinMax(s) => (s.data_min.len(), s.data_max.len(), "data_min/data_max"),
        };
        if a == 0 {
            return Err("scaler has no columns".to_string());
        }
        if a != b {
            return Err(format!("{what} lengths differ ({a} vs {b})"));
        }
        Ok(())
    }
}

impl Scaler for ScalerKind {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StepError> {
        match self {
            Self::Standard(s) => s.transform(row),
            Self::MinMax(s) => s.transform(row),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Standard(_) => "standard",
            Self::MinMax(_) => "min_max",
        }
    }
}

fn check_width(expected: usize, row: &[f64]) -> Result<(), StepError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(StepError::Scaling(format!(
            "scaler fitted on {expected} features, row has {}",
            row.len()
        )))
    }
}

/// Z-score standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler for StandardScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StepError> {
        check_width(self.mean.len(), row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant columns were fitted with a zero scale
                let scale = if scale.abs() < 1e-10 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }

    fn kind(&self) -> &'static str {
        "standard"
    }
}

/// Min-max normalization to [0, 1] over the fitted range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

impl Scaler for MinMaxScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StepError> {
        check_width(self.data_min.len(), row)?;
        Ok(row
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(x, (min, max))| {
                let range = max - min;
                if range.abs() < 1e-10 {
                    0.0
                } else {
                    (x - min) / range
                }
            })
            .collect())
    }

    fn kind(&self) -> &'static str {
        "min_max"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler {
            mean: vec![10.0, 5.0],
            scale: vec![2.0, 0.0],
        };
        assert_eq!(scaler.transform(&[14.0, 7.0]).unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler = MinMaxScaler {
            data_min: vec![0.0, 3.0],
            data_max: vec![10.0, 3.0],
        };
        assert_eq!(scaler.transform(&[2.5, 9.0]).unwrap(), vec![0.25, 0.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        assert!(matches!(
            scaler.transform(&[1.0, 2.0]),
            Err(StepError::Scaling(_))
        ));
    }

    #[test]
    fn test_decode_tagged() {
        let scaler: ScalerKind =
            serde_json::from_value(json!({"type": "min_max", "data_min": [0.0], "data_max": [4.0]}))
                .unwrap();
        assert_eq!(scaler.kind(), "min_max");
        assert!(scaler.validate().is_ok());
        assert_eq!(scaler.transform(&[1.0]).unwrap(), vec![0.25]);

        let lopsided: ScalerKind =
            serde_json::from_value(json!({"type": "standard", "mean": [0.0, 1.0], "scale": [1.0]}))
                .unwrap();
        assert!(lopsided.validate().is_err());
    }
}
