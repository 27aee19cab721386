//! ML Model Definitions
//!
//! Concrete estimators that can appear inside a model artifact. They are
//! serialized as JSON objects tagged with `"type"`.

use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Anything that maps one ordered numeric row to a scalar
pub trait Estimator: Send + Sync {
    fn predict(&self, row: &[f64]) -> Result<f64, StepError>;

    /// Short model family name for logs
    fn kind(&self) -> &'static str;

    /// Column names the estimator was fitted on, if it recorded them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Closed set of estimator encodings understood by the artifact loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorKind {
    Linear(LinearRegressionModel),
    TreeEnsemble(TreeEnsembleModel),
    Constant(ConstantModel),
}

impl EstimatorKind {
    /// Decode `value` if it is a well-formed estimator encoding.
    ///
    /// Returns `None` for anything else, which is how the artifact resolver
    /// tells predict-capable values apart from plain data.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.get("type").is_some_and(serde_json::Value::is_string) {
            return None;
        }
        let kind: Self = serde_json::from_value(value.clone()).ok()?;
        kind.validate().ok()?;
        Some(kind)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Linear(m) => m.validate(),
            Self::TreeEnsemble(m) => m.validate(),
            Self::Constant(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Estimator {
        match self {
            Self::Linear(m) => m,
            Self::TreeEnsemble(m) => m,
            Self::Constant(m) => m,
        }
    }
}

impl Estimator for EstimatorKind {
    fn predict(&self, row: &[f64]) -> Result<f64, StepError> {
        self.inner().predict(row)
    }

    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.inner().feature_names()
    }
}

fn finite(value: f64) -> Result<f64, StepError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StepError::Prediction(format!(
            "model produced a non-finite value ({value})"
        )))
    }
}

/// Ordinary linear regression: `intercept + sum(coefficient * x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            feature_names: None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("linear model has no coefficients".to_string());
        }
        match &self.feature_names {
            Some(names) if names.len() != self.coefficients.len() => Err(format!(
                "{} feature names for {} coefficients",
                names.len(),
                self.coefficients.len()
            )),
            _ => Ok(()),
        }
    }
}

impl Estimator for LinearRegressionModel {
    fn predict(&self, row: &[f64]) -> Result<f64, StepError> {
        if row.len() != self.coefficients.len() {
            return Err(StepError::Prediction(format!(
                "feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }

        let value = row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum::<f64>()
            + self.intercept;
        finite(value)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

/// How tree outputs are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of the trees
    #[default]
    Mean,
    /// Gradient boosting: sum of the trees
    Sum,
}

/// One node of a flattened regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node list; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for node in &self.nodes {
            if let TreeNode::Split { left, right, .. } = node {
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!(
                        "split points outside the tree ({} nodes)",
                        self.nodes.len()
                    ));
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    pub fn evaluate(&self, row: &[f64]) -> Result<f64, StepError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer hops than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        StepError::Prediction(format!(
                            "tree splits on feature {feature} but row has {} values",
                            row.len()
                        ))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(StepError::Prediction(format!("tree node {idx} missing")));
                }
            }
        }
        Err(StepError::Prediction("tree contains a cycle".to_string()))
    }
}

/// Random forest or gradient-boosted trees:
/// `base_score + learning_rate * aggregate(tree outputs)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleModel {
    pub trees: Vec<RegressionTree>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

fn default_learning_rate() -> f64 {
    1.0
}

impl TreeEnsembleModel {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        self.trees.iter().try_for_each(RegressionTree::validate)?;
        if let (Some(names), Some(max)) = (
            &self.feature_names,
            self.trees.iter().filter_map(RegressionTree::max_feature).max(),
        ) {
            if max >= names.len() {
                return Err(format!(
                    "trees split on feature {max} but only {} names are recorded",
                    names.len()
                ));
            }
        }
        Ok(())
    }
}

impl Estimator for TreeEnsembleModel {
    fn predict(&self, row: &[f64]) -> Result<f64, StepError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(row)?;
        }
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        finite(self.base_score + self.learning_rate * combined)
    }

    fn kind(&self) -> &'static str {
        match self.aggregation {
            Aggregation::Mean => "random_forest",
            Aggregation::Sum => "gradient_boosting",
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

/// Always predicts the same value (dummy regressor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantModel {
    pub value: f64,
}

impl ConstantModel {
    fn validate(&self) -> Result<(), String> {
        if self.value.is_finite() {
            Ok(())
        } else {
            Err("constant model value is not finite".to_string())
        }
    }
}

impl Estimator for ConstantModel {
    fn predict(&self, _row: &[f64]) -> Result<f64, StepError> {
        Ok(self.value)
    }

    fn kind(&self) -> &'static str {
        "constant"
    }
}
