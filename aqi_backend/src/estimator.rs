//! Regression estimators that map a [`FeatureVector`] to a raw AQI.
//!
//! Artifacts are JSON exports of trained regressors. Every artifact is
//! validated when it is built, so a loaded estimator cannot fail on shape
//! at prediction time.

use serde::Deserialize;

use crate::error::{EstimatorError, ModelError};
use crate::features::{FeatureVector, FEATURE_COUNT};

/// Anything that can score a feature vector.
pub trait Estimator: Send + Sync {
    fn predict(&self, x: &FeatureVector) -> Result<f64, EstimatorError>;

    /// Short name for logs and health output.
    fn kind(&self) -> &'static str;
}

fn finite(v: f64) -> Result<f64, EstimatorError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EstimatorError::NonFinite(v))
    }
}

/// Serialized estimator, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Linear {
        coef: Vec<f64>,
        #[serde(default)]
        intercept: f64,
    },
    Forest {
        trees: Vec<TreeSpec>,
    },
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<TreeSpec>,
    },
}

/// Flat-array export of one regression tree.
#[derive(Debug, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl EstimatorSpec {
    pub fn build(self) -> Result<Box<dyn Estimator>, ModelError> {
        match self {
            EstimatorSpec::Linear { coef, intercept } => {
                Ok(Box::new(LinearEstimator::new(coef, intercept)?))
            }
            EstimatorSpec::Forest { trees } => {
                let trees = build_trees(trees)?;
                Ok(Box::new(ForestEstimator { trees }))
            }
            EstimatorSpec::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err(ModelError::Invalid(
                        "gradient boosting init and learning_rate must be finite".into(),
                    ));
                }
                let trees = build_trees(trees)?;
                Ok(Box::new(GradientBoostingEstimator {
                    init,
                    learning_rate,
                    trees,
                }))
            }
        }
    }
}

fn build_trees(specs: Vec<TreeSpec>) -> Result<Vec<RegressionTree>, ModelError> {
    if specs.is_empty() {
        return Err(ModelError::Invalid("ensemble has no trees".into()));
    }
    specs
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            RegressionTree::try_from(t).map_err(|e| ModelError::Invalid(format!("tree {i}: {e}")))
        })
        .collect()
}

// ---------- Linear ----------

#[derive(Debug, Clone)]
pub struct LinearEstimator {
    coef: [f64; FEATURE_COUNT],
    intercept: f64,
}

impl LinearEstimator {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        let coef: [f64; FEATURE_COUNT] = coef.try_into().map_err(|c: Vec<f64>| {
            ModelError::Invalid(format!(
                "linear coef has {} entries, expected {}",
                c.len(),
                FEATURE_COUNT
            ))
        })?;
        Ok(Self { coef, intercept })
    }
}

impl Estimator for LinearEstimator {
    fn predict(&self, x: &FeatureVector) -> Result<f64, EstimatorError> {
        let dot: f64 = self
            .coef
            .iter()
            .zip(x.as_slice())
            .map(|(w, v)| w * v)
            .sum();
        finite(dot + self.intercept)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

// ---------- Trees ----------

#[derive(Debug, Clone)]
pub struct RegressionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<usize>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl TryFrom<TreeSpec> for RegressionTree {
    type Error = String;

    fn try_from(t: TreeSpec) -> Result<Self, String> {
        let n = t.children_left.len();
        if n == 0 {
            return Err("empty tree".into());
        }
        if [
            t.children_right.len(),
            t.feature.len(),
            t.threshold.len(),
            t.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("node arrays differ in length".into());
        }

        let mut feature = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (t.children_left[i], t.children_right[i]);
            if l < 0 {
                if r >= 0 {
                    return Err(format!("node {i} has a right child but no left child"));
                }
                // leaves carry a placeholder feature index
                feature.push(0);
                continue;
            }
            // children always come after their parent, which rules out cycles
            for child in [l, r] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} has out-of-order child {child}"));
                }
            }
            let f = t.feature[i];
            if f < 0 || f >= FEATURE_COUNT as i64 {
                return Err(format!("node {i} splits on feature {f}"));
            }
            feature.push(f as usize);
        }

        Ok(Self {
            children_left: t.children_left,
            children_right: t.children_right,
            feature,
            threshold: t.threshold,
            value: t.value,
        })
    }
}

impl RegressionTree {
    fn predict_row(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            node = if x[self.feature[node]] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Mean of the tree outputs.
#[derive(Debug, Clone)]
pub struct ForestEstimator {
    trees: Vec<RegressionTree>,
}

impl Estimator for ForestEstimator {
    fn predict(&self, x: &FeatureVector) -> Result<f64, EstimatorError> {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(x.as_slice())).sum();
        finite(sum / self.trees.len() as f64)
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}

/// `init + learning_rate * Σ tree(x)`.
#[derive(Debug, Clone)]
pub struct GradientBoostingEstimator {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl Estimator for GradientBoostingEstimator {
    fn predict(&self, x: &FeatureVector) -> Result<f64, EstimatorError> {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(x.as_slice())).sum();
        finite(self.init + self.learning_rate * sum)
    }

    fn kind(&self) -> &'static str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stump(split_on: i64, threshold: f64, low: f64, high: f64) -> serde_json::Value {
        json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [split_on, -2, -2],
            "threshold": [threshold, -2.0, -2.0],
            "value": [0.0, low, high]
        })
    }

    fn build(v: serde_json::Value) -> Result<Box<dyn Estimator>, ModelError> {
        serde_json::from_value::<EstimatorSpec>(v).unwrap().build()
    }

    #[test]
    fn linear_dot_product() {
        let est = build(json!({
            "kind": "linear",
            "coef": [0.0, 0.0, 1.5, 0.0, 0.0, 0.0, 0.0],
            "intercept": 10.0
        }))
        .unwrap();
        let x = FeatureVector::new(25.0, 60.0, 20.0, 400.0, 20.0, 0.0);
        assert_eq!(est.predict(&x).unwrap(), 40.0);
        assert_eq!(est.kind(), "linear");
    }

    #[test]
    fn linear_rejects_wrong_width() {
        let err = build(json!({ "kind": "linear", "coef": [1.0, 2.0] })).err().unwrap();
        assert!(err.to_string().contains("expected 7"), "{err}");
    }

    #[test]
    fn forest_averages_trees() {
        let est = build(json!({
            "kind": "forest",
            "trees": [stump(2, 30.0, 20.0, 120.0), stump(2, 40.0, 40.0, 140.0)]
        }))
        .unwrap();
        // pm25 = 35: first tree goes right, second goes left
        let x = FeatureVector::new(25.0, 60.0, 35.0, 400.0, 35.0, 0.0);
        assert_eq!(est.predict(&x).unwrap(), 80.0);
    }

    #[test]
    fn boosting_scales_tree_sum() {
        let est = build(json!({
            "kind": "gradient_boosting",
            "init": 50.0,
            "learning_rate": 0.5,
            "trees": [stump(0, 30.0, 10.0, -10.0), stump(3, 500.0, 4.0, 40.0)]
        }))
        .unwrap();
        let x = FeatureVector::new(25.0, 60.0, 35.0, 400.0, 35.0, 0.0);
        assert_eq!(est.predict(&x).unwrap(), 57.0);
    }

    #[test]
    fn tree_validation() {
        let mut cyclic = stump(0, 1.0, 0.0, 1.0);
        cyclic["children_left"] = json!([0, -1, -1]);
        assert!(build(json!({ "kind": "forest", "trees": [cyclic] })).is_err());

        let bad_feature = stump(9, 1.0, 0.0, 1.0);
        assert!(build(json!({ "kind": "forest", "trees": [bad_feature] })).is_err());

        assert!(build(json!({ "kind": "forest", "trees": [] })).is_err());
    }

    #[test]
    fn non_finite_output_is_an_error() {
        let est = LinearEstimator::new(vec![f64::MAX; 7], 0.0).unwrap();
        let x = FeatureVector::new(25.0, 60.0, 35.0, 400.0, 35.0, 0.0);
        assert!(matches!(est.predict(&x), Err(EstimatorError::NonFinite(_))));
    }
}
