//! Estimators loaded from the model artifact.
//!
//! Two kinds are supported:
//! - `random_forest`: a bag of regression trees stored as flat node arrays
//!   (`children_left`, `children_right`, `feature`, `threshold`, `value`), the
//!   layout exported by common tree libraries. A node is a leaf when both child
//!   indices are `-1`. Prediction is the mean of the tree outputs.
//! - `linear`: `intercept + Σ coefficients[i] · x[i]`.
//!
//! Structure is validated once at load time so `predict_one` can index without
//! bounds surprises and every traversal is guaranteed to terminate.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::features::FeatureSchema;

/// Anything that maps one feature row to one value.
pub trait Regressor: Send + Sync {
    /// Number of inputs expected per row.
    fn n_features(&self) -> usize;

    fn predict_one(&self, row: &[f64]) -> Result<f64, String>;

    /// Short human-readable description for logs and `check`.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest { trees: Vec<TreeArrays> },
    Linear { intercept: f64, coefficients: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// A validated estimator together with its input schema.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    schema: FeatureSchema,
    estimator: Estimator,
}

#[derive(Debug, Clone)]
enum Estimator {
    Forest(RandomForest),
    Linear(LinearModel),
}

impl ForecastModel {
    pub fn new(schema: FeatureSchema, spec: EstimatorSpec) -> Result<Self, String> {
        let n = schema.len();
        let estimator = match spec {
            EstimatorSpec::RandomForest { trees } => Estimator::Forest(RandomForest::new(trees, n)?),
            EstimatorSpec::Linear {
                intercept,
                coefficients,
            } => Estimator::Linear(LinearModel::new(intercept, coefficients, n)?),
        };
        Ok(Self { schema, estimator })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn regressor(&self) -> &dyn Regressor {
        match &self.estimator {
            Estimator::Forest(f) => f as &dyn Regressor,
            Estimator::Linear(l) => l,
        }
    }
}

impl Regressor for ForecastModel {
    fn n_features(&self) -> usize {
        self.schema.len()
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, String> {
        self.regressor().predict_one(row)
    }

    fn describe(&self) -> String {
        self.regressor().describe()
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
    n_features: usize,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

impl RandomForest {
    pub fn new(trees: Vec<TreeArrays>, n_features: usize) -> Result<Self, String> {
        if trees.is_empty() {
            return Err("random_forest has no trees".to_string());
        }
        let trees = trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_arrays(t, n_features).map_err(|e| format!("tree {i}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees, n_features })
    }
}

impl Regressor for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, String> {
        check_row(row, self.n_features)?;

        // Trees are evaluated in parallel; the sum runs in tree order so the
        // result does not depend on scheduling.
        let outputs: Vec<f64> = self.trees.par_iter().map(|t| t.predict(row)).collect();
        let sum: f64 = outputs.iter().sum();
        Ok(sum / outputs.len() as f64)
    }

    fn describe(&self) -> String {
        format!(
            "random forest ({} trees, {} features)",
            self.trees.len(),
            self.n_features
        )
    }
}

impl Tree {
    fn from_arrays(a: TreeArrays, n_features: usize) -> Result<Self, String> {
        let n = a.children_left.len();
        if n == 0 {
            return Err("empty node arrays".to_string());
        }
        if [a.children_right.len(), a.feature.len(), a.threshold.len(), a.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("node arrays have different lengths".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (a.children_left[i], a.children_right[i]);
            if l == -1 && r == -1 {
                if !a.value[i].is_finite() {
                    return Err(format!("leaf {i} has non-finite value"));
                }
                nodes.push(Node::Leaf(a.value[i]));
                continue;
            }

            // Children must point strictly forward; this rules out cycles.
            let child = |c: i64| -> Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {i} has invalid child index {c}"))
            };
            let feature = usize::try_from(a.feature[i])
                .ok()
                .filter(|&f| f < n_features)
                .ok_or_else(|| format!("node {i} splits on unknown feature {}", a.feature[i]))?;
            if !a.threshold[i].is_finite() {
                return Err(format!("node {i} has non-finite threshold {}", a.threshold[i]));
            }

            nodes.push(Node::Split {
                feature,
                threshold: a.threshold[i],
                left: child(l)?,
                right: child(r)?,
            });
        }

        Ok(Self { nodes })
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(v) => return v,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>, n_features: usize) -> Result<Self, String> {
        if coefficients.len() != n_features {
            return Err(format!(
                "linear model has {} coefficients for {} features",
                coefficients.len(),
                n_features
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model has non-finite parameters".to_string());
        }
        Ok(Self {
            intercept,
            coefficients,
        })
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, String> {
        check_row(row, self.coefficients.len())?;
        Ok(self.intercept + self.coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>())
    }

    fn describe(&self) -> String {
        format!("linear ({} features)", self.coefficients.len())
    }
}

fn check_row(row: &[f64], n_features: usize) -> Result<(), String> {
    if row.len() != n_features {
        return Err(format!("expected {n_features} features, got {}", row.len()));
    }
    if let Some(i) = row.iter().position(|v| !v.is_finite()) {
        return Err(format!("feature {i} is not finite ({})", row[i]));
    }
    Ok(())
}
