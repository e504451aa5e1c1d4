//! XGBoost adapter: Implementation of Booster over native JSON models.
//!
//! Reads the `xgb_model.json` documents written by `Booster.save_model()` and
//! evaluates them without linking libxgboost.
//!
//! # Supported models
//!
//! - `gbtree` booster with numerical splits
//! - Binary objectives with a logistic link (`binary:logistic`, `reg:logistic`)
//! - Any `num_parallel_tree`
//!
//! # Numerics
//!
//! Evaluation follows XGBoost's CPU predictor: features and split conditions
//! are `f32`, a feature goes left when `value < condition`, missing values
//! (NaN) follow `default_left`, leaf values are accumulated in `f32` on top of
//! the base margin, and the logistic link is applied last.

mod format;

use std::path::Path;
use std::str::FromStr;

use crate::domain::FeatureVector;
use crate::ports::{Booster, ScoringError};

use format::{RawTree, XgbDocument};

/// Objectives whose output is `sigmoid(margin)`.
const LOGISTIC_OBJECTIVES: [&str; 2] = ["binary:logistic", "reg:logistic"];

/// Error type for model parsing.
#[derive(Debug, thiserror::Error)]
pub enum ModelFormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported model: {0}")]
    Unsupported(String),

    #[error("Malformed model: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf {
        value: f32,
    },
    Split {
        feature: usize,
        condition: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(
        raw: &RawTree,
        index: usize,
        num_features: usize,
    ) -> Result<Self, ModelFormatError> {
        let n = raw.left_children.len();
        let malformed =
            |detail: String| ModelFormatError::Malformed(format!("tree {index}: {detail}"));

        if n == 0 {
            return Err(malformed("no nodes".into()));
        }
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
            || (!raw.split_type.is_empty() && raw.split_type.len() != n)
        {
            return Err(malformed("node arrays have different lengths".into()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (raw.left_children[i], raw.right_children[i]);

            if left == -1 {
                if right != -1 {
                    return Err(malformed(format!("node {i} has only one child")));
                }
                nodes.push(Node::Leaf {
                    value: raw.split_conditions[i],
                });
                continue;
            }

            if raw.split_type.get(i).copied().unwrap_or(0) != 0 {
                return Err(ModelFormatError::Unsupported(format!(
                    "tree {index}: categorical split at node {i}"
                )));
            }

            // Children are always numbered after their parent, which also
            // guarantees that traversal terminates.
            let child = |c: i64| {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| malformed(format!("node {i} has invalid child {c}")))
            };
            let feature = usize::try_from(raw.split_indices[i])
                .ok()
                .filter(|&f| f < num_features)
                .ok_or_else(|| {
                    malformed(format!(
                        "node {i} splits on feature {} (model has {num_features})",
                        raw.split_indices[i]
                    ))
                })?;

            nodes.push(Node::Split {
                feature,
                condition: raw.split_conditions[i],
                left: child(left)?,
                right: child(right)?,
                default_left: raw.default_left[i].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, x: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    condition,
                    left,
                    right,
                    default_left,
                } => {
                    let value = x[feature];
                    idx = if value.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if value < condition {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A parsed XGBoost tree ensemble.
#[derive(Debug, Clone)]
pub struct XgbForest {
    trees: Vec<Tree>,
    /// Tree offsets per boosting round; round `r` owns `trees[ptr[r]..ptr[r + 1]]`.
    iteration_ptr: Vec<usize>,
    base_margin: f32,
    num_features: usize,
    feature_names: Vec<String>,
}

impl XgbForest {
    /// Load a model from an `xgb_model.json` file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a supported model.
    pub fn from_file(path: &Path) -> Result<Self, ModelFormatError> {
        let content = std::fs::read(path)?;
        Self::from_slice(&content)
    }

    /// Parse a model from JSON bytes.
    ///
    /// # Errors
    /// Returns error if the document is not a supported model.
    pub fn from_slice(json: &[u8]) -> Result<Self, ModelFormatError> {
        let document: XgbDocument = serde_json::from_slice(json)?;
        Self::from_document(document)
    }

    fn from_document(document: XgbDocument) -> Result<Self, ModelFormatError> {
        let learner = document.learner;

        if !LOGISTIC_OBJECTIVES.contains(&learner.objective.name.as_str()) {
            return Err(ModelFormatError::Unsupported(format!(
                "objective {}",
                learner.objective.name
            )));
        }

        let num_class: usize = match learner.learner_model_param.num_class.as_deref() {
            Some(raw) if !raw.is_empty() => parse_param("num_class", raw)?,
            _ => 0,
        };
        if num_class > 1 {
            return Err(ModelFormatError::Unsupported(format!(
                "multi-class model ({num_class} classes)"
            )));
        }

        let num_features: usize =
            parse_param("num_feature", &learner.learner_model_param.num_feature)?;
        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(ModelFormatError::Malformed(format!(
                "base_score {base_score} outside (0, 1)"
            )));
        }

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelFormatError::Unsupported(format!(
                "booster {}",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelFormatError::Malformed("gbtree without model".into()))?;

        let declared_trees: usize =
            parse_param("num_trees", &model.gbtree_model_param.num_trees)?;
        if declared_trees != model.trees.len() {
            return Err(ModelFormatError::Malformed(format!(
                "num_trees is {declared_trees} but {} trees are present",
                model.trees.len()
            )));
        }

        let trees = model
            .trees
            .iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(raw, i, num_features))
            .collect::<Result<Vec<_>, _>>()?;

        let iteration_ptr = match model.iteration_indptr {
            Some(ptr) => {
                let valid = ptr.first() == Some(&0)
                    && ptr.last() == Some(&trees.len())
                    && ptr.windows(2).all(|w| w[0] <= w[1]);
                if !valid {
                    return Err(ModelFormatError::Malformed(
                        "iteration_indptr does not cover the trees".into(),
                    ));
                }
                ptr
            }
            None => {
                let parallel: usize = match model.gbtree_model_param.num_parallel_tree.as_deref() {
                    Some(raw) => parse_param("num_parallel_tree", raw)?,
                    None => 1,
                };
                let per_round = parallel.max(1);
                if trees.len() % per_round != 0 {
                    return Err(ModelFormatError::Malformed(format!(
                        "{} trees is not a multiple of num_parallel_tree {per_round}",
                        trees.len()
                    )));
                }
                (0..=trees.len() / per_round).map(|r| r * per_round).collect()
            }
        };

        Ok(Self {
            trees,
            iteration_ptr,
            base_margin: prob_to_margin(base_score),
            num_features,
            feature_names: learner.feature_names,
        })
    }

    /// Feature names recorded at training time (may be empty).
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw margin (log-odds) over rounds `[0, limit)`.
    fn margin(&self, x: &[f32], iteration_limit: Option<usize>) -> f32 {
        let end = match iteration_limit {
            Some(limit) if limit > 0 && limit < self.num_iterations() => self.iteration_ptr[limit],
            _ => self.trees.len(),
        };

        let mut margin = self.base_margin;
        for tree in &self.trees[..end] {
            margin += tree.leaf_value(x);
        }
        margin
    }
}

impl Booster for XgbForest {
    fn predict_proba(
        &self,
        features: &FeatureVector,
        iteration_limit: Option<usize>,
    ) -> Result<f64, ScoringError> {
        if features.len() != self.num_features {
            return Err(ScoringError::FeatureCount {
                got: features.len(),
                expected: self.num_features,
            });
        }

        let margin = self.margin(features.as_slice(), iteration_limit);
        Ok(f64::from(sigmoid(margin)))
    }

    fn num_iterations(&self) -> usize {
        self.iteration_ptr.len().saturating_sub(1)
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

fn parse_param<T: FromStr>(name: &str, raw: &str) -> Result<T, ModelFormatError> {
    raw.trim()
        .parse()
        .map_err(|_| ModelFormatError::Malformed(format!("{name} is not a number: {raw:?}")))
}

/// Newer releases write `base_score` as a one-element vector (`"[5E-1]"`).
fn parse_base_score(raw: &str) -> Result<f32, ModelFormatError> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = inner.split(',').next().unwrap_or(inner);
    parse_param("base_score", first)
}

fn prob_to_margin(base_score: f32) -> f32 {
    -(1.0 / base_score - 1.0).ln()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
