//! Serde mirror of XGBoost's native JSON model document.
//!
//! Only the fields needed for inference are declared; everything else in the
//! document is ignored. XGBoost writes most scalar parameters as strings
//! (`"num_trees": "100"`), so they are kept as `String` here and parsed by
//! the caller.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct XgbDocument {
    pub learner: Learner,
}

#[derive(Debug, Deserialize)]
pub(super) struct Learner {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub learner_model_param: LearnerModelParam,
    pub objective: Objective,
}

#[derive(Debug, Deserialize)]
pub(super) struct GradientBooster {
    pub name: String,
    #[serde(default)]
    pub model: Option<GbtreeModel>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GbtreeModel {
    pub gbtree_model_param: GbtreeModelParam,
    pub trees: Vec<RawTree>,
    /// Tree offsets per boosting round (XGBoost >= 2.0).
    #[serde(default)]
    pub iteration_indptr: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GbtreeModelParam {
    #[serde(default)]
    pub num_parallel_tree: Option<String>,
    pub num_trees: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LearnerModelParam {
    pub base_score: String,
    #[serde(default)]
    pub num_class: Option<String>,
    pub num_feature: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Objective {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawTree {
    pub left_children: Vec<i64>,
    pub right_children: Vec<i64>,
    pub split_indices: Vec<i64>,
    pub split_conditions: Vec<f32>,
    pub default_left: Vec<Flag>,
    #[serde(default)]
    pub split_type: Vec<u8>,
}

/// `default_left` is written as integers by some versions and booleans by others.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(super) enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}
