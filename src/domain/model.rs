//! Model metadata types.
//!
//! Every model directory may carry a `model_meta.json` sidecar written by the
//! training pipeline. All fields are optional; absent values fall back to the
//! defaults below instead of failing the load.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Decision threshold used when the sidecar does not provide one.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Family label used when the sidecar does not provide one.
pub const UNKNOWN_MODEL_TYPE: &str = "Unknown";

/// Training metadata for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model family label (e.g. "XGBoost")
    pub model_type: Option<String>,

    /// Validation ROC AUC, used as consensus weight
    pub auc_validation: Option<f64>,

    pub best_f1: Option<f64>,

    pub pr_auc: Option<f64>,

    pub brier_score: Option<f64>,

    /// Decision threshold tuned on validation data
    pub optimal_threshold: Option<f64>,

    pub n_features: Option<u64>,

    /// Early-stopping round; only rounds before it are evaluated
    pub best_iteration: Option<u64>,

    pub train_size: Option<u64>,

    #[serde(default)]
    pub features: Vec<String>,

    /// Mean absolute SHAP value per feature
    #[serde(default)]
    pub feature_importance_shap: ShapImportance,
}

impl ModelMetadata {
    /// Threshold applied to this model's probability.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.optimal_threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    #[must_use]
    pub fn family(&self) -> &str {
        self.model_type.as_deref().unwrap_or(UNKNOWN_MODEL_TYPE)
    }

    /// Number of boosting rounds to evaluate, if capped.
    ///
    /// A recorded best iteration of zero means "no cap".
    #[must_use]
    pub fn iteration_limit(&self) -> Option<usize> {
        self.best_iteration
            .filter(|&it| it > 0)
            .and_then(|it| usize::try_from(it).ok())
    }
}

/// Mean absolute SHAP value per feature, in the order the sidecar lists them.
///
/// A repeated feature keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapImportance(Vec<(String, f64)>);

impl ShapImportance {
    pub fn insert(&mut self, name: String, importance: f64) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = importance,
            None => self.0.push((name, importance)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Entries in sidecar order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for ShapImportance {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut shap = Self::default();
        for (name, importance) in iter {
            shap.insert(name, importance);
        }
        shap
    }
}

impl Serialize for ShapImportance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, importance) in &self.0 {
            map.serialize_entry(name, importance)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ShapImportance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShapVisitor;

        impl<'de> Visitor<'de> for ShapVisitor {
            type Value = ShapImportance;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to importance")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut shap = ShapImportance::default();
                while let Some((name, importance)) = access.next_entry::<String, f64>()? {
                    shap.insert(name, importance);
                }
                Ok(shap)
            }
        }

        deserializer.deserialize_map(ShapVisitor)
    }
}

/// Public description of a loaded model, as served by `GET /models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub auc_validation: Option<f64>,
    pub best_f1: Option<f64>,
    pub pr_auc: Option<f64>,
    pub brier_score: Option<f64>,
    pub optimal_threshold: f64,
    pub n_features: Option<u64>,
    pub best_iteration: Option<u64>,
    pub train_size: Option<u64>,
    pub features: Vec<String>,
    pub feature_importance_shap: ShapImportance,
}

impl ModelInfo {
    /// Describe a model from its metadata and effective threshold.
    #[must_use]
    pub fn new(metadata: &ModelMetadata, threshold: f64) -> Self {
        Self {
            model_type: metadata.family().to_string(),
            auc_validation: metadata.auc_validation,
            best_f1: metadata.best_f1,
            pr_auc: metadata.pr_auc,
            brier_score: metadata.brier_score,
            optimal_threshold: threshold,
            n_features: metadata.n_features,
            best_iteration: metadata.best_iteration,
            train_size: metadata.train_size,
            features: metadata.features.clone(),
            feature_importance_shap: metadata.feature_importance_shap.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sidecar_uses_defaults() {
        let meta: ModelMetadata = serde_json::from_str("{}").expect("Should parse");
        assert!((meta.threshold() - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(meta.family(), "Unknown");
        assert_eq!(meta.iteration_limit(), None);
        assert!(meta.auc_validation.is_none());
        assert!(meta.feature_importance_shap.is_empty());
    }

    #[test]
    fn test_sidecar_fields_and_unknown_keys() {
        let meta: ModelMetadata = serde_json::from_str(
            r#"{
                "model_type": "XGBoost",
                "auc_validation": 0.912,
                "optimal_threshold": 0.38,
                "best_iteration": 412,
                "train_size": 504000,
                "features": ["age", "sex"],
                "feature_importance_shap": {"thallium": 0.71, "age": 0.12},
                "optuna_trials": 200
            }"#,
        )
        .expect("Should parse");

        assert_eq!(meta.family(), "XGBoost");
        assert!((meta.threshold() - 0.38).abs() < f64::EPSILON);
        assert_eq!(meta.iteration_limit(), Some(412));
        assert_eq!(meta.features.len(), 2);
        assert_eq!(meta.feature_importance_shap.get("thallium"), Some(0.71));
    }

    #[test]
    fn test_shap_importance_keeps_sidecar_order() {
        let meta: ModelMetadata = serde_json::from_str(
            r#"{"feature_importance_shap": {"thallium": 0.7, "age": 0.1, "bp": 0.3, "age": 0.2}}"#,
        )
        .expect("Should parse");

        let names: Vec<&str> = meta.feature_importance_shap.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["thallium", "age", "bp"]);
        assert_eq!(meta.feature_importance_shap.get("age"), Some(0.2));

        let json = serde_json::to_string(&meta.feature_importance_shap).expect("Should serialize");
        assert_eq!(json, r#"{"thallium":0.7,"age":0.2,"bp":0.3}"#);
    }

    #[test]
    fn test_shap_importance_rejects_non_numeric_values() {
        let err = serde_json::from_str::<ShapImportance>(r#"{"age": "high"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_zero_best_iteration_means_no_cap() {
        let meta = ModelMetadata {
            best_iteration: Some(0),
            ..Default::default()
        };
        assert_eq!(meta.iteration_limit(), None);
    }

    #[test]
    fn test_model_info_serializes_missing_fields_as_null() {
        let info = ModelInfo::new(&ModelMetadata::default(), 0.5);
        let json = serde_json::to_value(&info).expect("Should serialize");

        assert_eq!(json["model_type"], "Unknown");
        assert!(json["auc_validation"].is_null());
        assert!(json["brier_score"].is_null());
        assert_eq!(json["optimal_threshold"], 0.5);
        assert_eq!(json["features"], serde_json::json!([]));
        assert_eq!(json["feature_importance_shap"], serde_json::json!({}));
    }
}
