//! Prediction service: Orchestrates multi-model cardiac risk scoring.
//!
//! This service coordinates:
//! - Input validation
//! - Feature engineering
//! - Scoring with every registered model
//! - Consensus and explanation

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::application::{scoring, ModelRegistry};
use crate::domain::{
    consensus, round_to, Diagnosis, FeatureContributions, FeatureVector, ModelInfo, PatientForm,
    DISCLAIMER,
};
use crate::HeartGuardError;

/// Liveness summary served by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub models_loaded: usize,
    pub model_names: Vec<String>,
}

/// Service for running predictions against the shared registry.
///
/// Cloning is cheap; every clone shares the same registry.
#[derive(Debug, Clone)]
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    /// Create a new prediction service.
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run a prediction for one patient.
    ///
    /// # Errors
    /// Returns error if:
    /// - Any field is out of range (no model is called)
    /// - No model is loaded
    /// - A model fails to score
    pub fn predict(&self, form: &PatientForm) -> Result<Diagnosis, HeartGuardError> {
        let patient = form.validate()?;

        if self.registry.is_empty() {
            return Err(HeartGuardError::NoModelsAvailable);
        }

        let start = Instant::now();
        let features = FeatureVector::from_patient(&patient);

        let models = self
            .registry
            .iter()
            .map(|model| {
                scoring::score(model, &features).map_err(|source| HeartGuardError::Scoring {
                    model: model.id().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let consensus = consensus::build(&models).ok_or(HeartGuardError::NoModelsAvailable)?;
        let feature_contributions = self.feature_contributions();
        let processing_time_ms = round_to(start.elapsed().as_secs_f64() * 1000.0, 2);

        tracing::info!(
            "Prediction complete: {} models, probability={:.4}, risk={}, agreement={}, {:.2} ms",
            models.len(),
            consensus.probability,
            consensus.risk_level,
            consensus.agreement,
            processing_time_ms
        );

        Ok(Diagnosis {
            consensus,
            models,
            feature_contributions,
            processing_time_ms,
            disclaimer: DISCLAIMER,
        })
    }

    /// Positive SHAP importances of the primary model, highest first.
    ///
    /// Equal importances keep their sidecar order.
    #[must_use]
    pub fn feature_contributions(&self) -> FeatureContributions {
        let Some(primary) = self.registry.primary() else {
            return FeatureContributions::default();
        };

        let mut ranked: Vec<(String, f64)> = primary
            .metadata()
            .feature_importance_shap
            .iter()
            .filter(|&(_, importance)| importance > 0.0)
            .map(|(name, importance)| (name.to_string(), importance))
            .collect();

        // Stable, so ties stay in sidecar order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        FeatureContributions(
            ranked
                .into_iter()
                .map(|(name, importance)| (name, round_to(importance, 4)))
                .collect(),
        )
    }

    /// Metadata of every model, keyed by identifier.
    #[must_use]
    pub fn model_catalog(&self) -> BTreeMap<String, ModelInfo> {
        self.registry
            .iter()
            .map(|model| (model.id().to_string(), model.info()))
            .collect()
    }

    #[must_use]
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            models_loaded: self.registry.len(),
            model_names: self.registry.names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::tests::{metadata, FixedBooster};
    use crate::application::LoadedModel;
    use crate::domain::patient::tests::typical_form;
    use crate::domain::{ConsensusConfidence, ModelMetadata, RiskLevel};

    fn service(models: impl IntoIterator<Item = LoadedModel>) -> PredictionService {
        PredictionService::new(Arc::new(ModelRegistry::from_models(models)))
    }

    #[test]
    fn test_invalid_input_never_reaches_a_model() {
        let booster = FixedBooster::new(0.9);
        let svc = service([LoadedModel::new("a", booster.clone(), metadata(None, None))]);

        let form = PatientForm {
            age: 150.0,
            thallium: 4.0,
            ..typical_form()
        };
        let err = svc.predict(&form).expect_err("Should reject");

        match err {
            HeartGuardError::Validation(errors) => {
                assert!(errors.contains("age"));
                assert!(errors.contains("thallium"));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
        assert_eq!(booster.calls(), 0);
    }

    #[test]
    fn test_empty_registry_is_unavailable() {
        let svc = PredictionService::new(Arc::new(ModelRegistry::default()));
        let err = svc.predict(&typical_form()).expect_err("Should fail");
        assert!(matches!(err, HeartGuardError::NoModelsAvailable));
    }

    #[test]
    fn test_empty_registry_still_validates_first() {
        let svc = PredictionService::new(Arc::new(ModelRegistry::default()));
        let form = PatientForm {
            sex: 2.0,
            ..typical_form()
        };
        let err = svc.predict(&form).expect_err("Should fail");
        assert!(matches!(err, HeartGuardError::Validation(_)));
    }

    #[test]
    fn test_split_vote_weighted_by_auc() {
        let svc = service([
            LoadedModel::new("a", FixedBooster::new(0.80), metadata(Some(0.90), Some(0.5))),
            LoadedModel::new("b", FixedBooster::new(0.30), metadata(Some(0.70), Some(0.5))),
        ]);

        let diagnosis = svc.predict(&typical_form()).expect("Should predict");

        assert!((diagnosis.consensus.probability - 0.58125).abs() < 5e-5);
        assert_eq!(diagnosis.consensus.prediction, 1);
        assert_eq!(diagnosis.consensus.risk_level, RiskLevel::High);
        assert_eq!(diagnosis.consensus.agreement, "1/2");
        assert_eq!(diagnosis.consensus.confidence, ConsensusConfidence::Low);

        let names: Vec<&str> = diagnosis.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(diagnosis.models[0].prediction, 1);
        assert_eq!(diagnosis.models[1].prediction, 0);
        assert_eq!(diagnosis.disclaimer, DISCLAIMER);
        assert!(diagnosis.processing_time_ms >= 0.0);
    }

    #[test]
    fn test_every_model_scored_once() {
        let boosters = [FixedBooster::new(0.7), FixedBooster::new(0.8), FixedBooster::new(0.9)];
        let svc = service(
            boosters
                .iter()
                .enumerate()
                .map(|(i, b)| LoadedModel::new(format!("m{i}"), b.clone(), metadata(None, None))),
        );

        let diagnosis = svc.predict(&typical_form()).expect("Should predict");

        assert!(boosters.iter().all(|b| b.calls() == 1));
        assert_eq!(diagnosis.consensus.agreement, "3/3");
        assert_eq!(diagnosis.consensus.confidence, ConsensusConfidence::High);
        assert!((diagnosis.consensus.probability - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_contributions_come_from_primary_model() {
        let mut primary = metadata(Some(0.9), None);
        primary.feature_importance_shap = [
            ("age", 0.12345),
            ("thallium", 0.9),
            ("chest_pain_type", 0.9),
            ("sex", 0.0),
            ("cholesterol", -0.2),
        ]
        .into_iter()
        .map(|(name, importance)| (name.to_string(), importance))
        .collect();
        let mut other = metadata(Some(0.8), None);
        other.feature_importance_shap = std::iter::once(("max_hr".to_string(), 5.0)).collect();

        let svc = service([
            LoadedModel::new("xgb_b", FixedBooster::new(0.5), other),
            LoadedModel::new("xgb_a", FixedBooster::new(0.5), primary),
        ]);

        let diagnosis = svc.predict(&typical_form()).expect("Should predict");
        let contributions = &diagnosis.feature_contributions;

        let names: Vec<&str> = contributions.names().collect();
        assert_eq!(names, ["thallium", "chest_pain_type", "age"]);
        assert!((contributions.0[2].1 - 0.1235).abs() < 1e-12);

        let json = serde_json::to_string(contributions).expect("Should serialize");
        assert_eq!(json, r#"{"thallium":0.9,"chest_pain_type":0.9,"age":0.1235}"#);
    }

    #[test]
    fn test_catalog_and_health() {
        let svc = service([
            LoadedModel::new("b", FixedBooster::new(0.5), ModelMetadata::default()),
            LoadedModel::new("a", FixedBooster::new(0.5), metadata(Some(0.9), Some(0.42))),
        ]);

        let catalog = svc.model_catalog();
        assert_eq!(catalog.len(), 2);
        assert!((catalog["a"].optimal_threshold - 0.42).abs() < f64::EPSILON);
        assert_eq!(catalog["b"].model_type, "Unknown");
        assert!(catalog["b"].auc_validation.is_none());

        let health = svc.health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.models_loaded, 2);
        assert_eq!(health.model_names, ["a", "b"]);
    }
}
