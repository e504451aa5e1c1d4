//! Model registry: every model loaded at startup, keyed by identifier.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::adapters::model_dir::{self, ModelArtifact};
use crate::domain::{ModelInfo, ModelMetadata};
use crate::ports::Booster;
use crate::HeartGuardError;

/// A model ready for scoring.
#[derive(Clone)]
pub struct LoadedModel {
    id: String,
    booster: Arc<dyn Booster>,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("id", &self.id)
            .field("num_iterations", &self.booster.num_iterations())
            .field("threshold", &self.threshold())
            .finish_non_exhaustive()
    }
}

impl LoadedModel {
    pub fn new(id: impl Into<String>, booster: Arc<dyn Booster>, metadata: ModelMetadata) -> Self {
        Self {
            id: id.into(),
            booster,
            metadata,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn booster(&self) -> &dyn Booster {
        self.booster.as_ref()
    }

    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Effective decision threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.metadata.threshold()
    }

    /// Rounds to evaluate; `None` means all of them.
    #[must_use]
    pub fn iteration_limit(&self) -> Option<usize> {
        self.metadata.iteration_limit()
    }

    #[must_use]
    pub fn info(&self) -> ModelInfo {
        ModelInfo::new(&self.metadata, self.threshold())
    }
}

impl From<ModelArtifact> for LoadedModel {
    fn from(artifact: ModelArtifact) -> Self {
        Self::new(artifact.id, Arc::new(artifact.forest), artifact.metadata)
    }
}

/// Read-only set of models, ordered by identifier.
///
/// Built once at startup and shared behind an `Arc`; never mutated while
/// serving.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, LoadedModel>,
}

impl ModelRegistry {
    /// Load every model directory under `models_dir`.
    ///
    /// # Errors
    /// Returns error if a model cannot be loaded or none were found.
    pub fn load(models_dir: &Path) -> Result<Self, HeartGuardError> {
        tracing::info!("Loading models from {:?}", models_dir);

        let artifacts = model_dir::discover(models_dir)?;
        let registry = Self::from_models(artifacts.into_iter().map(LoadedModel::from));

        if registry.is_empty() {
            return Err(HeartGuardError::NoModelsLoaded(models_dir.to_path_buf()));
        }

        for model in registry.iter() {
            tracing::info!(
                "Loaded model {} ({}, {} rounds, threshold {:.3}, auc {:?})",
                model.id(),
                model.metadata().family(),
                model.booster().num_iterations(),
                model.threshold(),
                model.metadata().auc_validation,
            );
        }
        Ok(registry)
    }

    /// Build a registry from already constructed models.
    ///
    /// A later model with the same identifier replaces an earlier one.
    pub fn from_models(models: impl IntoIterator<Item = LoadedModel>) -> Self {
        let models = models
            .into_iter()
            .map(|model| (model.id.clone(), model))
            .collect();
        Self { models }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LoadedModel> {
        self.models.get(id)
    }

    /// Models in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &LoadedModel> {
        self.models.values()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// The model whose SHAP importances explain predictions: the first
    /// identifier in lexicographic order.
    #[must_use]
    pub fn primary(&self) -> Option<&LoadedModel> {
        self.models.values().next()
    }
}

impl Drop for ModelRegistry {
    fn drop(&mut self) {
        if !self.models.is_empty() {
            tracing::info!("Releasing {} model(s)", self.models.len());
        }
    }
}
