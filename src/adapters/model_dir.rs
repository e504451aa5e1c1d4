//! Filesystem adapter: discovers trained models on disk.
//!
//! Layout: one directory per model under the models root. The directory
//! name is the model identifier.
//!
//! ```text
//! models/
//!   xgb_optuna/
//!     xgb_model.json    required, XGBoost JSON model
//!     model_meta.json   optional, training metadata
//! ```
//!
//! Directories without a model file are skipped. A model or sidecar that is
//! present but unreadable aborts the whole load.

use std::path::{Path, PathBuf};

use crate::adapters::xgboost::{ModelFormatError, XgbForest};
use crate::domain::{ModelMetadata, FEATURE_COUNT, FEATURE_NAMES};

/// Model file expected in each model directory.
pub const MODEL_FILE: &str = "xgb_model.json";

/// Optional metadata sidecar.
pub const METADATA_FILE: &str = "model_meta.json";

/// Error type for model discovery.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Cannot read models directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot load model {path:?}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ModelFormatError,
    },

    #[error("Cannot read metadata {path:?}: {source}")]
    MetadataIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metadata {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model {path:?} does not match the feature schema: {detail}")]
    FeatureSchema { path: PathBuf, detail: String },
}

/// A model read from disk, before registration.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub id: String,
    pub forest: XgbForest,
    pub metadata: ModelMetadata,
}

/// Load every model directory under `root`, sorted by identifier.
///
/// # Errors
/// Returns error if the root cannot be listed or a present model/sidecar
/// cannot be parsed. An empty result is not an error here.
pub fn discover(root: &Path) -> Result<Vec<ModelArtifact>, ModelLoadError> {
    let dir_error = |source| ModelLoadError::Directory {
        path: root.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut artifacts = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if let Some(artifact) = load_model_dir(&dir)? {
            artifacts.push(artifact);
        }
    }
    Ok(artifacts)
}

/// Load one model directory.
///
/// Returns `Ok(None)` when the directory has no model file.
///
/// # Errors
/// Returns error if the model or its sidecar is present but invalid.
pub fn load_model_dir(dir: &Path) -> Result<Option<ModelArtifact>, ModelLoadError> {
    let model_path = dir.join(MODEL_FILE);
    if !model_path.is_file() {
        tracing::warn!("Skipping {:?}: no {}", dir, MODEL_FILE);
        return Ok(None);
    }

    let id = match dir.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            tracing::warn!("Skipping {:?}: directory name is not valid UTF-8", dir);
            return Ok(None);
        }
    };

    let forest = XgbForest::from_file(&model_path).map_err(|source| ModelLoadError::Model {
        path: model_path.clone(),
        source,
    })?;
    check_feature_schema(&model_path, &forest)?;

    let metadata = read_metadata(&dir.join(METADATA_FILE))?;

    Ok(Some(ModelArtifact {
        id,
        forest,
        metadata,
    }))
}

fn check_feature_schema(path: &Path, forest: &XgbForest) -> Result<(), ModelLoadError> {
    use crate::ports::Booster;

    let mismatch = |detail: String| ModelLoadError::FeatureSchema {
        path: path.to_path_buf(),
        detail,
    };

    if forest.num_features() != FEATURE_COUNT {
        return Err(mismatch(format!(
            "model expects {} features, service provides {FEATURE_COUNT}",
            forest.num_features()
        )));
    }

    let names = forest.feature_names();
    if !names.is_empty() && names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
        return Err(mismatch(format!("trained on {names:?}")));
    }
    Ok(())
}

fn read_metadata(path: &Path) -> Result<ModelMetadata, ModelLoadError> {
    if !path.exists() {
        tracing::info!("No {:?}, using default metadata", path);
        return Ok(ModelMetadata::default());
    }

    let content = std::fs::read(path).map_err(|source| ModelLoadError::MetadataIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| ModelLoadError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}
