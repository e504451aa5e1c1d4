//! # HeartGuard
//!
//! Multi-model cardiac risk prediction service.
//!
//! This crate provides:
//! - Feature engineering over the 13-field clinical heart disease schema
//! - An evaluator for XGBoost JSON boosted-tree models
//! - AUC-weighted consensus across independently trained models
//! - An axum HTTP API (`/predict`, `/models`, `/health`)
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient input, features, consensus)
//! - `ports`: Trait definitions for external operations (model scoring)
//! - `adapters`: Concrete implementations (XGBoost JSON, model directories, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `api`: HTTP surface
//! - `config`: Environment-driven service configuration

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{Diagnosis, PatientForm, PatientInput, RiskLevel};

/// Result type for HeartGuard operations
pub type Result<T> = std::result::Result<T, HeartGuardError>;

/// Main error type for HeartGuard
#[derive(Debug, thiserror::Error)]
pub enum HeartGuardError {
    #[error("Invalid patient data: {0}")]
    Validation(#[from] domain::ValidationErrors),

    #[error("No model available")]
    NoModelsAvailable,

    #[error("No model loaded from {0:?}")]
    NoModelsLoaded(std::path::PathBuf),

    #[error("Model loading failed: {0}")]
    ModelLoad(#[from] adapters::ModelLoadError),

    #[error("Scoring failed for model {model}: {source}")]
    Scoring {
        model: String,
        #[source]
        source: ports::ScoringError,
    },
}
