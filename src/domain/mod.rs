//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! All inputs are validated before they reach feature engineering.

pub mod consensus;
mod diagnosis;
pub mod features;
mod model;
pub(crate) mod patient;

pub use diagnosis::{
    round_to, ConsensusConfidence, ConsensusResult, Diagnosis, FeatureContributions,
    ModelConfidence, ModelResult, RiskLevel, DISCLAIMER,
};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{ModelInfo, ModelMetadata, ShapImportance, DEFAULT_THRESHOLD};
pub use patient::{FieldError, PatientForm, PatientInput, ValidationErrors, THALLIUM_CODES};
