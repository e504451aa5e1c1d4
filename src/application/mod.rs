//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod prediction;
pub(crate) mod registry;
pub mod scoring;

pub use prediction::{HealthReport, PredictionService};
pub use registry::{LoadedModel, ModelRegistry};
