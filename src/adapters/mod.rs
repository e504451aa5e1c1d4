//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `xgboost`: XGBoost JSON model evaluation
//! - `model_dir`: model discovery on the filesystem
//! - `sanitize`: clinical value filtering for logs

pub mod model_dir;
pub mod sanitize;
pub mod xgboost;

// Re-export load error for lib.rs
pub use model_dir::ModelLoadError;
