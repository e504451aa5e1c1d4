//! Booster port: Trait for boosted-tree model scoring.
//!
//! This trait abstracts the model format (XGBoost JSON) from the application
//! logic. The rest of the crate treats a model as an opaque scoring function.

use crate::domain::FeatureVector;

/// Errors that can occur while scoring a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("Probability {0} outside [0, 1]")]
    OutOfRange(f64),
}

/// Trait for boosted-tree scoring.
///
/// Implementations must be deterministic: the same model state and feature
/// vector always produce the same probability.
pub trait Booster: Send + Sync {
    /// Probability of the positive class.
    ///
    /// # Arguments
    /// * `features` - Model input in training order
    /// * `iteration_limit` - Evaluate only boosting rounds `[0, limit)`;
    ///   `None` evaluates every round
    ///
    /// # Errors
    /// Returns `ScoringError` if the input does not fit the model.
    fn predict_proba(
        &self,
        features: &FeatureVector,
        iteration_limit: Option<usize>,
    ) -> Result<f64, ScoringError>;

    /// Number of boosting rounds in the model.
    fn num_iterations(&self) -> usize;

    /// Number of input features the model was trained on.
    fn num_features(&self) -> usize;
}
