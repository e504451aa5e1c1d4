//! Per-model scoring.

use crate::application::LoadedModel;
use crate::domain::{round_to, FeatureVector, ModelConfidence, ModelResult};
use crate::ports::ScoringError;

/// Score one patient with one model.
///
/// # Errors
/// Returns error if the booster rejects the input or yields a value
/// outside `[0, 1]`.
pub fn score(model: &LoadedModel, features: &FeatureVector) -> Result<ModelResult, ScoringError> {
    let probability = model
        .booster()
        .predict_proba(features, model.iteration_limit())?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(ScoringError::OutOfRange(probability));
    }

    let threshold = model.threshold();
    let result = ModelResult {
        name: model.id().to_string(),
        algo: model.metadata().family().to_string(),
        probability: round_to(probability, 4),
        prediction: u8::from(probability >= threshold),
        auc: model.metadata().auc_validation,
        threshold,
        confidence: ModelConfidence::from_distance((probability - threshold).abs()),
        raw_probability: probability,
    };

    tracing::debug!(
        "model {} probability={:.4} threshold={:.3} prediction={}",
        result.name,
        probability,
        threshold,
        result.prediction
    );
    Ok(result)
}
