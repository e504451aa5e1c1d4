//! Multi-model consensus.
//!
//! Combines per-model probabilities into one AUC-weighted score and derives
//! the risk band and inter-model agreement from it. All cut points are fixed.

use super::diagnosis::{round_to, ConsensusConfidence, ConsensusResult, ModelResult, RiskLevel};

/// Cut applied to the weighted probability. Lower than the usual 0.5 to
/// favor sensitivity.
pub const CONSENSUS_THRESHOLD: f64 = 0.42;

/// Upper bound (exclusive) of the "low" band.
pub const LOW_RISK_BOUND: f64 = 0.2;

/// Upper bound (exclusive) of the "high" band.
pub const HIGH_RISK_BOUND: f64 = 0.7;

/// Weighted probability across models.
///
/// Uses `auc_i / sum(auc)` weights when every model reports an AUC, and the
/// arithmetic mean otherwise. Returns `None` for an empty slice.
#[must_use]
pub fn weighted_probability(results: &[ModelResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }

    let aucs: Option<Vec<f64>> = results.iter().map(|r| r.auc).collect();
    if let Some(aucs) = aucs {
        let total: f64 = aucs.iter().sum();
        if total > 0.0 {
            let weighted = results
                .iter()
                .zip(&aucs)
                .map(|(r, auc)| r.raw_probability * auc / total)
                .sum();
            return Some(weighted);
        }
    }

    let sum: f64 = results.iter().map(|r| r.raw_probability).sum();
    Some(sum / results.len() as f64)
}

/// Risk band of a consensus probability.
#[must_use]
pub fn risk_level(probability: f64) -> RiskLevel {
    if probability < LOW_RISK_BOUND {
        RiskLevel::Low
    } else if probability < CONSENSUS_THRESHOLD {
        RiskLevel::Moderate
    } else if probability < HIGH_RISK_BOUND {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    }
}

/// Confidence from the vote split.
///
/// A unanimous vote is `High`. A single dissenter against a strict majority
/// (N-1 of N, N >= 3) is `Medium`. Anything else, including a 1-1 split, is
/// `Low`.
#[must_use]
pub fn consensus_confidence(positive: usize, total: usize) -> ConsensusConfidence {
    let majority = positive.max(total - positive);
    let minority = total - majority;

    if minority == 0 {
        ConsensusConfidence::High
    } else if minority == 1 && majority > minority {
        ConsensusConfidence::Medium
    } else {
        ConsensusConfidence::Low
    }
}

/// Build the consensus over every model result.
///
/// Returns `None` when there are no results.
#[must_use]
pub fn build(results: &[ModelResult]) -> Option<ConsensusResult> {
    let probability = weighted_probability(results)?;

    let total = results.len();
    let positive = results.iter().filter(|r| r.prediction == 1).count();
    let majority = positive.max(total - positive);

    Some(ConsensusResult {
        probability: round_to(probability, 4),
        prediction: u8::from(probability >= CONSENSUS_THRESHOLD),
        risk_level: risk_level(probability),
        agreement: format!("{majority}/{total}"),
        confidence: consensus_confidence(positive, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelConfidence;

    fn result(probability: f64, auc: Option<f64>, threshold: f64) -> ModelResult {
        ModelResult {
            name: format!("model_{probability}"),
            algo: "XGBoost".to_string(),
            probability: round_to(probability, 4),
            prediction: u8::from(probability >= threshold),
            auc,
            threshold,
            confidence: ModelConfidence::from_distance((probability - threshold).abs()),
            raw_probability: probability,
        }
    }

    #[test]
    fn test_auc_weighted_average() {
        let results = [
            result(0.8, Some(0.9), 0.5),
            result(0.3, Some(0.7), 0.5),
            result(0.6, Some(0.85), 0.5),
        ];
        let expected = (0.8 * 0.9 + 0.3 * 0.7 + 0.6 * 0.85) / (0.9 + 0.7 + 0.85);
        let actual = weighted_probability(&results).expect("Should aggregate");
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn test_missing_auc_falls_back_to_mean() {
        let results = [
            result(0.8, Some(0.9), 0.5),
            result(0.3, None, 0.5),
            result(0.4, Some(0.8), 0.5),
        ];
        let actual = weighted_probability(&results).expect("Should aggregate");
        assert!((actual - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_auc_sum_falls_back_to_mean() {
        let results = [result(0.2, Some(0.0), 0.5), result(0.6, Some(0.0), 0.5)];
        let actual = weighted_probability(&results).expect("Should aggregate");
        assert!((actual - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_results_have_no_consensus() {
        assert!(weighted_probability(&[]).is_none());
        assert!(build(&[]).is_none());
    }

    #[test]
    fn test_consensus_threshold_boundary() {
        let at = build(&[result(0.42, None, 0.5)]).expect("Should aggregate");
        assert_eq!(at.prediction, 1);

        let below = build(&[result(0.419_999, None, 0.5)]).expect("Should aggregate");
        assert_eq!(below.prediction, 0);
    }

    #[test]
    fn test_reported_probability_agrees_with_call_below_threshold() {
        let consensus = build(&[result(0.41995, None, 0.5)]).expect("Should aggregate");
        assert_eq!(consensus.probability, 0.4199);
        assert_eq!(consensus.prediction, 0);
        assert_eq!(consensus.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_risk_band_boundaries() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(0.199_99), RiskLevel::Low);
        assert_eq!(risk_level(0.2), RiskLevel::Moderate);
        assert_eq!(risk_level(0.419_99), RiskLevel::Moderate);
        assert_eq!(risk_level(0.42), RiskLevel::High);
        assert_eq!(risk_level(0.699_99), RiskLevel::High);
        assert_eq!(risk_level(0.7), RiskLevel::VeryHigh);
        assert_eq!(risk_level(1.0), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_unanimous_votes() {
        let positive = build(&[
            result(0.9, Some(0.9), 0.5),
            result(0.8, Some(0.8), 0.5),
            result(0.7, Some(0.85), 0.5),
        ])
        .expect("Should aggregate");
        assert_eq!(positive.confidence, ConsensusConfidence::High);
        assert_eq!(positive.agreement, "3/3");

        let negative = build(&[result(0.1, None, 0.5), result(0.2, None, 0.5)])
            .expect("Should aggregate");
        assert_eq!(negative.confidence, ConsensusConfidence::High);
        assert_eq!(negative.agreement, "2/2");
    }

    #[test]
    fn test_vote_split_confidence() {
        assert_eq!(consensus_confidence(1, 1), ConsensusConfidence::High);
        assert_eq!(consensus_confidence(0, 4), ConsensusConfidence::High);
        assert_eq!(consensus_confidence(1, 3), ConsensusConfidence::Medium);
        assert_eq!(consensus_confidence(2, 3), ConsensusConfidence::Medium);
        assert_eq!(consensus_confidence(3, 4), ConsensusConfidence::Medium);
        assert_eq!(consensus_confidence(2, 4), ConsensusConfidence::Low);
        assert_eq!(consensus_confidence(2, 5), ConsensusConfidence::Low);
        assert_eq!(consensus_confidence(1, 2), ConsensusConfidence::Low);
    }

    #[test]
    fn test_two_model_split_scenario() {
        let results = [result(0.80, Some(0.90), 0.5), result(0.30, Some(0.70), 0.5)];
        let weighted = weighted_probability(&results).expect("Should aggregate");
        assert!((weighted - (0.8 * 0.9 + 0.3 * 0.7) / 1.6).abs() < 1e-12);

        let consensus = build(&results).expect("Should aggregate");
        assert!((consensus.probability - 0.58125).abs() <= 5e-5 + 1e-12);
        assert_eq!(consensus.prediction, 1);
        assert_eq!(consensus.risk_level, RiskLevel::High);
        assert_eq!(consensus.agreement, "1/2");
        assert_eq!(consensus.confidence, ConsensusConfidence::Low);
    }

    #[test]
    fn test_per_model_threshold_drives_votes() {
        // 0.45 is positive against 0.4 but negative against 0.5.
        let consensus = build(&[
            result(0.45, None, 0.4),
            result(0.45, None, 0.5),
            result(0.45, None, 0.5),
        ])
        .expect("Should aggregate");
        assert_eq!(consensus.agreement, "2/3");
        assert_eq!(consensus.confidence, ConsensusConfidence::Medium);
        assert_eq!(consensus.prediction, 1);
    }
}
