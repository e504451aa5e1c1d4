//! Diagnosis result types.
//!
//! Represents the per-model scores and the multi-model consensus returned
//! for one patient.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Disclaimer attached to every prediction.
pub const DISCLAIMER: &str =
    "This tool is an academic project. It does not constitute medical advice in any way.";

/// Risk level classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of heart disease
    #[serde(rename = "low")]
    Low,
    /// Moderate risk, monitoring recommended
    #[serde(rename = "moderate")]
    Moderate,
    /// High risk, intervention recommended
    #[serde(rename = "high")]
    High,
    /// Very high risk
    #[serde(rename = "very high")]
    VeryHigh,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY HIGH"),
        }
    }
}

/// How far a single model's probability sits from its own threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelConfidence {
    #[serde(rename = "very high")]
    VeryHigh,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "moderate")]
    Moderate,
}

impl ModelConfidence {
    /// Classify the distance `|probability - threshold|`.
    #[must_use]
    pub fn from_distance(distance: f64) -> Self {
        if distance > 0.3 {
            Self::VeryHigh
        } else if distance > 0.15 {
            Self::High
        } else {
            Self::Moderate
        }
    }
}

/// Agreement-based confidence of the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusConfidence {
    High,
    Medium,
    Low,
}

/// Output of one model for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Model identifier (directory name)
    pub name: String,

    /// Model family label
    pub algo: String,

    /// Probability rounded to 4 decimals
    pub probability: f64,

    /// Binary prediction against `threshold`
    pub prediction: u8,

    pub auc: Option<f64>,

    pub threshold: f64,

    pub confidence: ModelConfidence,

    /// Unrounded probability, used for the consensus
    #[serde(skip)]
    pub raw_probability: f64,
}

/// Aggregated decision over every model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Weighted probability rounded to 4 decimals
    pub probability: f64,

    pub prediction: u8,

    pub risk_level: RiskLevel,

    /// Majority size over model count, as "k/N"
    pub agreement: String,

    pub confidence: ConsensusConfidence,
}

/// Positive SHAP importances of the primary model, highest first.
///
/// Serialized as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureContributions(pub Vec<(String, f64)>);

impl FeatureContributions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names in ranking order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for FeatureContributions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Complete prediction returned for one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub consensus: ConsensusResult,

    pub models: Vec<ModelResult>,

    pub feature_contributions: FeatureContributions,

    pub processing_time_ms: f64,

    pub disclaimer: &'static str,
}

/// Round to `decimals` places on the exact decimal expansion of `value`.
///
/// A value stored just below a decimal half rounds down, so the result
/// never crosses a cut point the unrounded value did not reach.
#[must_use]
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
