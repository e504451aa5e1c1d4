//! Feature engineering for the boosted-tree models.
//!
//! The models were trained on the 13 raw clinical fields followed by 7
//! engineered ones, in exactly the order of [`FEATURE_NAMES`]. Derived values
//! are computed in double precision and then stored as `f32`, which is the
//! precision of the training matrix.

use super::PatientInput;

/// Number of raw clinical fields.
pub const RAW_FEATURE_COUNT: usize = 13;

/// Total length of a feature vector.
pub const FEATURE_COUNT: usize = 20;

/// Feature names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "chest_pain_type",
    "bp",
    "cholesterol",
    "fbs_over_120",
    "ekg_results",
    "max_hr",
    "exercise_angina",
    "st_depression",
    "slope_of_st",
    "number_of_vessels_fluro",
    "thallium",
    "hr_reserve",
    "bp_chol_ratio",
    "stress_score",
    "age_x_maxhr",
    "age_decade",
    "age_hr_ratio",
    "risk_composite",
];

/// Ordered model input derived from one patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    /// Build the full feature vector for a validated patient.
    #[must_use]
    pub fn from_patient(patient: &PatientInput) -> Self {
        let raw = patient.raw_values();
        let derived = engineered_features(patient);

        let mut values = [0.0_f32; FEATURE_COUNT];
        for (slot, value) in values.iter_mut().zip(raw.iter().chain(derived.iter())) {
            *slot = *value as f32;
        }
        Self(values)
    }

    /// Wrap already-ordered values.
    #[must_use]
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Look up a feature by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f32> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// Iterate over `(name, value)` pairs in training order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The 7 engineered features, in training order.
fn engineered_features(p: &PatientInput) -> [f64; FEATURE_COUNT - RAW_FEATURE_COUNT] {
    let hr_reserve = (220.0 - p.age) - p.max_hr;
    let bp_chol_ratio = p.bp / (p.cholesterol + 1.0);
    let stress_score = p.st_depression * if p.exercise_angina == 1 { 2.0 } else { 1.0 };
    let age_x_maxhr = p.age * p.max_hr;
    let age_decade = (p.age / 10.0).floor() * 10.0;
    let age_hr_ratio = p.age / p.max_hr;

    let risk_flags = [
        p.thallium == 7,
        p.chest_pain_type == 4,
        p.number_of_vessels_fluro > 0,
        p.exercise_angina == 1,
        p.slope_of_st >= 2,
    ];
    let risk_composite = risk_flags.iter().filter(|&&flag| flag).count() as f64;

    [
        hr_reserve,
        bp_chol_ratio,
        stress_score,
        age_x_maxhr,
        age_decade,
        age_hr_ratio,
        risk_composite,
    ]
}
