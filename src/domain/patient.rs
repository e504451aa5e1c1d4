//! Patient data types for cardiac risk prediction.
//!
//! Based on the 13 clinical attributes of the UCI heart disease schema.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw patient form as submitted by the client.
///
/// Every field arrives as a plain number. Categorical fields are checked for
/// integrality and range when the form is validated into a [`PatientInput`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct PatientForm {
    /// Age in years (18-120)
    pub age: f64,

    /// Sex: 0 = female, 1 = male
    pub sex: f64,

    /// Chest pain type (1-4, 4 = asymptomatic)
    pub chest_pain_type: f64,

    /// Resting blood pressure in mmHg (60-250)
    pub bp: f64,

    /// Serum cholesterol in mg/dL (50-700)
    pub cholesterol: f64,

    /// Fasting blood sugar > 120 mg/dL: 0 = no, 1 = yes
    pub fbs_over_120: f64,

    /// Resting ECG results (0-2)
    pub ekg_results: f64,

    /// Maximum heart rate achieved (60-220)
    pub max_hr: f64,

    /// Exercise-induced angina: 0 = no, 1 = yes
    pub exercise_angina: f64,

    /// ST depression induced by exercise relative to rest (0-7)
    pub st_depression: f64,

    /// Slope of the peak exercise ST segment (1-3)
    pub slope_of_st: f64,

    /// Number of major vessels colored by fluoroscopy (0-3)
    pub number_of_vessels_fluro: f64,

    /// Thallium stress test result (3 = normal, 6 = fixed defect, 7 = reversible defect)
    pub thallium: f64,
}

/// Validated clinical input.
///
/// Only obtainable through [`PatientForm::validate`], so every value is
/// known to be within its declared range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientInput {
    pub(crate) age: f64,
    pub(crate) sex: u8,
    pub(crate) chest_pain_type: u8,
    pub(crate) bp: f64,
    pub(crate) cholesterol: f64,
    pub(crate) fbs_over_120: u8,
    pub(crate) ekg_results: u8,
    pub(crate) max_hr: f64,
    pub(crate) exercise_angina: u8,
    pub(crate) st_depression: f64,
    pub(crate) slope_of_st: u8,
    pub(crate) number_of_vessels_fluro: u8,
    pub(crate) thallium: u8,
}

/// Allowed thallium test codes.
pub const THALLIUM_CODES: [u8; 3] = [3, 6, 7];

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every validation failure found in a single form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Whether the given field was rejected.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
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

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field errors while reading a form.
#[derive(Default)]
struct FieldChecker {
    errors: Vec<FieldError>,
}

impl FieldChecker {
    fn reject(&mut self, field: &'static str, message: String) {
        self.errors.push(FieldError { field, message });
    }

    fn finite(&mut self, field: &'static str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.reject(field, format!("{field} must be a finite number"));
            false
        }
    }

    fn continuous(&mut self, field: &'static str, value: f64, min: f64, max: f64) -> f64 {
        if self.finite(field, value) && !(min..=max).contains(&value) {
            self.reject(field, format!("{field} {value} out of range [{min}, {max}]"));
        }
        value
    }

    fn integer(&mut self, field: &'static str, value: f64) -> Option<u8> {
        if !self.finite(field, value) {
            return None;
        }
        if value.fract() != 0.0 {
            self.reject(field, format!("{field} {value} must be an integer"));
            return None;
        }
        if !(0.0..=f64::from(u8::MAX)).contains(&value) {
            self.reject(field, format!("{field} {value} out of range"));
            return None;
        }
        Some(value as u8)
    }

    fn categorical(&mut self, field: &'static str, value: f64, min: u8, max: u8) -> u8 {
        match self.integer(field, value) {
            Some(v) if (min..=max).contains(&v) => v,
            Some(v) => {
                self.reject(field, format!("{field} {v} out of range [{min}, {max}]"));
                v
            }
            None => 0,
        }
    }

    fn one_of(&mut self, field: &'static str, value: f64, allowed: &[u8]) -> u8 {
        match self.integer(field, value) {
            Some(v) if allowed.contains(&v) => v,
            Some(v) => {
                self.reject(field, format!("{field} {v} must be one of {allowed:?}"));
                v
            }
            None => 0,
        }
    }
}

impl PatientForm {
    /// Validate every field against its closed range.
    ///
    /// # Errors
    /// Returns all field violations at once; nothing is clamped.
    pub fn validate(&self) -> Result<PatientInput, ValidationErrors> {
        let mut check = FieldChecker::default();

        let input = PatientInput {
            age: check.continuous("age", self.age, 18.0, 120.0),
            sex: check.categorical("sex", self.sex, 0, 1),
            chest_pain_type: check.categorical("chest_pain_type", self.chest_pain_type, 1, 4),
            bp: check.continuous("bp", self.bp, 60.0, 250.0),
            cholesterol: check.continuous("cholesterol", self.cholesterol, 50.0, 700.0),
            fbs_over_120: check.categorical("fbs_over_120", self.fbs_over_120, 0, 1),
            ekg_results: check.categorical("ekg_results", self.ekg_results, 0, 2),
            max_hr: check.continuous("max_hr", self.max_hr, 60.0, 220.0),
            exercise_angina: check.categorical("exercise_angina", self.exercise_angina, 0, 1),
            st_depression: check.continuous("st_depression", self.st_depression, 0.0, 7.0),
            slope_of_st: check.categorical("slope_of_st", self.slope_of_st, 1, 3),
            number_of_vessels_fluro: check.categorical(
                "number_of_vessels_fluro",
                self.number_of_vessels_fluro,
                0,
                3,
            ),
            thallium: check.one_of("thallium", self.thallium, &THALLIUM_CODES),
        };

        if check.errors.is_empty() {
            Ok(input)
        } else {
            Err(ValidationErrors(check.errors))
        }
    }
}

impl PatientInput {
    /// The raw fields in training order, widened to `f64`.
    #[must_use]
    pub fn raw_values(&self) -> [f64; 13] {
        [
            self.age,
            f64::from(self.sex),
            f64::from(self.chest_pain_type),
            self.bp,
            self.cholesterol,
            f64::from(self.fbs_over_120),
            f64::from(self.ekg_results),
            self.max_hr,
            f64::from(self.exercise_angina),
            self.st_depression,
            f64::from(self.slope_of_st),
            f64::from(self.number_of_vessels_fluro),
            f64::from(self.thallium),
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn typical_form() -> PatientForm {
        PatientForm {
            age: 55.0,
            sex: 1.0,
            chest_pain_type: 4.0,
            bp: 140.0,
            cholesterol: 240.0,
            fbs_over_120: 0.0,
            ekg_results: 2.0,
            max_hr: 150.0,
            exercise_angina: 1.0,
            st_depression: 1.5,
            slope_of_st: 2.0,
            number_of_vessels_fluro: 1.0,
            thallium: 7.0,
        }
    }

    #[test]
    fn test_validation_accepts_typical_form() {
        let input = typical_form().validate().expect("Should validate");
        assert_eq!(input.chest_pain_type, 4);
        assert_eq!(input.thallium, 7);
        assert!((input.age - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validation_accepts_range_bounds() {
        let form = PatientForm {
            age: 18.0,
            bp: 250.0,
            cholesterol: 50.0,
            max_hr: 220.0,
            st_depression: 0.0,
            ..typical_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_every_violation() {
        let form = PatientForm {
            age: 10.0,
            sex: 2.0,
            cholesterol: 701.0,
            ..typical_form()
        };
        let errors = form.validate().expect_err("Should reject");

        assert_eq!(errors.len(), 3);
        assert!(errors.contains("age"));
        assert!(errors.contains("sex"));
        assert!(errors.contains("cholesterol"));
        assert!(errors.to_string().contains("age 10 out of range [18, 120]"));
    }

    #[test]
    fn test_validation_rejects_fractional_categories() {
        let form = PatientForm {
            chest_pain_type: 2.5,
            ..typical_form()
        };
        let errors = form.validate().expect_err("Should reject");
        assert!(errors.contains("chest_pain_type"));
        assert!(errors.0[0].message.contains("must be an integer"));
    }

    #[test]
    fn test_validation_rejects_unknown_thallium_code() {
        for code in [4.0, 5.0, 2.0, 8.0] {
            let form = PatientForm {
                thallium: code,
                ..typical_form()
            };
            let errors = form.validate().expect_err("Should reject");
            assert!(errors.contains("thallium"), "thallium {code} accepted");
        }
    }

    #[test]
    fn test_validation_rejects_non_finite_values() {
        let form = PatientForm {
            bp: f64::NAN,
            max_hr: f64::INFINITY,
            ..typical_form()
        };
        let errors = form.validate().expect_err("Should reject");
        assert!(errors.contains("bp"));
        assert!(errors.contains("max_hr"));
    }

    #[test]
    fn test_negative_category_is_rejected() {
        let form = PatientForm {
            number_of_vessels_fluro: -1.0,
            ..typical_form()
        };
        assert!(form.validate().expect_err("Should reject").contains("number_of_vessels_fluro"));
    }

    #[test]
    fn test_form_deserializes_integers_and_floats() {
        let json = r#"{
            "age": 61, "sex": 1, "chest_pain_type": 3, "bp": 130.5,
            "cholesterol": 210, "fbs_over_120": 0, "ekg_results": 1.0,
            "max_hr": 140, "exercise_angina": 0, "st_depression": 0.4,
            "slope_of_st": 1, "number_of_vessels_fluro": 0, "thallium": 3
        }"#;
        let form: PatientForm = serde_json::from_str(json).expect("Should parse");
        let input = form.validate().expect("Should validate");
        assert_eq!(input.ekg_results, 1);
        assert!((input.bp - 130.5).abs() < f64::EPSILON);
    }
}
