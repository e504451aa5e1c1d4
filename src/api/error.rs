//! HTTP error mapping.
//!
//! Every failure is answered with a JSON body carrying a `detail` member:
//! a list of `{field, message}` entries for input problems, a string
//! otherwise.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::domain::ValidationErrors;
use crate::HeartGuardError;

/// One entry of a 422 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDetail {
    pub field: String,
    pub message: String,
}

/// Error returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Field values outside their allowed domain
    Validation(ValidationErrors),
    /// Body could not be decoded into the request type
    Body(JsonRejection),
    /// No model can serve the request
    Unavailable(String),
    /// Any other failure
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Body(JsonRejection::MissingJsonContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Body(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HeartGuardError> for ApiError {
    fn from(err: HeartGuardError) -> Self {
        match err {
            HeartGuardError::Validation(errors) => Self::Validation(errors),
            HeartGuardError::NoModelsAvailable | HeartGuardError::NoModelsLoaded(_) => {
                Self::Unavailable(err.to_string())
            }
            HeartGuardError::ModelLoad(_) | HeartGuardError::Scoring { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => {
                let details: Vec<FieldDetail> = errors
                    .0
                    .into_iter()
                    .map(|e| FieldDetail {
                        field: e.field.to_string(),
                        message: e.message,
                    })
                    .collect();
                json!({ "detail": details })
            }
            Self::Body(JsonRejection::MissingJsonContentType(rejection)) => {
                json!({ "detail": rejection.body_text() })
            }
            Self::Body(rejection) => json!({
                "detail": [FieldDetail {
                    field: "body".to_string(),
                    message: rejection.body_text(),
                }]
            }),
            Self::Unavailable(message) => json!({ "detail": message }),
            Self::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                json!({ "detail": message })
            }
        };
        (status, Json(body)).into_response()
    }
}
