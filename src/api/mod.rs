//! HTTP surface.
//!
//! Routes:
//! - `POST /predict`: consensus prediction for one patient
//! - `GET /models`: metadata of every loaded model
//! - `GET /health`: liveness and loaded model names

mod error;

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::{HealthReport, PredictionService};
use crate::domain::{Diagnosis, ModelInfo, PatientForm};
use crate::HeartGuardError;

pub use error::{ApiError, FieldDetail};

/// Build the application router.
pub fn router(service: PredictionService, allowed_origins: &[HeaderValue]) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/models", get(models))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Credentialed CORS for the configured origins.
///
/// Methods and headers are mirrored from the preflight request, since a
/// wildcard is not allowed together with credentials.
#[must_use]
pub fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins.iter().cloned()))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn predict(
    State(service): State<PredictionService>,
    payload: Result<Json<PatientForm>, JsonRejection>,
) -> Result<Json<Diagnosis>, ApiError> {
    let Json(form) = payload.map_err(|rejection| {
        tracing::warn!("Rejected /predict body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    service.predict(&form).map(Json).map_err(|e| {
        match &e {
            HeartGuardError::Validation(errors) => {
                tracing::warn!("Rejected patient record: {} invalid field(s)", errors.len());
            }
            other => tracing::warn!("Prediction failed: {}", other),
        }
        ApiError::from(e)
    })
}

async fn models(State(service): State<PredictionService>) -> Json<BTreeMap<String, ModelInfo>> {
    Json(service.model_catalog())
}

async fn health(State(service): State<PredictionService>) -> Json<HealthReport> {
    Json(service.health())
}
