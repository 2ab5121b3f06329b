use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::rewrite::RewriteError;
use crate::analysis::simulation::SimulationError;
use crate::inference::InferenceError;
use crate::store::insights::InsightError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Inference error: {0}")]
    Inference(InferenceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PreconditionFailed(msg) => (
                StatusCode::CONFLICT,
                "PRECONDITION_FAILED",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Inference(InferenceError::InvalidInput(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_INPUT",
                msg.clone(),
            ),
            AppError::Inference(e @ InferenceError::Timeout { .. }) => {
                tracing::warn!("Inference timeout: {e}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "INFERENCE_TIMEOUT",
                    e.to_string(),
                )
            }
            AppError::Inference(e) => {
                tracing::error!("Inference error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "INFERENCE_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Inference(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("Record {id} not found")),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Corrupt(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<SimulationError> for AppError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::NoSession => {
                tracing::error!("simulate called before any analysis session existed");
                AppError::Internal(anyhow::Error::new(err))
            }
            SimulationError::Precondition => AppError::PreconditionFailed(err.to_string()),
            SimulationError::EmptyCandidate => AppError::Validation(err.to_string()),
            SimulationError::Superseded => AppError::Conflict(err.to_string()),
            SimulationError::Inference(e) => AppError::Inference(e),
        }
    }
}

impl From<RewriteError> for AppError {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::NoSession
            | RewriteError::MatchUnavailable
            | RewriteError::MissingResume
            | RewriteError::MissingJobDescription => AppError::PreconditionFailed(err.to_string()),
            RewriteError::IncompleteProfile(_) => AppError::Validation(err.to_string()),
            RewriteError::Inference(e) => AppError::Inference(e),
            RewriteError::DiffTask(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<InsightError> for AppError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::MissingResume => AppError::PreconditionFailed(err.to_string()),
            InsightError::Store(e) => e.into(),
            InsightError::Inference(e) => AppError::Inference(e),
        }
    }
}
