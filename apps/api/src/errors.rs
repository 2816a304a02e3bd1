use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::interview::registry::SessionError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Interview session already active for attempt {0}")]
    SessionAlreadyActive(Uuid),

    #[error("Interview session not started for attempt {0}")]
    SessionNotStarted(Uuid),

    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("AI backend timed out")]
    BackendTimeout,

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps an LLM client failure on the conversational path (start/turn).
    /// Evaluation has its own mapping: see `interview::evaluation`.
    pub fn from_backend(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => AppError::BackendTimeout,
            other => AppError::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::AlreadyActive(id) => AppError::SessionAlreadyActive(id),
            SessionError::NotStarted(id) => AppError::SessionNotStarted(id),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::SessionAlreadyActive(id) => (
                StatusCode::CONFLICT,
                "SESSION_ALREADY_ACTIVE",
                format!("A session is already active for attempt {id}"),
            ),
            AppError::SessionNotStarted(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_STARTED",
                format!("No session started for attempt {id}. Start the interview first."),
            ),
            AppError::BackendUnavailable(msg) => {
                tracing::error!("AI backend unavailable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNAVAILABLE",
                    "The AI backend could not be reached".to_string(),
                )
            }
            AppError::BackendTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "BACKEND_TIMEOUT",
                "The AI backend did not respond in time".to_string(),
            ),
            AppError::EvaluationFailed(msg) => {
                tracing::error!("Evaluation failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EVALUATION_FAILED",
                    "The evaluation could not be generated; end the session again to retry"
                        .to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
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
