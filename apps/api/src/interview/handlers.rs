//! Axum route handlers for the interview session API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::context::{load_attempt, load_context, InterviewContext};
use crate::interview::evaluation::{evaluate, Evaluation};
use crate::interview::results::finalize_attempt;
use crate::interview::session::Session;
use crate::models::interview::AttemptStatus;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub attempt_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub attempt_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub attempt_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EndSessionRequest {
    pub attempt_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub result_id: Uuid,
    pub evaluation: Evaluation,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub attempt_id: Uuid,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

#[derive(Debug, Serialize)]
pub struct SubmitResultResponse {
    pub result_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub context: InterviewContext,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/session/start
///
/// Builds the context snapshot, opens the backend conversation, and
/// registers the session. Nothing is registered when the backend fails.
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, AppError> {
    let attempt_id = request.attempt_id;

    // Fail fast before paying for a backend call; create() below still
    // rejects the losing side of a concurrent double-start.
    if state.sessions.get(attempt_id).await.is_ok() {
        return Err(AppError::SessionAlreadyActive(attempt_id));
    }

    let attempt = load_attempt(&state.db, attempt_id).await?;
    if matches!(attempt.status.as_str(), "COMPLETED" | "CANCELLED") {
        return Err(AppError::Validation(format!(
            "Attempt {attempt_id} is {} and cannot start a session",
            attempt.status
        )));
    }

    let context = load_context(&state.db, attempt_id).await?;

    let (greeting, session) = Session::start(&state.llm, context)
        .await
        .map_err(AppError::from_backend)?;

    state.sessions.create(attempt_id, session).await?;

    if attempt.status == AttemptStatus::Scheduled.as_str() {
        sqlx::query("UPDATE interview_attempts SET status = $1, started_at = NOW() WHERE id = $2")
            .bind(AttemptStatus::InProgress.as_str())
            .bind(attempt_id)
            .execute(&state.db)
            .await?;
    }

    Ok(Json(StartSessionResponse {
        attempt_id,
        message: greeting,
    }))
}

/// POST /api/v1/interviews/session/message
///
/// Forwards one candidate message to the live session and returns the AI's
/// reply. The per-session lock serializes concurrent turns for one attempt.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let handle = state.sessions.get(request.attempt_id).await?;
    let mut session = handle.lock().await;

    let reply = session
        .turn(&request.message)
        .await
        .map_err(AppError::from_backend)?;

    Ok(Json(SendMessageResponse { message: reply }))
}

/// POST /api/v1/interviews/session/end
///
/// Renders the transcript, synthesizes the evaluation, persists the result,
/// and destroys the session. On `EvaluationFailed` the session stays
/// registered so the call can be retried.
pub async fn handle_end_session(
    State(state): State<AppState>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<EndSessionResponse>, AppError> {
    let attempt_id = request.attempt_id;
    let handle = state.sessions.get(attempt_id).await?;

    // Hold the session lock across evaluation so a late concurrent turn
    // cannot interleave with it.
    let session = handle.lock().await;
    let transcript_text = session.rendered_transcript();
    let evaluation = evaluate(&state.llm, &session.context, &transcript_text).await?;
    drop(session);

    let result_id = finalize_attempt(&state.db, attempt_id, &evaluation).await?;
    state.sessions.destroy(attempt_id).await?;

    Ok(Json(EndSessionResponse {
        result_id,
        evaluation,
    }))
}

/// POST /api/v1/interviews/results
///
/// Manual submission path: accepts an evaluation-shaped payload with no
/// session involved and applies the same upsert as session end. This is
/// also the recovery route for attempts stranded by a process restart.
pub async fn handle_submit_result(
    State(state): State<AppState>,
    Json(request): Json<SubmitResultRequest>,
) -> Result<Json<SubmitResultResponse>, AppError> {
    if !request.evaluation.scores_in_range() {
        return Err(AppError::Validation(
            "evaluation scores must lie within [1, 10]".to_string(),
        ));
    }

    let result_id = finalize_attempt(&state.db, request.attempt_id, &request.evaluation).await?;

    Ok(Json(SubmitResultResponse { result_id }))
}

/// GET /api/v1/interviews/:attempt_id/context
///
/// Read-only context fetch; no session side effect.
pub async fn handle_get_context(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<ContextResponse>, AppError> {
    let context = load_context(&state.db, attempt_id).await?;
    Ok(Json(ContextResponse { context }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::evaluation::Recommendation;

    #[test]
    fn test_submit_result_request_deserializes_flattened_evaluation() {
        let json = r#"{
            "attempt_id": "8c2d8a8e-3a54-4b9f-9a44-6f0d2f6e7b11",
            "overall_rating": 8.5,
            "technical_score": 9.0,
            "communication_score": 8.0,
            "problem_solving_score": 8.5,
            "feedback": "Excellent candidate.",
            "strengths": "Clear communicator.",
            "weaknesses": "Limited ops exposure.",
            "recommendation": "Highly Recommended"
        }"#;

        let request: SubmitResultRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.evaluation.overall_rating, 8.5);
        assert_eq!(
            request.evaluation.recommendation,
            Recommendation::HighlyRecommended
        );
        assert!(request.evaluation.scores_in_range());
    }

    #[test]
    fn test_submit_result_request_rejects_unknown_recommendation() {
        let json = r#"{
            "attempt_id": "8c2d8a8e-3a54-4b9f-9a44-6f0d2f6e7b11",
            "overall_rating": 8.5,
            "technical_score": 9.0,
            "communication_score": 8.0,
            "problem_solving_score": 8.5,
            "feedback": "x",
            "strengths": "y",
            "weaknesses": "z",
            "recommendation": "Under Review"
        }"#;

        assert!(serde_json::from_str::<SubmitResultRequest>(json).is_err());
    }

    #[test]
    fn test_submit_result_request_rejects_missing_scores() {
        let json = r#"{
            "attempt_id": "8c2d8a8e-3a54-4b9f-9a44-6f0d2f6e7b11",
            "overall_rating": 8.5,
            "recommendation": "Recommended"
        }"#;

        assert!(serde_json::from_str::<SubmitResultRequest>(json).is_err());
    }
}
