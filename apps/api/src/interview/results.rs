//! Result Writer — persists the finalized evaluation and completes the
//! attempt.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluation::Evaluation;
use crate::models::interview::AttemptStatus;

/// Marks the attempt COMPLETED with a completion timestamp, then upserts
/// its single result row.
///
/// Both the session-end path and the manual submission path funnel through
/// here, so the semantics are identical: re-finalizing an attempt
/// overwrites its result instead of duplicating it.
pub async fn finalize_attempt(
    pool: &PgPool,
    attempt_id: Uuid,
    evaluation: &Evaluation,
) -> Result<Uuid, AppError> {
    let updated = sqlx::query(
        "UPDATE interview_attempts SET status = $1, completed_at = NOW() WHERE id = $2",
    )
    .bind(AttemptStatus::Completed.as_str())
    .bind(attempt_id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Interview attempt {attempt_id} not found"
        )));
    }

    // Upsert keyed on attempt_id: the row id survives an overwrite.
    let result_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO interview_results
            (id, attempt_id, overall_rating, technical_score, communication_score,
             problem_solving_score, feedback, strengths, weaknesses, recommendation)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (attempt_id) DO UPDATE SET
            overall_rating = EXCLUDED.overall_rating,
            technical_score = EXCLUDED.technical_score,
            communication_score = EXCLUDED.communication_score,
            problem_solving_score = EXCLUDED.problem_solving_score,
            feedback = EXCLUDED.feedback,
            strengths = EXCLUDED.strengths,
            weaknesses = EXCLUDED.weaknesses,
            recommendation = EXCLUDED.recommendation
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(attempt_id)
    .bind(evaluation.overall_rating)
    .bind(evaluation.technical_score)
    .bind(evaluation.communication_score)
    .bind(evaluation.problem_solving_score)
    .bind(&evaluation.feedback)
    .bind(&evaluation.strengths)
    .bind(&evaluation.weaknesses)
    .bind(evaluation.recommendation.as_str())
    .fetch_one(pool)
    .await?;

    info!("Recorded result {result_id} for attempt {attempt_id} (status COMPLETED)");

    Ok(result_id)
}
