//! Interview Context Builder — immutable template snapshot for one session.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{
    EvaluationCriterionRow, ExpectedSkillRow, InterviewAttemptRow, InterviewRow,
    RoleResponsibilityRow,
};

/// A single weighted evaluation criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub description: String,
    pub weight: i32,
}

/// A skill the interviewer is expected to assess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub proficiency_level: Option<String>,
}

/// Immutable snapshot of an interview template, built once per session
/// start and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewContext {
    pub interview_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub criteria: Vec<Criterion>,
    pub skills: Vec<Skill>,
    pub responsibilities: Vec<String>,
}

/// Fetches an attempt row; `NotFound` when the id does not resolve.
pub async fn load_attempt(
    pool: &PgPool,
    attempt_id: Uuid,
) -> Result<InterviewAttemptRow, AppError> {
    sqlx::query_as::<_, InterviewAttemptRow>("SELECT * FROM interview_attempts WHERE id = $1")
        .bind(attempt_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview attempt {attempt_id} not found")))
}

/// Builds the context snapshot for an attempt: the attempt's interview plus
/// its three child collections in authoring order. Pure read; no side
/// effects.
pub async fn load_context(pool: &PgPool, attempt_id: Uuid) -> Result<InterviewContext, AppError> {
    let attempt = load_attempt(pool, attempt_id).await?;

    let interview = sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
        .bind(attempt.interview_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Interview {} not found", attempt.interview_id))
        })?;

    let criteria = sqlx::query_as::<_, EvaluationCriterionRow>(
        "SELECT * FROM evaluation_criteria WHERE interview_id = $1 ORDER BY position",
    )
    .bind(interview.id)
    .fetch_all(pool)
    .await?;

    let skills = sqlx::query_as::<_, ExpectedSkillRow>(
        "SELECT * FROM expected_skills WHERE interview_id = $1 ORDER BY position",
    )
    .bind(interview.id)
    .fetch_all(pool)
    .await?;

    let responsibilities = sqlx::query_as::<_, RoleResponsibilityRow>(
        "SELECT * FROM role_responsibilities WHERE interview_id = $1 ORDER BY position",
    )
    .bind(interview.id)
    .fetch_all(pool)
    .await?;

    Ok(InterviewContext {
        interview_id: interview.id,
        title: interview.title,
        description: interview.description,
        duration_minutes: interview.duration_minutes,
        criteria: criteria
            .into_iter()
            .map(|c| Criterion {
                name: c.criterion_name,
                description: c.description,
                weight: c.weight,
            })
            .collect(),
        skills: skills
            .into_iter()
            .map(|s| Skill {
                name: s.skill_name,
                proficiency_level: s.proficiency_level,
            })
            .collect(),
        responsibilities: responsibilities
            .into_iter()
            .map(|r| r.responsibility)
            .collect(),
    })
}
