#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a candidate's run through one interview template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Scheduled => "SCHEDULED",
            AttemptStatus::InProgress => "IN_PROGRESS",
            AttemptStatus::Completed => "COMPLETED",
            AttemptStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One weighted evaluation criterion of an interview template.
/// `position` preserves authoring order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationCriterionRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub position: i32,
    pub criterion_name: String,
    pub description: String,
    pub weight: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpectedSkillRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub position: i32,
    pub skill_name: String,
    pub proficiency_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleResponsibilityRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub position: i32,
    pub responsibility: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewAttemptRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
}

/// Durable evaluation record, 1:1 with an attempt (upserted on attempt_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewResultRow {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub overall_rating: f64,
    pub technical_score: Option<f64>,
    pub communication_score: Option<f64>,
    pub problem_solving_score: Option<f64>,
    pub feedback: String,
    pub strengths: String,
    pub weaknesses: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_status_serde_matches_as_str() {
        for status in [
            AttemptStatus::Scheduled,
            AttemptStatus::InProgress,
            AttemptStatus::Completed,
            AttemptStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
