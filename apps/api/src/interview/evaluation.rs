//! Evaluation Synthesizer — turns a finished transcript into a bounded
//! evaluation record.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::interview::context::InterviewContext;
use crate::interview::prompts::build_evaluation_prompt;
use crate::llm_client::{prompts::JSON_ONLY_SYSTEM, LlmClient};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// Closed set of hiring recommendations. The wire form is the exact
/// human-readable label, so an unknown label fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Highly Recommended")]
    HighlyRecommended,
    #[serde(rename = "Recommended")]
    Recommended,
    #[serde(rename = "Maybe")]
    Maybe,
    #[serde(rename = "Not Recommended")]
    NotRecommended,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HighlyRecommended => "Highly Recommended",
            Recommendation::Recommended => "Recommended",
            Recommendation::Maybe => "Maybe",
            Recommendation::NotRecommended => "Not Recommended",
        }
    }
}

/// Structured scoring and feedback, produced at most once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub overall_rating: f64,
    pub technical_score: f64,
    pub communication_score: f64,
    pub problem_solving_score: f64,
    pub feedback: String,
    pub strengths: String,
    pub weaknesses: String,
    pub recommendation: Recommendation,
}

impl Evaluation {
    /// True when every score is finite and lies within the [1,10] contract.
    pub fn scores_in_range(&self) -> bool {
        [
            self.overall_rating,
            self.technical_score,
            self.communication_score,
            self.problem_solving_score,
        ]
        .iter()
        .all(|s| s.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(s))
    }
}

/// The deterministic record substituted when the model's answer cannot be
/// parsed or validated. Guarantees in-range scores and non-empty text,
/// independent of transcript content.
pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        overall_rating: 7.0,
        technical_score: 7.0,
        communication_score: 7.0,
        problem_solving_score: 7.0,
        feedback: "The candidate showed good understanding and communication skills during the interview.".to_string(),
        strengths: "Good communication and technical understanding.".to_string(),
        weaknesses: "Could improve on providing more detailed examples.".to_string(),
        recommendation: Recommendation::Recommended,
    }
}

/// Synthesizes the final evaluation from the rendered transcript via a
/// single stateless generation call.
///
/// A malformed-but-received answer (bad JSON, unknown label, out-of-range
/// score) falls back to `fallback_evaluation` so the workflow always
/// completes with some evaluation. A transport failure surfaces as
/// `EvaluationFailed` instead — nothing is substituted and nothing gets
/// written, so the caller can retry.
pub async fn evaluate(
    llm: &LlmClient,
    context: &InterviewContext,
    transcript_text: &str,
) -> Result<Evaluation, AppError> {
    let prompt = build_evaluation_prompt(context, transcript_text);

    match llm.call_json::<Evaluation>(&prompt, JSON_ONLY_SYSTEM).await {
        Ok(evaluation) if evaluation.scores_in_range() => Ok(evaluation),
        Ok(_) => {
            warn!("Evaluation scores out of range; using fallback");
            Ok(fallback_evaluation())
        }
        Err(e) if e.is_transport() => Err(AppError::EvaluationFailed(e.to_string())),
        Err(e) => {
            warn!("Evaluation response unparseable ({e}); using fallback");
            Ok(fallback_evaluation())
        }
    }
}
