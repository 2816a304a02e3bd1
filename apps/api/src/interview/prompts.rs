// All LLM prompt constants and builders for the interview module.
// The evaluation call reuses the cross-cutting JSON-only fragment from
// llm_client::prompts as its system prompt.

use crate::interview::context::InterviewContext;

/// Interviewer instruction prompt, sent as the opening turn of the
/// conversation. Placeholders are filled by `build_interviewer_prompt`.
const INTERVIEWER_PROMPT_TEMPLATE: &str = r#"You are an experienced technical interviewer conducting an interview for the position: {title}.

Interview Description:
{description}

Duration: {duration_minutes} minutes

EVALUATION CRITERIA (assess the candidate on these):
{criteria}

EXPECTED SKILLS TO ASSESS:
{skills}

ROLE RESPONSIBILITIES TO DISCUSS:
{responsibilities}

YOUR ROLE AS INTERVIEWER:
1. Start with a warm greeting and ask the candidate to introduce themselves
2. Ask relevant technical questions based on the expected skills
3. Probe deeper based on candidate responses
4. Ask behavioral questions related to the role responsibilities
5. Ask problem-solving questions to assess critical thinking
6. Be professional, encouraging, and supportive
7. Keep track of time and ensure you cover all evaluation criteria
8. At the end, thank the candidate and let them know the interview is complete

INTERVIEWING GUIDELINES:
- Ask one question at a time
- Listen carefully to responses
- Follow up with clarifying questions
- Adjust difficulty based on candidate's level
- Be respectful and encouraging
- Take note of strengths and weaknesses
- Assess communication skills throughout

CONVERSATION FLOW:
1. Introduction and warm-up (2-3 minutes)
2. Technical questions (40% of time)
3. Behavioral questions (30% of time)
4. Problem-solving scenarios (20% of time)
5. Candidate questions and closing (10% of time)

After the interview is complete, you will be asked to provide evaluation results.

Begin the interview now."#;

/// Evaluator prompt template for the single-shot structured generation
/// call. Placeholders are filled by `build_evaluation_prompt`.
const EVALUATION_PROMPT_TEMPLATE: &str = r#"Based on the following interview conversation, provide a comprehensive evaluation of the candidate.

Interview Position: {title}

Evaluation Criteria:
{criteria}

Interview Conversation:
{transcript}

Provide the evaluation as a JSON object with this EXACT schema (no extra fields):
{
    "overall_rating": <number between 1-10>,
    "technical_score": <number between 1-10>,
    "communication_score": <number between 1-10>,
    "problem_solving_score": <number between 1-10>,
    "feedback": "<detailed overall feedback>",
    "strengths": "<key strengths observed>",
    "weaknesses": "<areas for improvement>",
    "recommendation": "<one of: 'Highly Recommended', 'Recommended', 'Maybe', 'Not Recommended'>"
}

Consider:
- Technical knowledge and skills demonstrated
- Communication clarity and professionalism
- Problem-solving approach and critical thinking
- Relevant experience and examples provided
- Cultural fit and enthusiasm
- How well they meet the evaluation criteria

Provide your evaluation:"#;

/// Builds the interviewer instruction prompt, rendering the three template
/// collections as bulleted lists in authoring order.
pub fn build_interviewer_prompt(context: &InterviewContext) -> String {
    INTERVIEWER_PROMPT_TEMPLATE
        .replace("{title}", &context.title)
        .replace("{description}", &context.description)
        .replace("{duration_minutes}", &context.duration_minutes.to_string())
        .replace("{criteria}", &render_criteria(context))
        .replace("{skills}", &render_skills(context))
        .replace("{responsibilities}", &render_responsibilities(context))
}

/// Builds the evaluator prompt over the rendered transcript.
pub fn build_evaluation_prompt(context: &InterviewContext, transcript: &str) -> String {
    EVALUATION_PROMPT_TEMPLATE
        .replace("{title}", &context.title)
        .replace("{criteria}", &render_criteria(context))
        .replace("{transcript}", transcript)
}

fn render_criteria(context: &InterviewContext) -> String {
    context
        .criteria
        .iter()
        .map(|c| format!("- {}: {} (Weight: {})", c.name, c.description, c.weight))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_skills(context: &InterviewContext) -> String {
    context
        .skills
        .iter()
        .map(|s| match &s.proficiency_level {
            Some(level) => format!("- {} ({level})", s.name),
            None => format!("- {}", s.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_responsibilities(context: &InterviewContext) -> String {
    context
        .responsibilities
        .iter()
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::context::{Criterion, Skill};
    use uuid::Uuid;

    fn fixture_context() -> InterviewContext {
        InterviewContext {
            interview_id: Uuid::new_v4(),
            title: "Senior Rust Engineer".to_string(),
            description: "Owns the storage layer of our platform.".to_string(),
            duration_minutes: 45,
            criteria: vec![
                Criterion {
                    name: "Systems design".to_string(),
                    description: "Can reason about distributed storage".to_string(),
                    weight: 3,
                },
                Criterion {
                    name: "Code quality".to_string(),
                    description: "Writes maintainable code".to_string(),
                    weight: 2,
                },
            ],
            skills: vec![
                Skill {
                    name: "Rust".to_string(),
                    proficiency_level: Some("Expert".to_string()),
                },
                Skill {
                    name: "PostgreSQL".to_string(),
                    proficiency_level: None,
                },
                Skill {
                    name: "Kubernetes".to_string(),
                    proficiency_level: Some("Intermediate".to_string()),
                },
            ],
            responsibilities: vec!["Design and operate the storage layer".to_string()],
        }
    }

    #[test]
    fn test_interviewer_prompt_includes_every_template_item_verbatim() {
        let context = fixture_context();
        let prompt = build_interviewer_prompt(&context);

        assert!(prompt.contains("Senior Rust Engineer"));
        assert!(prompt.contains("Owns the storage layer of our platform."));
        assert!(prompt.contains("Duration: 45 minutes"));
        // 2 criteria + 3 skills + 1 responsibility, all verbatim
        assert!(prompt.contains("- Systems design: Can reason about distributed storage (Weight: 3)"));
        assert!(prompt.contains("- Code quality: Writes maintainable code (Weight: 2)"));
        assert!(prompt.contains("- Rust (Expert)"));
        assert!(prompt.contains("- PostgreSQL"));
        assert!(prompt.contains("- Kubernetes (Intermediate)"));
        assert!(prompt.contains("- Design and operate the storage layer"));
    }

    #[test]
    fn test_interviewer_prompt_preserves_authoring_order() {
        let context = fixture_context();
        let prompt = build_interviewer_prompt(&context);

        let first = prompt.find("Systems design").unwrap();
        let second = prompt.find("Code quality").unwrap();
        assert!(first < second);

        let rust = prompt.find("- Rust").unwrap();
        let postgres = prompt.find("- PostgreSQL").unwrap();
        let kubernetes = prompt.find("- Kubernetes").unwrap();
        assert!(rust < postgres && postgres < kubernetes);
    }

    #[test]
    fn test_interviewer_prompt_contains_phase_plan() {
        let prompt = build_interviewer_prompt(&fixture_context());

        assert!(prompt.contains("Technical questions (40% of time)"));
        assert!(prompt.contains("Behavioral questions (30% of time)"));
        assert!(prompt.contains("Problem-solving scenarios (20% of time)"));
        assert!(prompt.contains("Candidate questions and closing (10% of time)"));
        assert!(prompt.contains("Ask one question at a time"));
    }

    #[test]
    fn test_skill_without_proficiency_has_no_parenthetical() {
        let prompt = build_interviewer_prompt(&fixture_context());
        assert!(prompt.contains("- PostgreSQL\n"));
        assert!(!prompt.contains("- PostgreSQL ("));
    }

    #[test]
    fn test_evaluation_prompt_embeds_title_criteria_and_transcript() {
        let context = fixture_context();
        let transcript = "AI Interviewer: Hello.\n\nCandidate: Hi there.";
        let prompt = build_evaluation_prompt(&context, transcript);

        assert!(prompt.contains("Interview Position: Senior Rust Engineer"));
        assert!(prompt.contains("- Systems design: Can reason about distributed storage (Weight: 3)"));
        assert!(prompt.contains(transcript));
        assert!(prompt.contains("\"overall_rating\""));
        assert!(prompt.contains("'Highly Recommended', 'Recommended', 'Maybe', 'Not Recommended'"));
    }
}
