//! Conversational Session Engine — one stateful interview conversation.

use serde::Serialize;
use tracing::debug;

use crate::interview::context::InterviewContext;
use crate::interview::prompts::build_interviewer_prompt;
use crate::llm_client::{Conversation, LlmClient, LlmError};

/// Who authored a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Ai,
    Candidate,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Append-only record of the conversation. No turn is ever edited or
/// removed.
#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Renders the transcript as labeled lines in turn order, blank-line
    /// separated, for the evaluation prompt.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| match t.speaker {
                Speaker::Ai => format!("AI Interviewer: {}", t.text),
                Speaker::Candidate => format!("Candidate: {}", t.text),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Live state for one in-progress attempt: the immutable context, the
/// append-only transcript, and the backend conversation handle.
#[derive(Debug)]
pub struct Session {
    pub context: InterviewContext,
    pub transcript: Transcript,
    conversation: Conversation,
}

impl Session {
    pub(crate) fn new(context: InterviewContext, conversation: Conversation) -> Self {
        Self {
            context,
            transcript: Transcript::default(),
            conversation,
        }
    }

    /// Opens the backend conversation with the interviewer instruction
    /// prompt and returns the AI's opening greeting together with the
    /// session. On failure nothing is registered anywhere and the session
    /// value is dropped.
    pub async fn start(
        llm: &LlmClient,
        context: InterviewContext,
    ) -> Result<(String, Session), LlmError> {
        let prompt = build_interviewer_prompt(&context);
        let mut session = Session::new(context, llm.conversation());
        let greeting = session.conversation.send(&prompt).await?;
        debug!(
            "Interview session opened for '{}' ({} criteria)",
            session.context.title,
            session.context.criteria.len()
        );
        session.transcript.push(Speaker::Ai, greeting.clone());
        Ok((greeting, session))
    }

    /// Forwards the candidate's message and returns the AI's reply. The
    /// transcript gains both turns only after the backend call succeeds, so
    /// a failed call never leaves it half-updated.
    pub async fn turn(&mut self, candidate_text: &str) -> Result<String, LlmError> {
        let reply = self.conversation.send(candidate_text).await?;
        self.record_exchange(candidate_text, &reply);
        Ok(reply)
    }

    /// Appends one candidate/AI exchange to the transcript.
    fn record_exchange(&mut self, candidate_text: &str, reply: &str) {
        self.transcript.push(Speaker::Candidate, candidate_text);
        self.transcript.push(Speaker::Ai, reply);
    }

    /// Renders the full transcript for the evaluation synthesizer. Does not
    /// tear the session down; the HTTP boundary owns destruction via the
    /// registry.
    pub fn rendered_transcript(&self) -> String {
        self.transcript.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmClient;
    use uuid::Uuid;

    fn test_context() -> InterviewContext {
        InterviewContext {
            interview_id: Uuid::new_v4(),
            title: "Platform Engineer".to_string(),
            description: "Distributed systems role".to_string(),
            duration_minutes: 60,
            criteria: vec![],
            skills: vec![],
            responsibilities: vec![],
        }
    }

    fn test_session() -> Session {
        let llm = LlmClient::new("test-key".to_string());
        Session::new(test_context(), llm.conversation())
    }

    #[test]
    fn test_transcript_starts_empty() {
        let session = test_session();
        assert!(session.transcript.is_empty());
    }

    #[test]
    fn test_opener_plus_n_exchanges_yields_one_plus_two_n_turns() {
        let mut session = test_session();
        session.transcript.push(Speaker::Ai, "Welcome! Tell me about yourself.");

        let n = 5;
        for i in 0..n {
            session.record_exchange(&format!("answer {i}"), &format!("question {i}"));
        }

        assert_eq!(session.transcript.len(), 1 + 2 * n);

        // Leading AI opener, then strict candidate/AI alternation in call order
        let turns = session.transcript.turns();
        assert_eq!(turns[0].speaker, Speaker::Ai);
        for i in 0..n {
            assert_eq!(turns[1 + 2 * i].speaker, Speaker::Candidate);
            assert_eq!(turns[1 + 2 * i].text, format!("answer {i}"));
            assert_eq!(turns[2 + 2 * i].speaker, Speaker::Ai);
            assert_eq!(turns[2 + 2 * i].text, format!("question {i}"));
        }
    }

    #[test]
    fn test_render_labels_and_separates_turns() {
        let mut transcript = Transcript::default();
        transcript.push(Speaker::Ai, "Hello, please introduce yourself.");
        transcript.push(Speaker::Candidate, "I am a backend developer.");
        transcript.push(Speaker::Ai, "What databases have you used?");

        let rendered = transcript.render();
        assert_eq!(
            rendered,
            "AI Interviewer: Hello, please introduce yourself.\n\n\
             Candidate: I am a backend developer.\n\n\
             AI Interviewer: What databases have you used?"
        );
    }

    #[test]
    fn test_render_empty_transcript_is_empty_string() {
        assert_eq!(Transcript::default().render(), "");
    }

    #[test]
    fn test_rendered_transcript_matches_transcript_render() {
        let mut session = test_session();
        session.transcript.push(Speaker::Ai, "Welcome.");
        session.record_exchange("Hi.", "First question.");
        assert_eq!(session.rendered_transcript(), session.transcript.render());
    }
}
