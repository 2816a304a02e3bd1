/// LLM Client — the single point of entry for all AI backend calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Two call shapes are exposed: a stateful multi-turn [`Conversation`] for
/// the live interview, and stateless `call`/`call_json` for single-shot
/// structured generation (evaluation).
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model variants tried in order on first use. The first variant that
/// answers a one-token probe is cached and used for every later call.
pub const MODEL_VARIANTS: &[&str] = &[
    "claude-sonnet-4-5",
    "claude-3-7-sonnet-latest",
    "claude-3-5-haiku-latest",
];
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No usable model variant; all configured models failed to initialize")]
    NoUsableModel,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }
}

impl LlmError {
    /// True when no well-formed answer was received at all (transport,
    /// timeout, API rejection). False for answers that arrived but could
    /// not be parsed — callers may substitute a fallback for those.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Http(_)
                | LlmError::Timeout
                | LlmError::Api { .. }
                | LlmError::RateLimited { .. }
                | LlmError::NoUsableModel
        )
    }
}

/// Who authored a chat message, in the backend's wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API with retry logic, a model-variant
/// fallback chain, and structured output helpers.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: Arc<OnceCell<&'static str>>,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model: Arc::new(OnceCell::new()),
        }
    }

    /// Resolves the model variant: probes `MODEL_VARIANTS` in order on the
    /// first call and caches the winner for the life of the process.
    async fn resolve_model(&self) -> Result<&'static str, LlmError> {
        self.model
            .get_or_try_init(|| async {
                for variant in MODEL_VARIANTS {
                    match self.probe(variant).await {
                        Ok(()) => {
                            info!("Using model variant: {variant}");
                            return Ok(*variant);
                        }
                        Err(e) => warn!("Model variant {variant} unusable: {e}"),
                    }
                }
                Err(LlmError::NoUsableModel)
            })
            .await
            .copied()
    }

    /// One-token request checking that a model variant accepts our calls.
    async fn probe(&self, model: &str) -> Result<(), LlmError> {
        let messages = [ChatMessage {
            role: Role::User,
            content: "ping".to_string(),
        }];
        let body = MessagesRequest {
            model,
            max_tokens: 1,
            system: None,
            messages: &messages,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(LlmError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// POSTs a messages request, retrying 429 and 5xx with exponential
    /// backoff. Timeouts fail immediately so callers can surface them.
    async fn post_messages(&self, body: &MessagesRequest<'_>) -> Result<LlmResponse, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    let e = LlmError::from(e);
                    if matches!(e, LlmError::Timeout) {
                        return Err(e);
                    }
                    last_error = Some(e);
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body_text = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body_text);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body_text,
                });
                continue;
            }

            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<AnthropicError>(&body_text)
                    .map(|e| e.error.message)
                    .unwrap_or(body_text);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await.map_err(LlmError::from)?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Makes a stateless, single-shot call, returning the full response.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let model = self.resolve_model().await?;
        let messages = [ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];
        let body = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system: Some(system),
            messages: &messages,
        };
        self.post_messages(&body).await
    }

    /// Convenience method that calls the LLM and deserializes the text
    /// response as JSON. The prompt must instruct the model to return valid
    /// JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_code_fences(text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    /// Opens a stateful multi-turn conversation against the backend.
    pub fn conversation(&self) -> Conversation {
        Conversation {
            client: self.clone(),
            messages: Vec::new(),
        }
    }
}

/// A stateful multi-turn conversation. The full message history is replayed
/// on every send; replies come back in send order.
#[derive(Debug)]
pub struct Conversation {
    client: LlmClient,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Sends one message and returns the assistant's reply, appending both
    /// to the history. A failed send removes the optimistically pushed user
    /// message so a retry does not duplicate history.
    pub async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        let model = self.client.resolve_model().await?;

        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
        });

        let result = {
            let body = MessagesRequest {
                model,
                max_tokens: MAX_TOKENS,
                system: None,
                messages: &self.messages,
            };
            self.client.post_messages(&body).await
        };

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                self.messages.pop();
                return Err(e);
            }
        };

        let reply = match response.text() {
            Some(t) => t.to_string(),
            None => {
                self.messages.pop();
                return Err(LlmError::EmptyContent);
            }
        };

        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: reply.clone(),
        });

        Ok(reply)
    }
}

/// Strips markdown code fences from LLM output.
///
/// Behavior: no fence → input returned trimmed; a labeled (```json) or
/// unlabeled (```) fence → the fenced body; multiple fenced blocks → the
/// first block wins. Text before the first fence is discarded.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_with_json_label() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_without_label() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_multiple_blocks_takes_first() {
        let input = "```json\n{\"first\": 1}\n```\nsome prose\n```json\n{\"second\": 2}\n```";
        assert_eq!(strip_code_fences(input), "{\"first\": 1}");
    }

    #[test]
    fn test_strip_code_fences_prose_before_fence() {
        let input = "Here is the evaluation:\n```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_unterminated_fence() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(LlmError::Timeout.is_transport());
        assert!(LlmError::NoUsableModel.is_transport());
        assert!(LlmError::Api {
            status: 500,
            message: String::new()
        }
        .is_transport());
        assert!(!LlmError::EmptyContent.is_transport());
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(!LlmError::Parse(parse_err).is_transport());
    }
}
