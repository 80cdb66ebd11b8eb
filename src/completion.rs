//! Hosted LLM completion client
//!
//! [`CompletionClient`] is the seam the itinerary planner depends on.
//! [`HttpCompletionClient`] speaks the OpenAI-compatible chat completions API.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::CompletionConfig;
use crate::http::{self, check_status};
use crate::{AssistantError, ErrorCode, Result};

const SERVICE: &str = "Completion API";

/// A single system + user prompt exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Overrides the configured limit when set
    pub max_tokens: Option<u32>,
    /// Overrides the configured temperature when set
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Text of the first completion choice
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct HttpCompletionClient {
    client: ClientWithMiddleware,
    config: CompletionConfig,
}

impl HttpCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
        )?;
        Ok(Self { client, config })
    }

    fn invalid_response(message: impl Into<String>) -> AssistantError {
        AssistantError::api_with_context(
            message,
            ErrorCode::ApiInvalidResponse,
            HashMap::from([("service".to_string(), SERVICE.to_string())]),
        )
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AssistantError::config(
                "Completion API key is not configured (set completion.api_key or OPENAI_API_KEY)",
            )
        })?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature.unwrap_or(self.config.temperature),
        };
        let payload = serde_json::to_vec(&body)?;

        debug!("Sending {} byte completion request", payload.len());
        let start_time = Instant::now();

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| http::network_error(SERVICE, &e))?;

        let response = check_status(response, SERVICE).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Self::invalid_response(format!("Malformed completion response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Self::invalid_response("Completion response contained no text"))?;

        info!(
            "Completion finished in {:.3}s ({} chars)",
            start_time.elapsed().as_secs_f64(),
            text.len()
        );
        Ok(text)
    }
}
