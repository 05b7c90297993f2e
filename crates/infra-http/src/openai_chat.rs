// OpenAI Chat Completion Adapter

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use greenearth_core::application::constants::DEFAULT_CHAT_TIMEOUT_MS;
use greenearth_core::port::{ChatCompletion, ChatError};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// OpenAI client configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_url: String,
    pub model: String,
    /// `None` leaves the relay unconfigured; every call fails with `NotConfigured`
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_CHAT_TIMEOUT_MS),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Relays single-turn messages to an OpenAI-compatible completion endpoint
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::NotConfigured)?;

        let request = CompletionRequest {
            model: &self.config.model,
            messages: [Message {
                role: "user",
                content: message,
            }],
        };

        debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ChatError::Transport(e.to_string()))?;
            let details = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
            error!(status = status.as_u16(), details = %details, "Completion API error");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Transport(format!("invalid completion body: {e}")))?;

        let first = body.choices.into_iter().next().ok_or_else(|| {
            error!("Completion API returned no choices");
            ChatError::EmptyResponse
        })?;

        Ok(first
            .message
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}
