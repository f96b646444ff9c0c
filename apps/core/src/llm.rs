//! Language-model backend.
//!
//! The router only produces a system prompt and generation parameters; this
//! module turns them into a chat-completions call.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, instrument};
use url::Url;

use crate::config::LlmConfig;
use crate::error::AppError;

/// Number of past turns forwarded to the model
pub const HISTORY_LIMIT: usize = 10;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the backend needs for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<ChatTurn>,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// System prompt, the most recent history turns, then the user message.
    pub fn messages(&self) -> Vec<ChatTurn> {
        let skip = self.history.len().saturating_sub(HISTORY_LIMIT);
        let mut messages = Vec::with_capacity(HISTORY_LIMIT + 2);
        messages.push(ChatTurn {
            role: Role::System,
            content: self.system_prompt.clone(),
        });
        messages.extend(self.history.iter().skip(skip).cloned());
        messages.push(ChatTurn::user(self.user_message.clone()));
        messages
    }
}

/// Defines the public interface for a language-model backend.
///
/// This trait abstracts the specific provider, allowing remote APIs or test
/// doubles to be used interchangeably.
#[async_trait]
pub trait LlmBackend: Send + Sync + 'static {
    /// Generates a complete text response.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AppError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
///
/// Give it a `Client` without a global timeout; each completion is bounded by
/// `LlmConfig::timeout` instead.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl OpenAiChatClient {
    pub fn new(client: Client, config: &LlmConfig) -> Result<Self, AppError> {
        Ok(Self {
            client,
            endpoint: config.api_url.join("chat/completions")?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    fn build_headers(&self) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::Config(format!("Invalid LLM API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl LlmBackend for OpenAiChatClient {
    #[instrument(skip(self, request), fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> Result<String, AppError> {
        info!("LLM generating with temperature {}", request.temperature);

        let payload = json!({
            "model": self.model,
            "messages": request.messages(),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let request_future = self
            .client
            .post(self.endpoint.clone())
            .headers(self.build_headers()?)
            .json(&payload)
            .send();

        let res = timeout(self.timeout, request_future).await??;

        let status = res.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(AppError::Config("LLM API key was rejected".to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited {
                    count: 0,
                    limit: 0,
                    reset_time: None,
                });
            }
            s if !s.is_success() => {
                let body = res.text().await.unwrap_or_default();
                error!("Completion request failed with status {}", s);
                return Err(AppError::Llm(format!(
                    "Completion request failed with status {}: {}",
                    s, body
                )));
            }
            _ => {}
        }

        let completion: CompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::Llm("No response content from the model".to_string()))
    }
}
