//! Client for a hosted chat-completion API.
//!
//! Handlers talk to [`ChatModel`]; [`AnthropicClient`] is the production
//! implementation. Calls are made once: no retries, and the only timeout
//! is the transport's.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("upstream response had no text content")]
    EmptyResponse,
}

/// One single-turn completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: u32,
}

pub trait ChatModel: Send + Sync {
    fn complete(&self, req: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>>;
}

// ---------- Wire types ----------

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [WireMessage<'a>; 1],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------- Client ----------

pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    api_version: String,
}

impl AnthropicClient {
    pub fn new(cfg: &LlmConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/v1/messages", cfg.base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: cfg.model.clone(),
            api_version: cfg.api_version.clone(),
        })
    }

    /// Credential from `ANTHROPIC_API_KEY`.
    pub fn from_env(cfg: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(cfg, std::env::var("ANTHROPIC_API_KEY").ok())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, req: CompletionRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: req.max_tokens,
            system: req.system.as_deref(),
            messages: [WireMessage {
                role: "user",
                content: &req.user,
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), "completion failed: {message}");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = resp.json().await?;
        parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .find_map(|b| b.text)
            .ok_or(LlmError::EmptyResponse)
    }
}

impl ChatModel for AnthropicClient {
    fn complete(&self, req: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        Box::pin(self.send(req))
    }
}
