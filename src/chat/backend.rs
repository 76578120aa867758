//! Remote completion backend behind the chat proxy.

use crate::chat::history::Turn;
use crate::config::ChatConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Why a remote completion produced no reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FallbackError {
    /// Transport failure, non-success status or unreadable body.
    #[error("fallback unavailable: {0}")]
    Unavailable(String),
    /// The call succeeded but carried no usable content.
    #[error("fallback returned no usable content")]
    EmptyResponse,
}

/// Something that can continue a conversation.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produce the next assistant reply for `history` (system turn first).
    async fn complete(&self, history: &[Turn]) -> Result<String, FallbackError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Posts `{"messages": [...]}` to the chat proxy endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCompletionBackend {
    /// Create a backend for the configured endpoint.
    pub fn new(config: &ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, history: &[Turn]) -> Result<String, FallbackError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&CompletionRequest { messages: history })
            .send()
            .await
            .map_err(|e| FallbackError::Unavailable(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                "chat endpoint error: {}",
                extract_error_message(&body)
            );
            return Err(FallbackError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let reply: CompletionReply = resp
            .json()
            .await
            .map_err(|e| FallbackError::Unavailable(format!("invalid response: {e}")))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(FallbackError::EmptyResponse)
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error").and_then(|e| {
                e.as_str()
                    .map(String::from)
                    .or_else(|| e.get("message").and_then(|m| m.as_str()).map(String::from))
            })
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
