//! Wire types and error responses for the chat proxy.

use crate::chat::history::Turn;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body accepted on `POST /api/chat`.
///
/// Either `messages`, or the older `message` + `systemPrompt` pair which is
/// wrapped into a two-turn transcript.
#[derive(Debug, Default, Deserialize)]
pub struct ChatProxyRequest {
    /// Full transcript, system turn first.
    #[serde(default)]
    pub messages: Option<serde_json::Value>,
    /// Single user message (older clients).
    #[serde(default)]
    pub message: Option<String>,
    /// System prompt sent with `message` (older clients).
    #[serde(default, rename = "systemPrompt")]
    pub system_prompt: Option<String>,
}

impl ChatProxyRequest {
    /// Resolve the transcript to forward.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Validation`] when neither form is present, when
    /// `messages` is not an array, or when a turn is malformed.
    pub fn into_turns(self) -> Result<Vec<Turn>, ProxyError> {
        match (self.messages, self.message) {
            (Some(serde_json::Value::Array(items)), _) => {
                serde_json::from_value(serde_json::Value::Array(items)).map_err(|_| {
                    ProxyError::Validation(
                        "Each message needs a role of system, user or assistant and a string content"
                            .to_owned(),
                    )
                })
            }
            (Some(_), _) => Err(ProxyError::missing_messages()),
            (None, Some(message)) => {
                let mut turns = Vec::with_capacity(2);
                if let Some(system) = self.system_prompt.filter(|s| !s.trim().is_empty()) {
                    turns.push(Turn::system(system));
                }
                turns.push(Turn::user(message));
                Ok(turns)
            }
            (None, None) => Err(ProxyError::missing_messages()),
        }
    }
}

/// Body forwarded to the OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest<'a> {
    /// Provider model identifier.
    pub model: &'a str,
    /// Conversation transcript.
    pub messages: &'a [Turn],
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Completion token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// `{"error": "..."}` body returned for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Caller-safe message.
    pub error: String,
}

/// Failures at the proxy boundary. Messages never carry upstream detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// Bad request body.
    #[error("{0}")]
    Validation(String),
    /// The proxy itself is misconfigured.
    #[error("Server configuration error: {0}")]
    Configuration(String),
    /// The provider answered with a non-success status.
    #[error("Upstream request failed")]
    Upstream {
        /// Provider status, mirrored to the caller.
        status: StatusCode,
    },
    /// Transport failure or unreadable provider response.
    #[error("Internal Server Error")]
    Internal,
}

impl ProxyError {
    fn missing_messages() -> Self {
        Self::Validation("Messages array is required".to_owned())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::chat::history::Role;

    fn parse(body: &str) -> Result<Vec<Turn>, ProxyError> {
        serde_json::from_str::<ChatProxyRequest>(body)
            .unwrap()
            .into_turns()
    }

    #[test]
    fn empty_object_is_rejected() {
        let err = parse("{}").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Messages array is required");
    }

    #[test]
    fn non_array_messages_is_rejected() {
        let err = parse(r#"{"messages":"hi"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Messages array is required");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = parse(r#"{"messages":[{"role":"tool","content":"x"}]}"#).unwrap_err();
        assert!(matches!(err, ProxyError::Validation(_)));
    }

    #[test]
    fn legacy_form_is_wrapped() {
        let turns = parse(r#"{"message":"hi","systemPrompt":"be brief"}"#).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1], Turn::user("hi"));
    }

    #[test]
    fn upstream_error_mirrors_status_without_detail() {
        let err = ProxyError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "Upstream request failed");
    }

    #[test]
    fn max_tokens_is_omitted_when_unset() {
        let turns = [Turn::user("hi")];
        let body = UpstreamRequest {
            model: "m",
            messages: &turns,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
