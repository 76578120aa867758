//! Stateless chat-completion proxy.
//!
//! Keeps the provider credential server-side and forwards conversation
//! transcripts to an OpenAI-compatible provider with a fixed model and
//! sampling parameters.
//!
//! ## Endpoints
//!
//! - `POST /api/chat`: forward `{messages}` (or `{message, systemPrompt}`)
//! - any other method on `/api/chat`: `405 {"error":"Method not allowed"}`

pub mod types;

use crate::config::ProxyConfig;
use crate::error::AssistantError;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use types::{ChatProxyRequest, ErrorResponse, ProxyError, UpstreamRequest};
use uuid::Uuid;

/// Path the proxy serves.
pub const CHAT_ROUTE: &str = "/api/chat";

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Upstream {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: Option<u32>,
    api_key: Option<String>,
}

/// Shared state for axum handlers.
#[derive(Clone)]
struct AppState {
    upstream: Arc<Upstream>,
}

// ---------------------------------------------------------------------------
// ProxyServer
// ---------------------------------------------------------------------------

/// HTTP proxy running in a background task.
pub struct ProxyServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl ProxyServer {
    /// Start the proxy.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign).
    /// `api_key` is the provider credential; without it every forwarded
    /// request fails with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(config: &ProxyConfig, api_key: Option<String>) -> crate::error::Result<Self> {
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "no upstream credential configured; chat requests will fail"
            );
        }

        let app = router(config, api_key);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AssistantError::Proxy(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AssistantError::Proxy(format!("failed to get local addr: {e}")))?;

        info!("chat proxy listening on http://{addr}{CHAT_ROUTE}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("chat proxy error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Full URL of the chat route.
    pub fn chat_url(&self) -> String {
        format!("http://{}{CHAT_ROUTE}", self.addr)
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ProxyServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Build the proxy router without binding.
pub fn router(config: &ProxyConfig, api_key: Option<String>) -> Router {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .unwrap_or_default();

    let state = AppState {
        upstream: Arc::new(Upstream {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.upstream_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            api_key,
        }),
    };

    Router::new()
        .route(CHAT_ROUTE, post(handle_chat).fallback(method_not_allowed))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Any method other than POST.
async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method not allowed".to_owned(),
        }),
    )
}

/// `POST /api/chat`.
async fn handle_chat(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    match forward(&state.upstream, request_id, &body).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            info!(%request_id, status = e.status().as_u16(), "chat request failed: {e}");
            e.into_response()
        }
    }
}

async fn forward(
    upstream: &Upstream,
    request_id: Uuid,
    body: &[u8],
) -> Result<serde_json::Value, ProxyError> {
    let request: ChatProxyRequest = serde_json::from_slice(body)
        .map_err(|_| ProxyError::Validation("Messages array is required".to_owned()))?;
    let turns = request.into_turns()?;

    let api_key = upstream
        .api_key
        .as_deref()
        .ok_or_else(|| ProxyError::Configuration("missing upstream API key".to_owned()))?;

    info!(%request_id, turns = turns.len(), model = %upstream.model, "forwarding chat request");

    let payload = UpstreamRequest {
        model: &upstream.model,
        messages: &turns,
        temperature: upstream.temperature,
        top_p: upstream.top_p,
        max_tokens: upstream.max_tokens,
    };

    let resp = upstream
        .client
        .post(&upstream.endpoint)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            warn!(%request_id, "upstream request failed: {e}");
            ProxyError::Internal
        })?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        warn!(
            %request_id,
            status = status.as_u16(),
            "upstream returned error: {}",
            detail.chars().take(500).collect::<String>()
        );
        return Err(ProxyError::Upstream { status });
    }

    resp.json::<serde_json::Value>().await.map_err(|e| {
        warn!(%request_id, "upstream response was not JSON: {e}");
        ProxyError::Internal
    })
}
