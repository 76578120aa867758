//! Chat path: remote fallback client, cooldown and session.
//!
//! The [`FallbackClient`] owns every write to the conversation history:
//! it appends the user turn before calling the backend, appends the
//! assistant turn after a successful call, and turns every failure into a
//! displayable apology.

pub mod backend;
pub mod cooldown;
pub mod history;
pub mod session;

use crate::runtime::RequestSequencer;
use crate::state::SharedStore;
use backend::{CompletionBackend, FallbackError};
use history::Turn;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply when the backend cannot be reached.
pub const OFFLINE_REPLY: &str = "Sorry, I'm currently offline. Please try again later.";

/// Reply when the backend answered without content. Recorded as the assistant turn.
pub const EMPTY_REPLY: &str = "I'm having trouble connecting. Please try again.";

/// Remote fallback for utterances no local rule handled.
#[derive(Clone)]
pub struct FallbackClient {
    backend: Arc<dyn CompletionBackend>,
    store: SharedStore,
}

impl FallbackClient {
    /// Create a client writing its history into `store`.
    pub fn new(backend: Arc<dyn CompletionBackend>, store: SharedStore) -> Self {
        Self { backend, store }
    }

    /// Run one exchange and return the text to display. Never fails.
    pub async fn respond(&self, user_text: &str) -> String {
        self.exchange(user_text, || true)
            .await
            .unwrap_or_else(|| OFFLINE_REPLY.to_owned())
    }

    /// Run one exchange for `request`.
    ///
    /// Returns `None` when a newer request was issued before the reply
    /// arrived; the stale reply is not recorded.
    pub async fn respond_request(
        &self,
        request: u64,
        sequencer: &RequestSequencer,
        user_text: &str,
    ) -> Option<String> {
        self.exchange(user_text, || sequencer.is_current(request))
            .await
    }

    async fn exchange(&self, user_text: &str, still_current: impl Fn() -> bool) -> Option<String> {
        self.store.append_turn(Turn::user(user_text));
        let history = self.store.history();

        let outcome = self.backend.complete(&history).await;
        if !still_current() {
            debug!("discarding superseded fallback reply");
            return None;
        }

        match outcome {
            Ok(reply) => {
                self.store.append_turn(Turn::assistant(reply.clone()));
                Some(reply)
            }
            Err(FallbackError::EmptyResponse) => {
                warn!("fallback returned an empty reply");
                self.store.append_turn(Turn::assistant(EMPTY_REPLY));
                Some(EMPTY_REPLY.to_owned())
            }
            Err(FallbackError::Unavailable(reason)) => {
                warn!("fallback unavailable: {reason}");
                Some(OFFLINE_REPLY.to_owned())
            }
        }
    }
}
