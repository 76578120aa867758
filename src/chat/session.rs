//! Typed chat submissions: local commands first, remote fallback second.

use crate::chat::FallbackClient;
use crate::chat::cooldown::{Cooldown, CooldownError};
use crate::config::ChatConfig;
use crate::interpreter::{CommandInterpreter, Interpretation, ReplyMode};
use crate::markup::MarkupRenderer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// A local intent rule.
    Local,
    /// The remote fallback.
    Remote,
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A reply to display.
    Reply {
        /// Request token of this submission.
        request: u64,
        /// Which path answered.
        source: ReplySource,
        /// Reply text with raw markup.
        text: String,
        /// Reply rendered through the allow-list renderer.
        html: String,
    },
    /// Blank input.
    Ignored,
    /// Dropped by the cooldown.
    Rejected(CooldownError),
    /// A newer submission was issued before the reply arrived.
    Superseded {
        /// Request token of the dropped submission.
        request: u64,
    },
}

/// Ends the in-flight submission when dropped, so a cancelled `submit`
/// still releases the cooldown.
struct Submission<'a> {
    cooldown: &'a Mutex<Cooldown>,
    window: Duration,
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        self.cooldown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish(self.window);
    }
}

/// One visitor's chat box.
pub struct ChatSession {
    interpreter: Arc<CommandInterpreter>,
    fallback: FallbackClient,
    renderer: MarkupRenderer,
    cooldown: Mutex<Cooldown>,
    local_window: Duration,
    remote_window: Duration,
}

impl ChatSession {
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns a config error if the reply renderer cannot be built.
    pub fn new(
        config: &ChatConfig,
        interpreter: Arc<CommandInterpreter>,
        fallback: FallbackClient,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            interpreter,
            fallback,
            renderer: MarkupRenderer::new(config.allowed_link_prefixes.iter().cloned())?,
            cooldown: Mutex::new(Cooldown::new()),
            local_window: Duration::from_millis(config.local_cooldown_ms),
            remote_window: Duration::from_millis(config.remote_cooldown_ms),
        })
    }

    fn cooldown(&self) -> MutexGuard<'_, Cooldown> {
        self.cooldown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit typed text. Quick-reply buttons go through here too.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if let Err(e) = self.cooldown().try_begin() {
            debug!("submission dropped: {e}");
            return SubmitOutcome::Rejected(e);
        }
        // Until the reply is known, a cancelled submission counts as remote.
        let mut submission = Submission {
            cooldown: &self.cooldown,
            window: self.remote_window,
        };

        let sequencer = Arc::clone(self.interpreter.sequencer());
        let request = sequencer.issue();

        let (source, reply) =
            match self
                .interpreter
                .interpret_request(request, text, ReplyMode::Textual)
            {
                Interpretation::Reply { text, .. } => (ReplySource::Local, Some(text)),
                Interpretation::Unmatched => {
                    info!(request, "no local command; asking remote fallback");
                    let reply = self
                        .fallback
                        .respond_request(request, &sequencer, text)
                        .await;
                    (ReplySource::Remote, reply)
                }
            };

        if source == ReplySource::Local {
            submission.window = self.local_window;
        }
        drop(submission);

        match reply {
            Some(text) => SubmitOutcome::Reply {
                request,
                source,
                html: self.renderer.render(&text),
                text,
            },
            None => SubmitOutcome::Superseded { request },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::chat::backend::{CompletionBackend, FallbackError};
    use crate::chat::history::Turn;
    use crate::config::AssistantConfig;
    use crate::state::SessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl CompletionBackend for Counting {
        async fn complete(&self, _history: &[Turn]) -> Result<String, FallbackError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("He likes <b>Pokhara</b>. <img src=x>".into())
        }
    }

    fn session(backend: Arc<Counting>, config: &AssistantConfig) -> ChatSession {
        let store = SessionStore::shared(config).unwrap();
        let interpreter = Arc::new(CommandInterpreter::new(config, Arc::clone(&store)).unwrap());
        let fallback = FallbackClient::new(backend, store);
        ChatSession::new(&config.chat, interpreter, fallback).unwrap()
    }

    #[tokio::test]
    async fn local_command_skips_fallback() {
        let backend = Arc::new(Counting::default());
        let session = session(Arc::clone(&backend), &AssistantConfig::default());

        match session.submit("show games").await {
            SubmitOutcome::Reply { source, html, .. } => {
                assert_eq!(source, ReplySource::Local);
                assert_eq!(html, "Opening <b>games</b>.");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(backend.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_reply_is_rendered_safely() {
        let backend = Arc::new(Counting::default());
        let session = session(Arc::clone(&backend), &AssistantConfig::default());

        match session.submit("what is his favourite city").await {
            SubmitOutcome::Reply {
                source, text, html, ..
            } => {
                assert_eq!(source, ReplySource::Remote);
                assert!(text.contains("<img"));
                assert_eq!(html, "He likes <b>Pokhara</b>. &lt;img src=x&gt;");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeat_within_cooldown_is_dropped() {
        let backend = Arc::new(Counting::default());
        let session = session(Arc::clone(&backend), &AssistantConfig::default());

        let first = session.submit("tell me a story").await;
        let second = session.submit("tell me a story").await;
        assert!(matches!(first, SubmitOutcome::Reply { .. }));
        assert!(matches!(
            second,
            SubmitOutcome::Rejected(CooldownError::CoolingDown { .. })
        ));
        assert_eq!(backend.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_input_is_ignored_without_cooldown() {
        let backend = Arc::new(Counting::default());
        let session = session(Arc::clone(&backend), &AssistantConfig::default());
        assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
        assert!(matches!(
            session.submit("hello").await,
            SubmitOutcome::Reply { .. }
        ));
    }

    struct Slow;

    #[async_trait]
    impl CompletionBackend for Slow {
        async fn complete(&self, _history: &[Turn]) -> Result<String, FallbackError> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            Ok("late".into())
        }
    }

    #[tokio::test]
    async fn cancelled_submission_releases_cooldown() {
        let mut config = AssistantConfig::default();
        config.chat.local_cooldown_ms = 0;
        config.chat.remote_cooldown_ms = 0;
        let store = SessionStore::shared(&config).unwrap();
        let interpreter = Arc::new(CommandInterpreter::new(&config, Arc::clone(&store)).unwrap());
        let session = ChatSession::new(
            &config.chat,
            interpreter,
            FallbackClient::new(Arc::new(Slow), store),
        )
        .unwrap();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            session.submit("tell me a joke"),
        )
        .await;
        assert!(cancelled.is_err());

        assert!(matches!(
            session.submit("hello").await,
            SubmitOutcome::Reply {
                source: ReplySource::Local,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_submission_still_applies_remote_window() {
        let config = AssistantConfig::default();
        let store = SessionStore::shared(&config).unwrap();
        let interpreter =
            Arc::new(CommandInterpreter::new(&config, Arc::clone(&store)).unwrap());
        let session = ChatSession::new(
            &config.chat,
            interpreter,
            FallbackClient::new(Arc::new(Slow), store),
        )
        .unwrap();

        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            session.submit("tell me a joke"),
        )
        .await;

        assert!(matches!(
            session.submit("hello").await,
            SubmitOutcome::Rejected(CooldownError::CoolingDown { .. })
        ));
    }

    #[tokio::test]
    async fn zero_cooldown_accepts_back_to_back() {
        let mut config = AssistantConfig::default();
        config.chat.local_cooldown_ms = 0;
        let backend = Arc::new(Counting::default());
        let session = session(Arc::clone(&backend), &config);

        assert!(matches!(session.submit("hi").await, SubmitOutcome::Reply { .. }));
        assert!(matches!(session.submit("hi").await, SubmitOutcome::Reply { .. }));
    }
}
