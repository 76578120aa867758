//! Runtime events emitted to the delivery shell, and request sequencing.
//!
//! Events carry small payloads only; the shell renders them and reads the
//! store for anything else.

use crate::theme::Palette;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Events that describe what the assistant did outside of a direct reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantEvent {
    /// Late reply for an earlier submission (weather follow-up).
    FollowUp {
        /// Request token of the submission this answers.
        request: u64,
        /// Reply text, possibly with allow-listed markup.
        text: String,
    },
    /// The visible tab changed.
    TabChanged { tab: String },
    /// The accent palette changed.
    ThemeChanged { palette: Palette },
    /// Background music started or stopped.
    PlaybackChanged { playing: bool },
    /// Clock widget tick.
    ClockTick { time: String, date: String },
    /// Weather widget text refreshed.
    WeatherUpdated { display: String },
}

/// Sender half used by producers.
pub type EventSender = mpsc::UnboundedSender<AssistantEvent>;
/// Receiver half owned by the shell.
pub type EventReceiver = mpsc::UnboundedReceiver<AssistantEvent>;

/// Create an event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send `event` if a sender is attached. A closed receiver is ignored.
pub(crate) fn emit(events: Option<&EventSender>, event: AssistantEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Monotonic request tokens. Only results for the latest token are applied.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    /// Create a sequencer with no tokens issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token. Tokens start at 1.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `token` is the most recently issued one.
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}
