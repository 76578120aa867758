//! Submission cooldown for the chat session.
//!
//! A submission is refused while another one is in flight, and for a fixed
//! window after the last one finished. Refused submissions are dropped, not
//! queued.

use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CooldownError {
    /// A round trip is still outstanding.
    #[error("a request is already in flight")]
    InFlight,
    /// The post-reply window has not elapsed.
    #[error("cooling down; retry after {retry_after_ms}ms")]
    CoolingDown {
        /// Milliseconds until submissions are accepted again.
        retry_after_ms: u64,
    },
}

/// In-flight flag plus a ready-at deadline.
#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    in_flight: bool,
    ready_at: Option<Instant>,
}

impl Cooldown {
    /// Create an idle cooldown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a submission now.
    pub fn try_begin(&mut self) -> Result<(), CooldownError> {
        self.try_begin_at(Instant::now())
    }

    /// Try to start a submission at `now`.
    pub fn try_begin_at(&mut self, now: Instant) -> Result<(), CooldownError> {
        if self.in_flight {
            return Err(CooldownError::InFlight);
        }
        if let Some(ready_at) = self.ready_at
            && now < ready_at
        {
            let remaining = ready_at.duration_since(now);
            return Err(CooldownError::CoolingDown {
                retry_after_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            });
        }
        self.in_flight = true;
        Ok(())
    }

    /// Finish the current submission and hold for `window`.
    pub fn finish(&mut self, window: Duration) {
        self.finish_at(Instant::now(), window);
    }

    /// Finish the current submission at `now` and hold for `window`.
    pub fn finish_at(&mut self, now: Instant, window: Duration) {
        self.in_flight = false;
        self.ready_at = Some(now + window);
    }

    /// Whether a submission would be refused at `now`.
    #[must_use]
    pub fn is_blocked_at(&self, now: Instant) -> bool {
        self.in_flight || self.ready_at.is_some_and(|r| now < r)
    }
}
