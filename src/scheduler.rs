//! Background widget tasks: clock ticks and weather polling.
//!
//! Both tasks run until their cancellation token fires or the event
//! receiver goes away. Readers never wait on them; they read the last
//! value from the store or the last event.
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! tokio::spawn(ClockTicker::new(clock, events.clone(), cancel.child_token()).run());
//! tokio::spawn(WeatherPoller::new(source, store, events, cancel.child_token()).run());
//! ```

use crate::clock::SiteClock;
use crate::runtime::{AssistantEvent, EventSender};
use crate::state::SharedStore;
use crate::weather::{self, WeatherSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Emits [`AssistantEvent::ClockTick`] on a fixed interval.
pub struct ClockTicker {
    clock: SiteClock,
    events: EventSender,
    cancel: CancellationToken,
    interval: Duration,
}

impl ClockTicker {
    /// Create a ticker with a one second interval.
    pub fn new(clock: SiteClock, events: EventSender, cancel: CancellationToken) -> Self {
        Self {
            clock,
            events,
            cancel,
            interval: Duration::from_secs(1),
        }
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Tick until cancelled. The first tick is immediate.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("clock ticker cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let reading = self.clock.reading(Utc::now());
                    let event = AssistantEvent::ClockTick {
                        time: reading.time,
                        date: reading.date,
                    };
                    if self.events.send(event).is_err() {
                        warn!("clock ticker: event receiver closed, stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// Refreshes the store's weather on a fixed interval.
pub struct WeatherPoller {
    source: Arc<dyn WeatherSource>,
    store: SharedStore,
    events: EventSender,
    cancel: CancellationToken,
    interval: Duration,
}

impl WeatherPoller {
    /// Create a poller with a ten minute interval.
    pub fn new(
        source: Arc<dyn WeatherSource>,
        store: SharedStore,
        events: EventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            store,
            events,
            cancel,
            interval: Duration::from_secs(600),
        }
    }

    /// Override the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until cancelled. The first refresh is immediate.
    ///
    /// A failed refresh keeps the last known snapshot; the widget shows
    /// whatever the store holds.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "weather poller started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("weather poller cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let _ = weather::refresh(self.source.as_ref(), &self.store).await;
                    let display = self.store.last_weather().widget_text();
                    if self.events.send(AssistantEvent::WeatherUpdated { display }).is_err() {
                        warn!("weather poller: event receiver closed, stopping");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::config::{AssistantConfig, ClockConfig};
    use crate::error::{AssistantError, Result};
    use crate::runtime::event_channel;
    use crate::state::SessionStore;
    use crate::weather::WeatherSnapshot;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl WeatherSource for Offline {
        async fn current(&self) -> Result<WeatherSnapshot> {
            Err(AssistantError::Weather("offline".into()))
        }
    }

    #[tokio::test]
    async fn ticker_emits_then_stops_on_cancel() {
        let (tx, mut rx) = event_channel();
        let cancel = CancellationToken::new();
        let clock = SiteClock::new(&ClockConfig::default()).unwrap();
        let task = tokio::spawn(
            ClockTicker::new(clock, tx, cancel.clone())
                .with_interval(Duration::from_millis(10))
                .run(),
        );

        match rx.recv().await {
            Some(AssistantEvent::ClockTick { time, date }) => {
                assert!(time.ends_with("AM") || time.ends_with("PM"));
                assert!(date.contains(", "));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(result.is_ok(), "ticker should finish after cancel");
    }

    #[tokio::test]
    async fn poller_serves_fallback_text_when_provider_fails() {
        let (tx, mut rx) = event_channel();
        let cancel = CancellationToken::new();
        let store = SessionStore::shared(&AssistantConfig::default()).unwrap();
        let task = tokio::spawn(
            WeatherPoller::new(Arc::new(Offline), store, tx, cancel.clone())
                .with_interval(Duration::from_secs(60))
                .run(),
        );

        assert_eq!(
            rx.recv().await,
            Some(AssistantEvent::WeatherUpdated {
                display: "17°C (Fallback)".into()
            })
        );

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(result.is_ok(), "poller should finish after cancel");
    }

    #[tokio::test]
    async fn ticker_stops_when_receiver_dropped() {
        let (tx, rx) = event_channel();
        drop(rx);
        let clock = SiteClock::new(&ClockConfig::default()).unwrap();
        let task = tokio::spawn(
            ClockTicker::new(clock, tx, CancellationToken::new())
                .with_interval(Duration::from_millis(10))
                .run(),
        );
        let result = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(result.is_ok(), "ticker should stop once nobody listens");
    }
}
