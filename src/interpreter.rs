//! Command interpreter: utterance in, local reply or "unmatched" out.
//!
//! Matching is delegated to [`RuleSet`]; this module runs the matched
//! action against the [`SessionStore`] and phrases the confirmation.
//! Work that cannot finish synchronously (a weather refresh) returns an
//! interim reply and delivers the real answer later as an
//! [`AssistantEvent::FollowUp`].

use crate::clock::SiteClock;
use crate::config::AssistantConfig;
use crate::error::Result;
use crate::intent::{Intent, RuleSet, normalize};
use crate::markup::strip_tags;
use crate::runtime::{AssistantEvent, EventSender, RequestSequencer, emit};
use crate::state::SharedStore;
use crate::weather::{self, WeatherSource};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Follow-up when an on-demand refresh fails.
pub const WEATHER_UNAVAILABLE: &str = "Weather is unavailable right now.";

/// How the reply will be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Spoken aloud; markup is stripped.
    Spoken,
    /// Shown in the chat transcript; markup is kept for the renderer.
    Textual,
}

/// Result of interpreting one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// A local rule matched and its action ran.
    Reply {
        /// The matched intent.
        intent: Intent,
        /// Confirmation text.
        text: String,
    },
    /// No local rule matched. Not an error: the caller may try the fallback.
    Unmatched,
}

impl Interpretation {
    /// Reply text, if a rule matched.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Reply { text, .. } => Some(text),
            Self::Unmatched => None,
        }
    }

    /// Whether no rule matched.
    pub fn is_unmatched(&self) -> bool {
        matches!(self, Self::Unmatched)
    }
}

/// Maps utterances to portfolio actions.
pub struct CommandInterpreter {
    rules: RuleSet,
    store: SharedStore,
    clock: SiteClock,
    owner_name: String,
    place: String,
    about: String,
    help: String,
    weather: Option<Arc<dyn WeatherSource>>,
    events: Option<EventSender>,
    sequencer: Arc<RequestSequencer>,
}

impl CommandInterpreter {
    /// Build an interpreter for `config` acting on `store`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the rules or the clock cannot be built.
    pub fn new(config: &AssistantConfig, store: SharedStore) -> Result<Self> {
        Ok(Self {
            rules: RuleSet::new(&config.site)?,
            store,
            clock: SiteClock::new(&config.clock)?,
            owner_name: config.site.owner_name.clone(),
            place: config.site.place.clone(),
            about: config.site.about.clone(),
            help: config.site.help.clone(),
            weather: None,
            events: None,
            sequencer: Arc::new(RequestSequencer::new()),
        })
    }

    /// Refresh weather on demand from `source` when no reading is cached.
    pub fn with_weather_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(source);
        self
    }

    /// Publish state changes and follow-ups on `events`.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Share request tokens with other components.
    pub fn with_sequencer(mut self, sequencer: Arc<RequestSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Request token source.
    pub fn sequencer(&self) -> &Arc<RequestSequencer> {
        &self.sequencer
    }

    /// Store this interpreter acts on.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Interpret `utterance` as a new request.
    pub fn interpret(&self, utterance: &str, mode: ReplyMode) -> Interpretation {
        let request = self.sequencer.issue();
        self.interpret_request(request, utterance, mode)
    }

    /// Interpret `utterance` under an already issued request token.
    pub fn interpret_request(&self, request: u64, utterance: &str, mode: ReplyMode) -> Interpretation {
        let text = normalize(utterance);
        let Some(intent) = self.rules.match_intent(&text) else {
            debug!(request, "no local intent matched");
            return Interpretation::Unmatched;
        };
        debug!(request, intent = %intent.kind(), "matched local intent");

        match self.perform(request, &intent, mode) {
            Some(reply) => {
                let text = match mode {
                    ReplyMode::Spoken => strip_tags(&reply),
                    ReplyMode::Textual => reply,
                };
                Interpretation::Reply { intent, text }
            }
            None => Interpretation::Unmatched,
        }
    }

    fn perform(&self, request: u64, intent: &Intent, mode: ReplyMode) -> Option<String> {
        let reply = match intent {
            Intent::Greeting => format!(
                "Hi. Ask me about {}, or try commands like play music, change color, or show projects.",
                self.owner_name
            ),
            Intent::AboutOwner => self.about.clone(),
            Intent::Weather => self.weather_reply(request, mode),
            Intent::Time => format!("In {} it's {}.", self.place, self.clock.spoken(Utc::now())),
            Intent::Help => self.help.clone(),
            Intent::PlayMusic => {
                if self.store.set_playing(true) {
                    emit(self.events.as_ref(), AssistantEvent::PlaybackChanged { playing: true });
                    "Playing music.".to_owned()
                } else {
                    "Music is already playing.".to_owned()
                }
            }
            Intent::PauseMusic => {
                if self.store.set_playing(false) {
                    emit(self.events.as_ref(), AssistantEvent::PlaybackChanged { playing: false });
                    "Music paused.".to_owned()
                } else {
                    "Music is already paused.".to_owned()
                }
            }
            Intent::ChangeTheme(palette) => {
                self.store.set_theme(*palette);
                emit(self.events.as_ref(), AssistantEvent::ThemeChanged { palette: *palette });
                format!("Theme changed to <b>{palette}</b>.")
            }
            Intent::Navigate { tab } => {
                if let Err(e) = self.store.set_active_tab(tab) {
                    warn!(request, "navigation failed: {e}");
                    return None;
                }
                emit(self.events.as_ref(), AssistantEvent::TabChanged { tab: tab.clone() });
                format!("Opening <b>{tab}</b>.")
            }
        };
        Some(reply)
    }

    fn weather_reply(&self, request: u64, mode: ReplyMode) -> String {
        let snapshot = self.store.last_weather();
        if let Some(t) = snapshot.temperature {
            return match snapshot.wind_speed {
                Some(w) => format!(
                    "In {} it's {}°C, wind {} km/h.",
                    self.place,
                    t.round() as i64,
                    w.round() as i64
                ),
                None => format!("In {} it's {}°C.", self.place, t.round() as i64),
            };
        }

        self.spawn_weather_follow_up(request);
        match mode {
            ReplyMode::Spoken => format!("Checking the weather for {}. One moment.", self.place),
            ReplyMode::Textual => format!("Checking weather for {}…", self.place),
        }
    }

    fn spawn_weather_follow_up(&self, request: u64) {
        let Some(source) = self.weather.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(request, "no async runtime; skipping weather refresh");
            return;
        };

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let sequencer = Arc::clone(&self.sequencer);
        let place = self.place.clone();

        handle.spawn(async move {
            let refreshed = weather::refresh(source.as_ref(), &store).await;
            if let Some(snapshot) = &refreshed {
                emit(
                    events.as_ref(),
                    AssistantEvent::WeatherUpdated {
                        display: snapshot.widget_text(),
                    },
                );
            }

            let text = match refreshed.and_then(|s| s.temperature) {
                Some(t) => format!("In {place} it's {}°C.", t.round() as i64),
                None => WEATHER_UNAVAILABLE.to_owned(),
            };
            if sequencer.is_current(request) {
                emit(events.as_ref(), AssistantEvent::FollowUp { request, text });
            } else {
                debug!(request, "dropping stale weather follow-up");
            }
        });
    }
}
