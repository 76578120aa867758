//! Per-visit session state.
//!
//! [`SessionStore`] is the single owner of the visible tab, playback flag,
//! last weather reading, accent palette and conversation history. The
//! interpreter, the fallback client and environment callbacks mutate it
//! through the methods below; nothing else holds a copy.

use crate::chat::history::{ConversationHistory, Turn};
use crate::config::{AssistantConfig, ChatConfig, SiteConfig, TabSpec};
use crate::error::{AssistantError, Result};
use crate::theme::Palette;
use crate::weather::WeatherSnapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Shared handle to the session store.
pub type SharedStore = Arc<SessionStore>;

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Tab currently shown.
    pub active_tab: String,
    /// Whether background music is playing.
    pub playing: bool,
    /// Last known weather.
    pub weather: WeatherSnapshot,
    /// Active accent palette.
    pub theme: Palette,
    /// Conversation with the remote fallback.
    pub history: ConversationHistory,
}

/// Owner of all mutable session state.
#[derive(Debug)]
pub struct SessionStore {
    tabs: Vec<TabSpec>,
    inner: Mutex<SessionState>,
}

impl SessionStore {
    /// Create a store for one visit.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] when the tab set is empty, the
    /// default tab is not part of it, or `chat.max_history` is zero.
    pub fn new(site: &SiteConfig, chat: &ChatConfig) -> Result<Self> {
        if site.tabs.is_empty() {
            return Err(AssistantError::Config("site.tabs must not be empty".into()));
        }
        if chat.max_history == 0 {
            return Err(AssistantError::Config(
                "chat.max_history must keep at least one turn".into(),
            ));
        }
        if !site.tabs.iter().any(|t| t.id == site.default_tab) {
            return Err(AssistantError::Config(format!(
                "site.default_tab `{}` is not a configured tab",
                site.default_tab
            )));
        }

        Ok(Self {
            tabs: site.tabs.clone(),
            inner: Mutex::new(SessionState {
                active_tab: site.default_tab.clone(),
                playing: false,
                weather: WeatherSnapshot::unknown(site.place.clone()),
                theme: Palette::default(),
                history: ConversationHistory::new(chat.system_prompt.clone(), chat.max_history),
            }),
        })
    }

    /// Create a shared store from the full configuration.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::new`].
    pub fn shared(config: &AssistantConfig) -> Result<SharedStore> {
        Self::new(&config.site, &config.chat).map(Arc::new)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- reads --

    /// The static tab set.
    pub fn tabs(&self) -> &[TabSpec] {
        &self.tabs
    }

    /// Whether `id` names a configured tab.
    pub fn has_tab(&self, id: &str) -> bool {
        self.tabs.iter().any(|t| t.id == id)
    }

    /// Id of the visible tab.
    pub fn active_tab(&self) -> String {
        self.lock().active_tab.clone()
    }

    /// Whether background music is playing.
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Last known weather, possibly without readings.
    pub fn last_weather(&self) -> WeatherSnapshot {
        self.lock().weather.clone()
    }

    /// Active accent palette.
    pub fn theme(&self) -> Palette {
        self.lock().theme
    }

    /// Conversation transcript, system turn first.
    pub fn history(&self) -> Vec<Turn> {
        self.lock().history.to_vec()
    }

    /// Number of conversation entries including the system turn.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    // -- writes --

    /// Show tab `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::UnknownTab`] and leaves the active tab
    /// unchanged when `id` is not a configured tab.
    pub fn set_active_tab(&self, id: &str) -> Result<()> {
        if !self.has_tab(id) {
            return Err(AssistantError::UnknownTab(id.to_owned()));
        }
        self.lock().active_tab = id.to_owned();
        debug!(tab = id, "active tab changed");
        Ok(())
    }

    /// Set the playback flag. Returns `true` when the flag changed.
    pub fn set_playing(&self, playing: bool) -> bool {
        let mut state = self.lock();
        let changed = state.playing != playing;
        state.playing = playing;
        changed
    }

    /// Flip the playback flag and return the new value.
    pub fn toggle_playback(&self) -> bool {
        let mut state = self.lock();
        state.playing = !state.playing;
        state.playing
    }

    /// Environment notification that the track finished.
    pub fn on_track_ended(&self) {
        self.lock().playing = false;
    }

    /// Apply an accent palette.
    pub fn set_theme(&self, palette: Palette) {
        self.lock().theme = palette;
        debug!(theme = %palette, "theme changed");
    }

    /// Replace the last known weather.
    pub fn record_weather(&self, snapshot: WeatherSnapshot) {
        self.lock().weather = snapshot;
    }

    /// Append a conversation turn, enforcing the history bound.
    pub fn append_turn(&self, turn: Turn) {
        self.lock().history.push(turn);
    }
}
