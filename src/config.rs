//! Configuration types for the portfolio assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the assistant and its proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Site owner, place and tab layout.
    pub site: SiteConfig,
    /// Clock widget settings.
    pub clock: ClockConfig,
    /// Weather provider settings.
    pub weather: WeatherConfig,
    /// Chat fallback and cooldown settings.
    pub chat: ChatConfig,
    /// HTTP proxy settings.
    pub proxy: ProxyConfig,
}

/// A navigable section of the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSpec {
    /// Stable tab identifier, also the spoken keyword.
    pub id: String,
    /// Extra phrases that also name this tab.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TabSpec {
    /// Create a tab whose only keyword is its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: Vec::new(),
        }
    }
}

/// Static facts about the site and its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Display name used in greetings.
    pub owner_name: String,
    /// Lowercase names that refer to the owner ("rishi", "rishikesh").
    pub owner_aliases: Vec<String>,
    /// Home town used in weather and time replies.
    pub place: String,
    /// Lowercase place qualifiers accepted by the weather and time rules.
    pub place_aliases: Vec<String>,
    /// Reply to "who is ..." questions.
    pub about: String,
    /// Reply to "help" questions.
    pub help: String,
    /// Navigable tabs in display order.
    pub tabs: Vec<TabSpec>,
    /// Tab shown when a session starts.
    pub default_tab: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            owner_name: "Rishikesh".to_owned(),
            owner_aliases: vec!["rishi".to_owned(), "rishikesh".to_owned()],
            place: "Kathmandu".to_owned(),
            place_aliases: vec!["kathmandu".to_owned(), "nepal".to_owned()],
            about: "Rishikesh Bastakoti is a Computer Science student at Caldwell University, \
                    class of 2028. He's from Kathmandu, Nepal, and is building a career in \
                    software development. He's built a full-stack QuickLoan app with React and \
                    FastAPI, and a Python Budget Tracker. He loves web development, algorithms, \
                    and in his free time enjoys the song Timi Ra Ma by Dixita Karki, the movie \
                    Interstellar, and the city of Pokhara."
                .to_owned(),
            help: "You can ask me: Who is Rishikesh, or tell me about him. Ask what's the \
                   weather or time in Kathmandu. Say play music or pause. Say change color to \
                   blue, red, green, purple, orange, pink, teal, or yellow. Or say show \
                   projects, games, contact, education, hometown, or favorites."
                .to_owned(),
            tabs: [
                "intro",
                "projects",
                "education",
                "hometown",
                "favorites",
                "games",
                "contact",
            ]
            .into_iter()
            .map(TabSpec::new)
            .collect(),
            default_tab: "intro".to_owned(),
        }
    }
}

/// Clock widget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed offset of the site's home time zone, in minutes east of UTC.
    pub utc_offset_minutes: i32,
    /// Widget tick interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            // Asia/Kathmandu, no DST.
            utc_offset_minutes: 345,
            tick_ms: 1_000,
        }
    }
}

/// Weather provider configuration (Open-Meteo).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider base URL.
    pub base_url: String,
    /// Latitude of the site's home town.
    pub latitude: f64,
    /// Longitude of the site's home town.
    pub longitude: f64,
    /// Background refresh interval in seconds.
    pub poll_secs: u64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_owned(),
            latitude: 27.7172,
            longitude: 85.3240,
            poll_secs: 600,
            timeout_secs: 10,
        }
    }
}

/// Chat session and remote fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat proxy endpoint the fallback client posts to.
    pub endpoint: String,
    /// Number of turns kept after the system turn.
    pub max_history: usize,
    /// Cooldown after a locally answered submission, in milliseconds.
    pub local_cooldown_ms: u64,
    /// Cooldown after a remotely answered submission, in milliseconds.
    pub remote_cooldown_ms: u64,
    /// Request timeout for the fallback call, in seconds.
    pub timeout_secs: u64,
    /// URL prefixes allowed in rendered anchors.
    pub allowed_link_prefixes: Vec<String>,
    /// System turn seeded at index 0 of every conversation.
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/chat".to_owned(),
            max_history: 20,
            local_cooldown_ms: 600,
            remote_cooldown_ms: 1_000,
            timeout_secs: 30,
            allowed_link_prefixes: vec![
                "https://www.linkedin.com/in/".to_owned(),
                "https://github.com/".to_owned(),
            ],
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are the friendly assistant for Rishikesh Bastakoti's portfolio. Be warm, concise, and helpful.
Refer to yourself in first person and to Rishikesh in third person.

FACTS (use only these)
- Education: Computer Science, Caldwell University (Class of 2028). High school: National School of Sciences, Kathmandu.
- From: Kathmandu, Nepal; now in Caldwell, NJ, USA.
- Tech: Python, JavaScript, React, FastAPI, SQL/SQLAlchemy, HTML5, CSS3.
- Projects: QuickLoan App (React + FastAPI + SQLAlchemy), BudgetTracker (Python).
- Personal: favorite song \"Timi Ra Ma\" by Dixita Karki, movie Interstellar, city Pokhara.

STYLE
- Keep replies to 2-4 sentences. Use HTML only: <b>bold</b>. No markdown.
- Links: <a href=\"https://www.linkedin.com/in/rbastakoti1/\">LinkedIn</a>, <a href=\"https://github.com/reseekesh821\">GitHub</a>.
- If you don't know a detail, suggest reaching out on LinkedIn.
";

/// Chat-completion proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind host.
    pub host: String,
    /// Bind port (0 picks an ephemeral port).
    pub port: u16,
    /// OpenAI-compatible upstream base URL (without `/chat/completions`).
    pub upstream_url: String,
    /// Upstream model identifier.
    pub model: String,
    /// Sampling temperature forwarded upstream.
    pub temperature: f64,
    /// Nucleus sampling threshold forwarded upstream.
    pub top_p: f64,
    /// Optional completion token cap.
    pub max_tokens: Option<u32>,
    /// Environment variable holding the upstream credential.
    pub api_key_env: String,
    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
            upstream_url: "https://api.groq.com/openai/v1".to_owned(),
            model: "llama-3.3-70b-versatile".to_owned(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: None,
            api_key_env: "GROQ_API_KEY".to_owned(),
            timeout_secs: 60,
        }
    }
}

impl ProxyConfig {
    /// Read the upstream credential from the configured environment variable.
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &std::path::Path) -> crate::error::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/folio/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("folio").join("config.toml")
        } else if let Some(config) = dirs::config_dir() {
            config.join("folio").join("config.toml")
        } else {
            PathBuf::from("/tmp/folio-config/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AssistantConfig::default();
        assert_eq!(config.chat.max_history, 20);
        assert_eq!(config.chat.local_cooldown_ms, 600);
        assert_eq!(config.chat.remote_cooldown_ms, 1_000);
        assert_eq!(config.clock.utc_offset_minutes, 345);
        assert_eq!(config.weather.poll_secs, 600);
        assert_eq!(config.proxy.model, "llama-3.3-70b-versatile");
        assert!(config.site.tabs.iter().any(|t| t.id == "projects"));
        assert!(
            config
                .site
                .tabs
                .iter()
                .any(|t| t.id == config.site.default_tab)
        );
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let toml_str = r#"
[proxy]
port = 8787
max_tokens = 512

[chat]
max_history = 4
"#;
        let config: AssistantConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.proxy.port, 8787);
        assert_eq!(config.proxy.max_tokens, Some(512));
        assert_eq!(config.proxy.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.chat.max_history, 4);
        assert_eq!(config.chat.remote_cooldown_ms, 1_000);
        assert_eq!(config.site.place, "Kathmandu");
    }

    #[test]
    fn tabs_parse_with_extra_keywords() {
        let toml_str = r#"
[site]
tabs = [
    { id = "intro" },
    { id = "favorites", keywords = ["favourites"] },
]
default_tab = "intro"
"#;
        let config: AssistantConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.site.tabs.len(), 2);
        assert_eq!(config.site.tabs[1].keywords, vec!["favourites".to_owned()]);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AssistantConfig::default();
        config.proxy.port = 9911;
        config.site.place = "Pokhara".to_owned();
        config.save_to_file(&path).unwrap();

        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.proxy.port, 9911);
        assert_eq!(loaded.site.place, "Pokhara");
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = AssistantConfig::from_file(&path);
        assert!(matches!(
            result,
            Err(crate::error::AssistantError::Config(_))
        ));
    }

    #[test]
    fn load_or_default_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.proxy.port, 3000);
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = AssistantConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("folio"));
    }
}
