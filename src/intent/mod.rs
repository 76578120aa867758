//! Deterministic intent matching.
//!
//! Utterances are matched against an ordered rule list; the first rule that
//! accepts the text wins. There is no scoring.
//!
//! # Rules, in priority order
//!
//! | # | Phrase pattern | Intent |
//! |---|----------------|--------|
//! | 1 | "hi", "hello", "good evening" (whole utterance) | `Greeting` |
//! | 2 | "who is rishi", "tell me about him", "describe rishikesh" | `AboutOwner` |
//! | 3 | "weather", "temperature", "how's the weather in kathmandu" | `Weather` |
//! | 4 | "time", "what's the time", "time in nepal" | `Time` |
//! | 5 | "help", "what can you do", "commands" | `Help` |
//! | 6 | "play music", "start the song", "play" | `PlayMusic` |
//! | 7 | "pause", "stop the music" | `PauseMusic` |
//! | 8 | "change color to blue", "make it red", "green theme" | `ChangeTheme` |
//! | 9 | "show projects", "take me to contact" | `Navigate` |

mod patterns;

use crate::config::SiteConfig;
use crate::error::{AssistantError, Result};
use crate::theme::Palette;
use regex::Regex;
use std::fmt;

/// An action recognised in an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Small-talk opener.
    Greeting,
    /// Question about the site owner.
    AboutOwner,
    /// Current weather in the home town.
    Weather,
    /// Current time in the home town.
    Time,
    /// List of supported commands.
    Help,
    /// Start background music.
    PlayMusic,
    /// Pause background music.
    PauseMusic,
    /// Switch accent palette.
    ChangeTheme(Palette),
    /// Show a tab.
    Navigate {
        /// Id of the configured tab.
        tab: String,
    },
}

impl Intent {
    /// Stable label for logs.
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Greeting => IntentKind::Greeting,
            Self::AboutOwner => IntentKind::AboutOwner,
            Self::Weather => IntentKind::Weather,
            Self::Time => IntentKind::Time,
            Self::Help => IntentKind::Help,
            Self::PlayMusic => IntentKind::PlayMusic,
            Self::PauseMusic => IntentKind::PauseMusic,
            Self::ChangeTheme(_) => IntentKind::ChangeTheme,
            Self::Navigate { .. } => IntentKind::Navigate,
        }
    }
}

/// Intent variant without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// See [`Intent::Greeting`].
    Greeting,
    /// See [`Intent::AboutOwner`].
    AboutOwner,
    /// See [`Intent::Weather`].
    Weather,
    /// See [`Intent::Time`].
    Time,
    /// See [`Intent::Help`].
    Help,
    /// See [`Intent::PlayMusic`].
    PlayMusic,
    /// See [`Intent::PauseMusic`].
    PauseMusic,
    /// See [`Intent::ChangeTheme`].
    ChangeTheme,
    /// See [`Intent::Navigate`].
    Navigate,
}

impl IntentKind {
    /// Evaluation order. Earlier entries shadow later ones.
    pub const PRIORITY: [IntentKind; 9] = [
        Self::Greeting,
        Self::AboutOwner,
        Self::Weather,
        Self::Time,
        Self::Help,
        Self::PlayMusic,
        Self::PauseMusic,
        Self::ChangeTheme,
        Self::Navigate,
    ];
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::AboutOwner => "about",
            Self::Weather => "weather",
            Self::Time => "time",
            Self::Help => "help",
            Self::PlayMusic => "play",
            Self::PauseMusic => "pause",
            Self::ChangeTheme => "theme",
            Self::Navigate => "navigate",
        };
        f.write_str(s)
    }
}

/// Lowercase and trim an utterance. No stemming or punctuation removal.
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

/// A tab and the lowercase keywords that name it.
#[derive(Debug, Clone)]
struct TabKeywords {
    id: String,
    keywords: Vec<String>,
}

/// Compiled rule list for one site.
#[derive(Debug, Clone)]
pub struct RuleSet {
    greeting: Regex,
    about: [Regex; 2],
    weather: Regex,
    time: Regex,
    help: Regex,
    play: Regex,
    pause: Regex,
    theme_template: Regex,
    theme_bare: Regex,
    tabs: Vec<TabKeywords>,
}

fn compile(src: &str) -> Result<Regex> {
    Regex::new(src).map_err(|e| AssistantError::Config(format!("invalid intent pattern: {e}")))
}

impl RuleSet {
    /// Compile the rules for `site`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if no owner alias is configured or
    /// a configured alias produces an invalid pattern.
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let lower = |v: &[String]| {
            v.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        let owner = lower(&site.owner_aliases);
        let places = lower(&site.place_aliases);
        if owner.is_empty() {
            return Err(AssistantError::Config(
                "site.owner_aliases must name the owner at least once".into(),
            ));
        }

        let tabs = site
            .tabs
            .iter()
            .map(|t| TabKeywords {
                id: t.id.clone(),
                keywords: std::iter::once(t.id.to_lowercase())
                    .chain(t.keywords.iter().map(|k| k.to_lowercase()))
                    .filter(|k| !k.trim().is_empty())
                    .collect(),
            })
            .collect();

        Ok(Self {
            greeting: compile(patterns::GREETING)?,
            about: [
                compile(&patterns::about_subject(&owner))?,
                compile(&patterns::about_leading(&owner))?,
            ],
            weather: compile(&patterns::weather(&places))?,
            time: compile(&patterns::time(&places))?,
            help: compile(patterns::HELP)?,
            play: compile(patterns::PLAY)?,
            pause: compile(patterns::PAUSE)?,
            theme_template: compile(&patterns::theme_template())?,
            theme_bare: compile(&patterns::theme_bare())?,
            tabs,
        })
    }

    /// First intent accepted by `text`, which must already be normalized.
    pub fn match_intent(&self, text: &str) -> Option<Intent> {
        IntentKind::PRIORITY
            .into_iter()
            .find_map(|kind| self.try_rule(kind, text))
    }

    fn try_rule(&self, kind: IntentKind, t: &str) -> Option<Intent> {
        match kind {
            IntentKind::Greeting => self.greeting.is_match(t).then_some(Intent::Greeting),
            IntentKind::AboutOwner => self
                .about
                .iter()
                .any(|re| re.is_match(t))
                .then_some(Intent::AboutOwner),
            IntentKind::Weather => self.weather.is_match(t).then_some(Intent::Weather),
            IntentKind::Time => {
                (self.time.is_match(t) || t == "what time is it").then_some(Intent::Time)
            }
            IntentKind::Help => self.help.is_match(t).then_some(Intent::Help),
            IntentKind::PlayMusic => {
                (self.play.is_match(t) || t == "play" || t == "play music")
                    .then_some(Intent::PlayMusic)
            }
            IntentKind::PauseMusic => {
                (self.pause.is_match(t) || t == "pause" || t == "stop")
                    .then_some(Intent::PauseMusic)
            }
            IntentKind::ChangeTheme => self.match_theme(t).map(Intent::ChangeTheme),
            IntentKind::Navigate => self.match_tab(t).map(|tab| Intent::Navigate { tab }),
        }
    }

    fn match_theme(&self, t: &str) -> Option<Palette> {
        let caps = self
            .theme_template
            .captures(t)
            .or_else(|| self.theme_bare.captures(t))?;
        caps.get(1)?.as_str().parse().ok()
    }

    fn match_tab(&self, t: &str) -> Option<String> {
        if !patterns::NAVIGATION_VERBS.iter().any(|v| t.contains(v)) {
            return None;
        }
        self.tabs
            .iter()
            .find(|tab| tab.keywords.iter().any(|k| t.contains(k.as_str())))
            .map(|tab| tab.id.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::TabSpec;

    fn rules() -> RuleSet {
        RuleSet::new(&SiteConfig::default()).unwrap()
    }

    fn matched(text: &str) -> Option<Intent> {
        rules().match_intent(&normalize(text))
    }

    #[test]
    fn greetings_match_whole_utterance_only() {
        for g in ["hi", "Hello", "hey.", "what's up", "good evening", "  yo  "] {
            assert_eq!(matched(g), Some(Intent::Greeting), "{g}");
        }
        assert_ne!(matched("hi there, show projects"), Some(Intent::Greeting));
    }

    #[test]
    fn about_owner_variants() {
        for q in [
            "who is rishikesh",
            "tell me about him",
            "who's this",
            "introduce rishi",
            "describe him please",
            "what about the developer",
        ] {
            assert_eq!(matched(q), Some(Intent::AboutOwner), "{q}");
        }
    }

    #[test]
    fn weather_and_time() {
        assert_eq!(matched("what's the weather in kathmandu"), Some(Intent::Weather));
        assert_eq!(matched("temperature"), Some(Intent::Weather));
        assert_eq!(matched("what time is it"), Some(Intent::Time));
        assert_eq!(matched("current time in nepal"), Some(Intent::Time));
    }

    #[test]
    fn music_controls() {
        assert_eq!(matched("play music"), Some(Intent::PlayMusic));
        assert_eq!(matched("start the song"), Some(Intent::PlayMusic));
        assert_eq!(matched("play"), Some(Intent::PlayMusic));
        assert_eq!(matched("stop the music"), Some(Intent::PauseMusic));
        assert_eq!(matched("pause"), Some(Intent::PauseMusic));
    }

    #[test]
    fn theme_templates_and_bare_words() {
        assert_eq!(
            matched("change color to blue"),
            Some(Intent::ChangeTheme(Palette::Blue))
        );
        assert_eq!(matched("make it teal"), Some(Intent::ChangeTheme(Palette::Teal)));
        assert_eq!(matched("green theme"), Some(Intent::ChangeTheme(Palette::Green)));
        assert_eq!(matched("magenta"), None);
    }

    #[test]
    fn bare_colour_matches_inside_unrelated_words() {
        // Known overreach: "bored" contains "red".
        assert_eq!(matched("i'm bored"), Some(Intent::ChangeTheme(Palette::Red)));
    }

    #[test]
    fn navigation_needs_verb_and_known_tab() {
        assert_eq!(
            matched("show projects"),
            Some(Intent::Navigate {
                tab: "projects".into()
            })
        );
        assert_eq!(
            matched("take me to contact"),
            Some(Intent::Navigate {
                tab: "contact".into()
            })
        );
        assert_eq!(matched("projects"), None);
        assert_eq!(matched("show nonexistenttab"), None);
    }

    #[test]
    fn earlier_rules_shadow_later_ones() {
        // Help beats navigation.
        assert_eq!(matched("show me the commands"), Some(Intent::Help));
        // Weather beats theme even with a colour word present.
        assert_eq!(matched("is the weather blue"), Some(Intent::Weather));
        // "switch to red" is a theme change, not navigation.
        assert_eq!(matched("switch to red"), Some(Intent::ChangeTheme(Palette::Red)));
    }

    #[test]
    fn extra_tab_keywords_resolve_to_tab_id() {
        let mut site = SiteConfig::default();
        site.tabs.push(TabSpec {
            id: "blog".into(),
            keywords: vec!["articles".into()],
        });
        let rules = RuleSet::new(&site).unwrap();
        assert_eq!(
            rules.match_intent("open articles"),
            Some(Intent::Navigate { tab: "blog".into() })
        );
    }

    #[test]
    fn blank_owner_aliases_are_rejected() {
        let mut site = SiteConfig::default();
        site.owner_aliases = vec!["  ".into()];
        assert!(matches!(RuleSet::new(&site), Err(AssistantError::Config(_))));

        site.owner_aliases = vec!["".into(), "rishi".into()];
        let rules = RuleSet::new(&site).unwrap();
        assert_eq!(rules.match_intent("tell me about yourself"), None);
        assert_eq!(rules.match_intent("tell me about rishi"), Some(Intent::AboutOwner));
    }

    #[test]
    fn priority_lists_every_kind_once() {
        let mut seen = IntentKind::PRIORITY.to_vec();
        seen.dedup();
        assert_eq!(seen.len(), 9);
    }
}
