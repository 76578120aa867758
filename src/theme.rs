//! Accent palette and CSS variable generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accent colour applied to the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Cyan accent (initial theme).
    #[default]
    Cyan,
    /// Blue accent.
    Blue,
    /// Purple accent.
    Purple,
    /// Green accent.
    Green,
    /// Red accent.
    Red,
    /// Orange accent.
    Orange,
    /// Pink accent.
    Pink,
    /// Teal accent.
    Teal,
    /// Yellow accent.
    Yellow,
}

impl Palette {
    /// Every palette entry, in the order colour words are matched.
    pub const ALL: [Palette; 9] = [
        Self::Cyan,
        Self::Blue,
        Self::Purple,
        Self::Green,
        Self::Red,
        Self::Orange,
        Self::Pink,
        Self::Teal,
        Self::Yellow,
    ];

    /// Lowercase colour word.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Green => "green",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Teal => "teal",
            Self::Yellow => "yellow",
        }
    }

    /// Primary accent as a hex colour.
    pub fn primary(self) -> &'static str {
        match self {
            Self::Cyan => "#00d2ff",
            Self::Blue => "#4dabf7",
            Self::Purple => "#9775fa",
            Self::Green => "#51cf66",
            Self::Red => "#ff6b6b",
            Self::Orange => "#ff922b",
            Self::Pink => "#f06595",
            Self::Teal => "#20c997",
            Self::Yellow => "#ffd43b",
        }
    }

    /// Secondary accent as a hex colour.
    pub fn secondary(self) -> &'static str {
        match self {
            Self::Cyan => "#3a7bd5",
            Self::Blue => "#228be6",
            Self::Purple => "#7950f2",
            Self::Green => "#37b24d",
            Self::Red => "#fa5252",
            Self::Orange => "#fd7e14",
            Self::Pink => "#e64980",
            Self::Teal => "#0ca678",
            Self::Yellow => "#fab005",
        }
    }

    /// CSS custom properties the shell applies to the document root.
    pub fn css_variables(self) -> String {
        format!(
            "--primary-color: {}; --secondary-color: {};",
            self.primary(),
            self.secondary()
        )
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a word is not a palette colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown palette colour: {0}")]
pub struct UnknownPalette(pub String);

impl FromStr for Palette {
    type Err = UnknownPalette;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or(UnknownPalette(wanted))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Blue".parse::<Palette>().unwrap(), Palette::Blue);
        assert_eq!(" teal ".parse::<Palette>().unwrap(), Palette::Teal);
        assert!("magenta".parse::<Palette>().is_err());
    }

    #[test]
    fn css_variables_carry_both_accents() {
        let css = Palette::Purple.css_variables();
        assert!(css.contains("--primary-color: #9775fa"));
        assert!(css.contains("--secondary-color: #7950f2"));
    }

    #[test]
    fn default_is_cyan() {
        assert_eq!(Palette::default(), Palette::Cyan);
        assert_eq!(Palette::default().to_string(), "cyan");
    }
}
