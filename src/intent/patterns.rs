//! Regular expression sources for the intent rules.
//!
//! Patterns run against normalized (lowercased, trimmed) text. Owner names
//! and place names come from configuration and are escaped before they are
//! spliced into an alternation.

use crate::theme::Palette;

/// Closed greeting set, anchored to the whole utterance.
pub(crate) const GREETING: &str = r"^(?:hi|hello|hey|yo|sup|what'?s up|howdy|good morning|good afternoon|good evening)\s*\.?$";

/// Capability questions.
pub(crate) const HELP: &str = r"\b(?:help|what can you do|commands|what do you do|how do (?:you|i) (?:work|use this)|what (?:can i|should i) say)\b";

/// "play the music", "start song".
pub(crate) const PLAY: &str = r"(?:play|start)\s*(?:the\s*)?(?:music|song)";

/// "pause", "stop the song". The noun is optional.
pub(crate) const PAUSE: &str = r"(?:pause|stop)\s*(?:the\s*)?(?:music|song)?";

/// Subjects that refer to the owner without naming them.
pub(crate) const GENERIC_SUBJECTS: [&str; 5] =
    ["him", "this guy", "this person", "the owner", "the developer"];

/// Verbs that make a tab keyword a navigation request.
pub(crate) const NAVIGATION_VERBS: [&str; 5] = ["show", "go", "open", "switch", "take me"];

/// Escaped alternation body. Blank words are skipped so no branch is empty.
fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// "who is / tell me about / about <subject>".
pub(crate) fn about_subject(owner_aliases: &[String]) -> String {
    let subjects = alternation(
        owner_aliases
            .iter()
            .map(String::as_str)
            .chain(GENERIC_SUBJECTS),
    );
    format!(r"\b(?:who is|tell me about|about)\s*(?:{subjects})\b")
}

/// "who's this", "introduce him", "describe <owner>" at the start of the text.
pub(crate) fn about_leading(owner_aliases: &[String]) -> String {
    let names = alternation(owner_aliases.iter().map(String::as_str));
    format!(
        r"^(?:who(?:'?s| is) (?:{names}|this)|introduce (?:{names}|him)|describe (?:{names}|him))\b"
    )
}

/// Weather vocabulary, optionally place-qualified.
pub(crate) fn weather(place_aliases: &[String]) -> String {
    let places = alternation(place_aliases.iter().map(String::as_str));
    format!(
        r"\b(?:weather|temperature|how(?:'?s| is) (?:the )?weather|what'?s (?:the )?weather|weather in (?:{places})?)\b"
    )
}

/// Time vocabulary, optionally place-qualified.
pub(crate) fn time(place_aliases: &[String]) -> String {
    let places = alternation(place_aliases.iter().map(String::as_str));
    format!(r"\b(?:time|what(?:'?s| is) (?:the )?time|current time|time in (?:{places})?)\b")
}

/// Phrasing template followed by a palette colour. Group 1 is the colour.
pub(crate) fn theme_template() -> String {
    let colours = alternation(Palette::ALL.iter().map(|p| p.name()));
    format!(
        r"(?:change\s*(?:color\s*)?to\s*|color\s*change\s*to\s*|make\s*it\s*|set\s*to\s*|switch\s*to\s*|theme\s*)({colours})"
    )
}

/// A palette colour anywhere in the text. Group 1 is the colour.
///
/// Unanchored: colour words inside other words match too ("bored" contains "red").
pub(crate) fn theme_bare() -> String {
    let colours = alternation(Palette::ALL.iter().map(|p| p.name()));
    format!(r"({colours})\s*(?:theme|color)?")
}
