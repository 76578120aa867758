//! Conversation history for the remote fallback.
//!
//! Entry 0 is always the system turn. Everything after it is a bounded
//! window of the most recent user/assistant turns; trimming removes the
//! oldest turns directly after the system turn.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions seeded at the start of the conversation.
    System,
    /// Visitor input.
    User,
    /// Remote model reply.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single `{role, content}` entry, serialized exactly as the chat wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl Turn {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// System turn plus a bounded window of recent turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    system: Turn,
    /// Turns after the system turn, oldest first.
    turns: VecDeque<Turn>,
    /// Maximum number of turns kept after the system turn.
    max_turns: usize,
}

impl ConversationHistory {
    /// Create a history seeded with `system_prompt`, keeping at most
    /// `max_turns` turns after it. The newest turn is always kept.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            system: Turn::system(system_prompt),
            turns: VecDeque::with_capacity(max_turns.saturating_add(1)),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest non-system turns past the bound.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Full transcript including the system turn, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Turn> {
        std::iter::once(&self.system)
            .chain(self.turns.iter())
            .cloned()
            .collect()
    }

    /// Total entries including the system turn.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len() + 1
    }

    /// Always false: the system turn is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn starts_with_system_turn_only() {
        let history = ConversationHistory::new("be nice", 4);
        assert_eq!(history.len(), 1);
        assert_eq!(history.to_vec(), vec![Turn::system("be nice")]);
    }

    #[test]
    fn eviction_keeps_system_turn_at_index_zero() {
        let mut history = ConversationHistory::new("sys", 3);
        for i in 0..5 {
            history.push(Turn::user(format!("q{i}")));
        }

        assert_eq!(history.len(), 4);
        let all = history.to_vec();
        assert_eq!(all[0], Turn::system("sys"));
        assert_eq!(all[1].content, "q2");
        assert_eq!(all[3].content, "q4");
    }

    #[test]
    fn zero_bound_still_keeps_newest_turn() {
        let mut history = ConversationHistory::new("sys", 0);
        history.push(Turn::user("first"));
        history.push(Turn::user("what is his github"));

        assert_eq!(
            history.to_vec(),
            vec![Turn::system("sys"), Turn::user("what is his github")]
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
