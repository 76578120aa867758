//! Folio: assistant core for a personal portfolio site.
//!
//! Visitors type or speak free-form requests. A deterministic rule set maps
//! them to portfolio actions (switch tab, change accent colour, play or
//! pause music, answer weather/time/about questions). Anything no rule
//! handles goes to a remote chat-completion model through a small proxy
//! that keeps the provider credential server-side.
//!
//! # Architecture
//!
//! - **State**: [`SessionStore`] owns the per-visit state
//! - **Intent**: [`intent::RuleSet`] matches normalized text, first rule wins
//! - **Interpreter**: [`CommandInterpreter`] runs the matched action
//! - **Chat**: [`chat::session::ChatSession`] applies the cooldown and falls
//!   back to [`chat::FallbackClient`]
//! - **Voice**: [`voice::VoiceSession`] turns recogniser events into replies
//! - **Proxy**: [`proxy::ProxyServer`] forwards transcripts upstream
//! - **Scheduler**: clock and weather widget tasks

pub mod chat;
pub mod clock;
pub mod config;
pub mod error;
pub mod intent;
pub mod interpreter;
pub mod markup;
pub mod proxy;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod theme;
pub mod voice;
pub mod weather;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use interpreter::{CommandInterpreter, Interpretation, ReplyMode};
pub use runtime::AssistantEvent;
pub use state::{SessionStore, SharedStore};
pub use theme::Palette;
