//! Voice path: recogniser events in, status lines and spoken replies out.
//!
//! The host environment does the acoustic work and reports
//! [`RecognitionEvent`]s. Final transcripts are interpreted in spoken mode.
//! The voice path never calls the remote fallback; an unmatched transcript
//! gets a hint instead.

use crate::error::{AssistantError, Result};
use crate::interpreter::{CommandInterpreter, Interpretation, ReplyMode};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Delay before listening again after the first silent attempt.
pub const NO_SPEECH_RETRY_DELAY: Duration = Duration::from_millis(1_500);

const UNSUPPORTED: &str = "Voice recognition is not supported in this browser. Try Chrome or Edge.";
const NO_MATCH: &str = "I heard something but couldn't match it. Say help to hear what you can ask.";
const NO_SPEECH_RETRY: &str = "I didn't hear anything. Try again now, speak right after the beep.";
const NO_SPEECH: &str = "I still didn't hear anything. Check that your microphone works and speak clearly right after clicking.";
const DENIED: &str = "Microphone access was denied. Please allow the microphone and try again.";
const NO_MICROPHONE: &str = "No microphone found. Check your device.";
const NETWORK: &str = "Network error. Check your connection.";
const GENERIC: &str = "Something went wrong. Try again.";

/// Error codes reported by the recogniser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Nothing was heard.
    NoSpeech,
    /// The visitor refused microphone access.
    NotAllowed,
    /// The host refused the recognition service.
    ServiceNotAllowed,
    /// No capture device.
    AudioCapture,
    /// Recognition service unreachable.
    Network,
    /// Any other code.
    Other(String),
}

impl RecognitionError {
    /// Message spoken for this error, ignoring the retry policy.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoSpeech => NO_SPEECH,
            Self::NotAllowed | Self::ServiceNotAllowed => DENIED,
            Self::AudioCapture => NO_MICROPHONE,
            Self::Network => NETWORK,
            Self::Other(_) => GENERIC,
        }
    }
}

impl FromStr for RecognitionError {
    type Err = std::convert::Infallible;

    fn from_str(code: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match code {
            "no-speech" => Self::NoSpeech,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            other => Self::Other(other.to_owned()),
        })
    }
}

/// Something the recogniser reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Listening began.
    Started,
    /// Speech onset detected.
    SpeechStarted,
    /// A transcript, interim or final.
    Transcript {
        /// Best alternative.
        text: String,
        /// Whether the recogniser will revise it.
        is_final: bool,
    },
    /// Audio was heard but no transcript was produced.
    NoMatch,
    /// The attempt failed.
    Error(RecognitionError),
    /// Listening stopped.
    Ended,
}

/// What the shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceAction {
    /// Show a status line.
    Status(String),
    /// Speak a reply.
    Speak(String),
    /// Speak, then start listening again after `after`.
    Retry {
        /// Prompt to speak first.
        speak: String,
        /// Delay before restarting.
        after: Duration,
    },
    /// Clear the status line.
    Idle,
}

/// Voice interaction state for one visit.
pub struct VoiceSession {
    interpreter: Arc<CommandInterpreter>,
    owner_name: String,
    supported: bool,
    unsupported_reported: bool,
    no_speech_retried: bool,
}

impl VoiceSession {
    /// Create a session. `supported` reports whether the host can recognise speech.
    pub fn new(interpreter: Arc<CommandInterpreter>, owner_name: impl Into<String>, supported: bool) -> Self {
        Self {
            interpreter,
            owner_name: owner_name.into(),
            supported,
            unsupported_reported: false,
            no_speech_retried: false,
        }
    }

    /// Begin a listening attempt.
    ///
    /// # Errors
    ///
    /// Without recognition support the first call returns a spoken notice;
    /// later calls return [`AssistantError::UnsupportedEnvironment`].
    pub fn start_listening(&mut self) -> Result<VoiceAction> {
        if !self.supported {
            if self.unsupported_reported {
                return Err(AssistantError::UnsupportedEnvironment(
                    "speech recognition unavailable".into(),
                ));
            }
            self.unsupported_reported = true;
            info!("speech recognition unavailable; voice disabled for this session");
            return Ok(VoiceAction::Speak(UNSUPPORTED.to_owned()));
        }
        self.no_speech_retried = false;
        Ok(VoiceAction::Status("Listening... speak now".to_owned()))
    }

    /// React to a recogniser event.
    pub fn handle(&mut self, event: RecognitionEvent) -> VoiceAction {
        match event {
            RecognitionEvent::Started => VoiceAction::Status("Listening... speak now".to_owned()),
            RecognitionEvent::SpeechStarted => VoiceAction::Status("Hearing you...".to_owned()),
            RecognitionEvent::Transcript { text, is_final } => self.on_transcript(text.trim(), is_final),
            RecognitionEvent::NoMatch => VoiceAction::Speak(NO_MATCH.to_owned()),
            RecognitionEvent::Error(RecognitionError::NoSpeech) if !self.no_speech_retried => {
                self.no_speech_retried = true;
                VoiceAction::Retry {
                    speak: NO_SPEECH_RETRY.to_owned(),
                    after: NO_SPEECH_RETRY_DELAY,
                }
            }
            RecognitionEvent::Error(e) => {
                debug!(error = ?e, "recognition failed");
                VoiceAction::Speak(e.message().to_owned())
            }
            RecognitionEvent::Ended => VoiceAction::Idle,
        }
    }

    fn on_transcript(&self, text: &str, is_final: bool) -> VoiceAction {
        if text.is_empty() {
            return VoiceAction::Idle;
        }
        if !is_final {
            return VoiceAction::Status(format!("\"{text}\""));
        }
        match self.interpreter.interpret(text, ReplyMode::Spoken) {
            Interpretation::Reply { text, .. } => VoiceAction::Speak(text),
            Interpretation::Unmatched => VoiceAction::Speak(format!(
                "I didn't catch that. Try: Who is {}, what's the weather, play music, or change color to blue. Say help for more options.",
                self.owner_name
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::AssistantConfig;
    use crate::state::SessionStore;
    use crate::theme::Palette;

    fn session(supported: bool) -> VoiceSession {
        let config = AssistantConfig::default();
        let store = SessionStore::shared(&config).unwrap();
        let interp = Arc::new(CommandInterpreter::new(&config, store).unwrap());
        VoiceSession::new(interp, "Rishikesh", supported)
    }

    fn transcript(text: &str, is_final: bool) -> RecognitionEvent {
        RecognitionEvent::Transcript {
            text: text.to_owned(),
            is_final,
        }
    }

    #[test]
    fn interim_updates_status_and_final_runs_command() {
        let mut voice = session(true);
        assert_eq!(
            voice.handle(transcript("change col", false)),
            VoiceAction::Status("\"change col\"".into())
        );
        assert_eq!(
            voice.handle(transcript("change color to pink", true)),
            VoiceAction::Speak("Theme changed to pink.".into())
        );
        assert_eq!(voice.interpreter.store().theme(), Palette::Pink);
    }

    #[test]
    fn unmatched_final_gets_hint() {
        let mut voice = session(true);
        match voice.handle(transcript("sing me a lullaby", true)) {
            VoiceAction::Speak(text) => assert!(text.starts_with("I didn't catch that.")),
            other => unreachable!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn no_speech_retries_once_per_attempt() {
        let mut voice = session(true);
        voice.start_listening().unwrap();
        let silent = || RecognitionEvent::Error(RecognitionError::NoSpeech);

        assert!(matches!(voice.handle(silent()), VoiceAction::Retry { after, .. } if after == NO_SPEECH_RETRY_DELAY));
        assert_eq!(voice.handle(silent()), VoiceAction::Speak(NO_SPEECH.into()));

        voice.start_listening().unwrap();
        assert!(matches!(voice.handle(silent()), VoiceAction::Retry { .. }));
    }

    #[test]
    fn error_codes_map_to_messages() {
        let mut voice = session(true);
        for (code, msg) in [
            ("not-allowed", DENIED),
            ("service-not-allowed", DENIED),
            ("audio-capture", NO_MICROPHONE),
            ("network", NETWORK),
            ("aborted", GENERIC),
        ] {
            let err: RecognitionError = code.parse().unwrap();
            assert_eq!(voice.handle(RecognitionEvent::Error(err)), VoiceAction::Speak(msg.into()));
        }
    }

    #[test]
    fn unsupported_environment_is_reported_once() {
        let mut voice = session(false);
        assert_eq!(
            voice.start_listening().unwrap(),
            VoiceAction::Speak(UNSUPPORTED.into())
        );
        assert!(matches!(
            voice.start_listening(),
            Err(AssistantError::UnsupportedEnvironment(_))
        ));
    }
}
