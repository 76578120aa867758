//! Error types for the folio assistant.

/// Top-level error type for the portfolio assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Configuration error (unreadable file, bad TOML, invalid pattern).
    #[error("config error: {0}")]
    Config(String),

    /// Weather provider error.
    #[error("weather error: {0}")]
    Weather(String),

    /// Chat proxy startup or runtime error.
    #[error("proxy error: {0}")]
    Proxy(String),

    /// A host capability (speech recognition, microphone) is missing.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// A tab id that is not part of the site's tab set.
    #[error("unknown tab: {0}")]
    UnknownTab(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
