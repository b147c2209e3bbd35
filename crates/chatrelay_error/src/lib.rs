//! Error types for the chatrelay generation proxy.
//!
//! Every failure in the relay is a [`ChatRelayError`]: a [`ChatRelayErrorKind`]
//! plus the source location where it was raised. The orchestration boundary
//! turns these into the uniform `{success: false, error}` envelope.

use derive_more::{Display, Error};

/// Specific error conditions raised while relaying a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum ChatRelayErrorKind {
    /// The inbound request is not valid JSON or lacks required fields.
    #[display("Invalid request: {}", _0)]
    Validation(String),

    /// The generation backend could not be reached or its reply could not be read.
    #[display("Generation backend unavailable: {}", _0)]
    Upstream(String),

    /// The generation backend answered with a non-2xx status.
    #[display("Generation backend returned HTTP {}: {}", status, body)]
    BackendStatus {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body returned by the backend
        body: String,
    },

    /// The generation backend answered 2xx but not in the expected shape.
    #[display("Generation backend protocol error: {}", _0)]
    Protocol(String),

    /// Configuration could not be loaded or is invalid.
    #[display("Configuration error: {}", _0)]
    Configuration(String),

    /// Anything else.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

impl ChatRelayErrorKind {
    /// Coarse category label used for logs and metrics.
    ///
    /// Non-2xx statuses are protocol errors: the backend was reachable but
    /// did not honor the contract.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_error::ChatRelayErrorKind;
    ///
    /// let kind = ChatRelayErrorKind::BackendStatus { status: 503, body: "busy".into() };
    /// assert_eq!(kind.category(), "protocol");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upstream(_) => "upstream",
            Self::BackendStatus { .. } | Self::Protocol(_) => "protocol",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }
}

/// Chat relay error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Chat Relay Error: {} at {}:{}", kind, file, line)]
pub struct ChatRelayError {
    /// The specific error kind.
    pub kind: ChatRelayErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl ChatRelayError {
    /// Creates a new error with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_error::{ChatRelayError, ChatRelayErrorKind};
    ///
    /// let err = ChatRelayError::new(ChatRelayErrorKind::Validation("missing field `message`".into()));
    /// assert!(err.to_string().contains("missing field"));
    /// assert_eq!(err.kind.category(), "validation");
    /// ```
    #[track_caller]
    pub fn new(kind: ChatRelayErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a [`ChatRelayErrorKind::Validation`] error.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ChatRelayErrorKind::Validation(message.into()))
    }

    /// Shorthand for a [`ChatRelayErrorKind::Upstream`] error.
    #[track_caller]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ChatRelayErrorKind::Upstream(message.into()))
    }

    /// Shorthand for a [`ChatRelayErrorKind::Protocol`] error.
    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ChatRelayErrorKind::Protocol(message.into()))
    }

    /// Shorthand for a [`ChatRelayErrorKind::Configuration`] error.
    #[track_caller]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatRelayErrorKind::Configuration(message.into()))
    }

    /// Shorthand for a [`ChatRelayErrorKind::Internal`] error.
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ChatRelayErrorKind::Internal(message.into()))
    }

    /// Message suitable for callers: the kind without the source location.
    pub fn public_message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<ChatRelayErrorKind> for ChatRelayError {
    #[track_caller]
    fn from(kind: ChatRelayErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for chat relay operations.
pub type ChatRelayResult<T> = Result<T, ChatRelayError>;
