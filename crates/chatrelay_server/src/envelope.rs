//! Inbound request and outbound envelope shapes.

use axum::http::{HeaderName, StatusCode, header};
use chatrelay_core::Transcript;
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde::{Deserialize, Serialize};

/// Headers allowed by the CORS policy.
pub const CORS_ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
/// Methods allowed by the CORS policy.
pub const CORS_ALLOW_METHODS: &str = "OPTIONS,POST";

/// Headers attached to every response, success or failure.
pub fn response_headers() -> [(HeaderName, &'static str); 4] {
    [
        (header::CONTENT_TYPE, "application/json"),
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS),
        (header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS),
    ]
}

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The new user message
    message: String,
    /// Prior transcript supplied by the caller; `null` or absent means empty
    #[serde(default)]
    conversation_history: Option<Transcript>,
}

impl ChatRequest {
    /// Creates a request.
    pub fn new(message: impl Into<String>, conversation_history: Transcript) -> Self {
        Self {
            message: message.into(),
            conversation_history: Some(conversation_history),
        }
    }

    /// Parses a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid JSON, a missing or non-string
    /// `message`, or a malformed `conversationHistory`.
    pub fn from_slice(body: &[u8]) -> ChatRelayResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ChatRelayError::validation(format!("malformed request body: {}", e)))
    }

    /// Splits the request into the message and the (possibly empty) history.
    pub fn into_parts(self) -> (String, Transcript) {
        (self.message, self.conversation_history.unwrap_or_default())
    }
}

/// Uniform response envelope.
///
/// The `success` flag is always present so callers can branch on it without
/// inspecting the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatEnvelope {
    /// Generation succeeded.
    Success {
        /// Always `true`
        success: bool,
        /// Generated text
        response: String,
        /// Input transcript plus the user and assistant turns
        #[serde(rename = "conversationHistory")]
        conversation_history: Transcript,
    },
    /// Anything failed.
    Failure {
        /// Always `false`
        success: bool,
        /// Human-readable failure description
        error: String,
    },
}

impl ChatEnvelope {
    /// Success envelope.
    pub fn success(response: impl Into<String>, conversation_history: Transcript) -> Self {
        Self::Success {
            success: true,
            response: response.into(),
            conversation_history,
        }
    }

    /// Failure envelope.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
        }
    }

    /// Failure envelope for `error`, without its source location.
    pub fn from_error(error: &ChatRelayError) -> Self {
        Self::failure(error.public_message())
    }

    /// True for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// HTTP status for this envelope: 200 or 500.
    pub fn status_code(&self) -> StatusCode {
        if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Serialized JSON body.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":"failed to serialize response: {}"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }
}
