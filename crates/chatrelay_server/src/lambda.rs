//! Serverless proxy-event adapter.
//!
//! Translates an API-gateway proxy event into a chat request and the chat
//! envelope back into a proxy response. The translation is pure apart from
//! the backend call made by [`ChatService::handle`].

use crate::{
    CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CallerIdentity, ChatEnvelope, ChatService,
};
use chatrelay_core::region_from_arn;
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Inbound proxy event. Only the fields the relay reads are modeled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// Raw request body
    #[serde(default)]
    pub body: Option<String>,
    /// HTTP method of the original request
    #[serde(default)]
    pub http_method: Option<String>,
    /// Gateway-supplied context
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

/// Gateway request context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authorizer output
    #[serde(default)]
    pub authorizer: Option<Authorizer>,
}

/// Authorizer output attached by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorizer {
    /// Verified identity claims
    #[serde(default)]
    pub claims: Option<Value>,
}

/// Outbound proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Serialized body
    pub body: String,
}

impl ProxyEvent {
    /// Caller identity from the authorizer claims, if present and readable.
    pub fn caller(&self) -> Option<CallerIdentity> {
        let claims = self
            .request_context
            .as_ref()?
            .authorizer
            .as_ref()?
            .claims
            .as_ref()?;
        let identity = CallerIdentity::from_claims(claims);
        if identity.is_none() {
            warn!("Ignoring unreadable authorizer claims");
        }
        identity
    }

    /// Parses an event from JSON text, e.g. a saved gateway event.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the text is not a proxy event.
    pub fn from_json(raw: &str) -> ChatRelayResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ChatRelayError::validation(format!("malformed proxy event: {}", e)))
    }

    /// Reads and parses an event from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an internal error when reading fails and a validation error
    /// when the content is not a proxy event.
    pub fn from_reader(mut reader: impl Read) -> ChatRelayResult<Self> {
        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .map_err(|e| ChatRelayError::internal(format!("Failed to read event: {}", e)))?;
        Self::from_json(&raw)
    }

    /// Reads and parses an event file.
    ///
    /// # Errors
    ///
    /// See [`ProxyEvent::from_reader`].
    pub fn from_file(path: impl AsRef<Path>) -> ChatRelayResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ChatRelayError::internal(format!("Failed to open event {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    fn is_preflight(&self) -> bool {
        self.http_method
            .as_deref()
            .is_some_and(|method| method.eq_ignore_ascii_case("OPTIONS"))
    }
}

impl ProxyResponse {
    fn new(status_code: u16, body: String) -> Self {
        let headers = [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS),
            ("Access-Control-Allow-Methods", CORS_ALLOW_METHODS),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        Self {
            status_code,
            headers,
            body,
        }
    }

    fn from_envelope(envelope: &ChatEnvelope) -> Self {
        Self::new(envelope.status_code().as_u16(), envelope.to_json())
    }

    /// Parses the body back into an envelope.
    pub fn envelope(&self) -> Option<ChatEnvelope> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Handles one proxy event.
///
/// `function_arn` identifies the invoked function; its region is logged.
#[instrument(skip_all)]
pub async fn handle_event(
    service: &ChatService,
    event: ProxyEvent,
    function_arn: Option<&str>,
) -> ProxyResponse {
    if let Some(region) = function_arn.and_then(region_from_arn) {
        info!(region, "Handling proxy event");
    }

    if event.is_preflight() {
        return ProxyResponse::new(200, String::new());
    }

    let caller = event.caller();
    match event.body.as_deref() {
        Some(body) => {
            let envelope = service.handle(body.as_bytes(), caller.as_ref()).await;
            ProxyResponse::from_envelope(&envelope)
        }
        None => {
            let err = ChatRelayError::validation("request body is missing");
            warn!(error = %err, "Rejecting proxy event");
            ProxyResponse::from_envelope(&service.reject(&err))
        }
    }
}
