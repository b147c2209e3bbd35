//! HTTP client for the generation backend.

use crate::GenerationEndpoint;
use async_trait::async_trait;
use chatrelay_core::{GenerationRequest, GenerationResponse, SamplingParams, TextGenerator};
use chatrelay_error::{ChatRelayError, ChatRelayErrorKind, ChatRelayResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// JSON field holding the generated text in backend replies.
pub const DEFAULT_RESPONSE_FIELD: &str = "generated_text";

/// Client that POSTs prompts to a text-generation endpoint.
///
/// One request per call, bounded by the configured timeout. No retries and
/// no streaming. The client holds no per-request state and is shared by all
/// concurrent invocations.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct HttpGenerationClient {
    #[getter(skip)]
    client: Client,
    /// Where prompts are sent
    endpoint: GenerationEndpoint,
    /// Upper bound on one backend call
    timeout: Duration,
    /// JSON field read from the reply
    response_field: String,
}

impl HttpGenerationClient {
    /// Creates a client for `endpoint` whose calls give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    #[instrument(skip_all, fields(endpoint = %endpoint, timeout_ms = timeout.as_millis() as u64))]
    pub fn new(endpoint: GenerationEndpoint, timeout: Duration) -> ChatRelayResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ChatRelayError::configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        debug!(endpoint = %endpoint, "Created generation client");

        Ok(Self {
            client,
            endpoint,
            timeout,
            response_field: DEFAULT_RESPONSE_FIELD.to_string(),
        })
    }

    /// Reads generated text from `field` instead of `generated_text`.
    pub fn with_response_field(mut self, field: impl Into<String>) -> Self {
        self.response_field = field.into();
        self
    }

    /// Sends `prompt` with `sampling` and returns the generated text.
    ///
    /// # Errors
    ///
    /// - [`ChatRelayErrorKind::Upstream`] on transport failure, timeout or a
    ///   body that is not JSON.
    /// - [`ChatRelayErrorKind::BackendStatus`] on a non-2xx status.
    /// - [`ChatRelayErrorKind::Protocol`] when the JSON lacks the text field.
    #[instrument(
        skip(self, prompt, sampling),
        fields(endpoint = %self.endpoint, prompt_len = prompt.len())
    )]
    pub async fn call_generate(
        &self,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> ChatRelayResult<String> {
        let request = GenerationRequest::new(prompt, sampling.clone());
        self.send(&request).await
    }

    async fn send(&self, request: &GenerationRequest) -> ChatRelayResult<String> {
        debug!(
            max_new_tokens = request.sampling().max_new_tokens(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint.url().clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, timed_out = e.is_timeout(), "Generation request failed");
                if e.is_timeout() {
                    ChatRelayError::upstream(format!(
                        "request timed out after {}ms",
                        self.timeout.as_millis()
                    ))
                } else {
                    ChatRelayError::upstream(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                error!(error = ?e, "Failed to read error response body");
                format!("<unreadable body: {}>", e)
            });
            error!(status = %status, body = %body, "Generation backend error");
            return Err(ChatRelayError::new(ChatRelayErrorKind::BackendStatus {
                status: status.as_u16(),
                body,
            }));
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, "Failed to read generation response body");
            ChatRelayError::upstream(format!("failed to read response body: {}", e))
        })?;

        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            error!(error = ?e, "Generation response is not JSON");
            ChatRelayError::upstream(format!("malformed response body: {}", e))
        })?;

        let text = extract_text(&value, &self.response_field)?;
        debug!(generated_len = text.len(), "Received generated text");
        Ok(text)
    }
}

/// Pulls the generated text out of a reply.
///
/// Accepts `{"<field>": "..."}` and the list form `[{"<field>": "..."}]`.
fn extract_text(value: &Value, field: &str) -> ChatRelayResult<String> {
    let object = match value {
        Value::Array(items) => items.first().ok_or_else(|| {
            ChatRelayError::protocol("response is an empty list")
        })?,
        other => other,
    };

    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(ChatRelayError::protocol(format!(
            "field '{}' is not a string: {}",
            field, other
        ))),
        None => Err(ChatRelayError::protocol(format!(
            "response is missing field '{}': {}",
            field, value
        ))),
    }
}

#[async_trait]
impl TextGenerator for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> ChatRelayResult<GenerationResponse> {
        self.send(request).await.map(GenerationResponse::new)
    }

    fn describe(&self) -> String {
        format!("http {}", self.endpoint)
    }
}
