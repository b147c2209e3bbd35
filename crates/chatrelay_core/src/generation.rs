//! Generation request/response shapes and the backend seam.

use crate::SamplingParams;
use async_trait::async_trait;
use chatrelay_error::ChatRelayResult;
use serde::{Deserialize, Serialize};

/// Payload sent to the generation backend.
///
/// Serializes to `{prompt, max_new_tokens, do_sample, temperature, top_p}`.
///
/// # Examples
///
/// ```
/// use chatrelay_core::{GenerationRequest, SamplingParams};
///
/// let request = GenerationRequest::new("User: Hello", SamplingParams::default());
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["prompt"], "User: Hello");
/// assert_eq!(json["max_new_tokens"], 512);
/// assert_eq!(json["do_sample"], true);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// Flattened conversation prompt
    prompt: String,
    /// Sampling settings
    #[serde(flatten)]
    #[builder(default)]
    sampling: SamplingParams,
}

impl GenerationRequest {
    /// Creates a request for `prompt` with the given sampling settings.
    pub fn new(prompt: impl Into<String>, sampling: SamplingParams) -> Self {
        Self {
            prompt: prompt.into(),
            sampling,
        }
    }

    /// Returns a builder for constructing a GenerationRequest.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }
}

/// Text produced by the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationResponse {
    /// Generated text
    generated_text: String,
}

impl GenerationResponse {
    /// Wraps generated text.
    pub fn new(generated_text: impl Into<String>) -> Self {
        Self {
            generated_text: generated_text.into(),
        }
    }

    /// Consumes the response, returning the generated text.
    pub fn into_text(self) -> String {
        self.generated_text
    }
}

/// A backend that turns a prompt into generated text.
///
/// Implementations make exactly one attempt per call; retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> ChatRelayResult<GenerationResponse>;

    /// Short description of the backend for logs.
    fn describe(&self) -> String;
}
