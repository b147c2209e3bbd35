//! Chat orchestration: prompt, generate, grow the transcript.

use crate::{CallerIdentity, ChatEnvelope, ChatRequest, RelayConfig, RelayMetrics};
use chatrelay_backend::HttpGenerationClient;
use chatrelay_core::{
    GenerationRequest, PromptBuilder, Role, SamplingParams, TextGenerator, Transcript,
};
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Result of one successful exchange.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct ChatReply {
    /// Generated text
    response: String,
    /// Input transcript plus the user and assistant turns
    transcript: Transcript,
}

impl ChatReply {
    /// Converts the reply into the success envelope.
    pub fn into_envelope(self) -> ChatEnvelope {
        ChatEnvelope::success(self.response, self.transcript)
    }
}

/// Stateless chat relay.
///
/// Holds only immutable configuration and a shared generator, so one
/// instance serves any number of concurrent requests. Every request owns its
/// transcript and prompt.
#[derive(Clone, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct ChatService {
    /// Backend that produces replies
    generator: Arc<dyn TextGenerator>,
    /// Prompt window and labels
    #[builder(default)]
    prompt: PromptBuilder,
    /// Sampling settings forwarded with every prompt
    #[builder(default)]
    sampling: SamplingParams,
    /// Request metrics
    #[builder(default)]
    metrics: RelayMetrics,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("generator", &self.generator.describe())
            .field("prompt", &self.prompt)
            .field("sampling", &self.sampling)
            .finish()
    }
}

impl ChatService {
    /// Returns a builder for constructing a ChatService.
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    /// Creates a service with the given generator and default settings.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            prompt: PromptBuilder::default(),
            sampling: SamplingParams::default(),
            metrics: RelayMetrics::default(),
        }
    }

    /// Builds the HTTP generation client and the service from `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings.
    #[instrument(skip_all)]
    pub fn from_config(config: &RelayConfig) -> ChatRelayResult<Self> {
        config.validate()?;
        let endpoint = config.endpoint()?;
        if config.uses_placeholder_backend() {
            warn!(
                endpoint = %endpoint,
                "No generation backend configured, using the placeholder endpoint"
            );
        }

        let client = HttpGenerationClient::new(endpoint, config.timeout())?
            .with_response_field(&config.backend.response_field);

        let service = Self {
            generator: Arc::new(client),
            prompt: PromptBuilder::new(config.window()?, config.labels()),
            sampling: config.sampling.clone(),
            metrics: RelayMetrics::default(),
        };
        info!(service = ?service, "Chat service ready");
        Ok(service)
    }

    /// Prompt builder in use.
    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// Sampling settings in use.
    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    /// Runs one exchange.
    ///
    /// The prompt is built from the supplied history and the new message. The
    /// user turn is appended as soon as the request is accepted, before the
    /// backend call; the assistant turn follows once generation succeeds. On
    /// failure the pending transcript is dropped and nothing is returned.
    ///
    /// # Errors
    ///
    /// Propagates any error from the generator.
    #[instrument(skip_all, fields(history_len, message_len))]
    pub async fn respond(&self, request: ChatRequest) -> ChatRelayResult<ChatReply> {
        let (message, history) = request.into_parts();
        let span = tracing::Span::current();
        span.record("history_len", history.len());
        span.record("message_len", message.len());

        let prompt = self.prompt.build(history.turns(), &message);
        debug!(prompt = %prompt, "Constructed prompt");

        let pending = history.append_turn(Role::User, message);

        let started = Instant::now();
        let result = self
            .generator
            .generate(&GenerationRequest::new(prompt, self.sampling.clone()))
            .await;
        self.metrics.record_generation(started.elapsed(), result.is_ok());
        let response = result?.into_text();

        let transcript = pending.append_turn(Role::Assistant, response.clone());
        debug!(transcript_len = transcript.len(), "Transcript updated");

        Ok(ChatReply {
            response,
            transcript,
        })
    }

    /// Handles a raw request body and always produces an envelope.
    ///
    /// Malformed bodies fail before any backend call. Errors, and panics
    /// raised while handling, become the failure envelope.
    #[instrument(skip_all, fields(caller = caller.map(CallerIdentity::display_name)))]
    pub async fn handle(&self, body: &[u8], caller: Option<&CallerIdentity>) -> ChatEnvelope {
        self.metrics.record_request();
        info!(body_len = body.len(), "Received chat request");
        debug!(body = %String::from_utf8_lossy(body), "Request body");
        if let Some(caller) = caller {
            info!(caller = caller.display_name(), "Authenticated caller");
        }

        let outcome = AssertUnwindSafe(self.handle_inner(body))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unexpected panic".to_string());
                Err(ChatRelayError::internal(detail))
            });

        match outcome {
            Ok(reply) => {
                info!(
                    response_len = reply.response.len(),
                    transcript_len = reply.transcript.len(),
                    "Chat request succeeded"
                );
                reply.into_envelope()
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Answers a request that was rejected before its body could be handled,
    /// e.g. a missing or oversized body.
    ///
    /// Counts the request and the failure like [`ChatService::handle`] does.
    pub fn reject(&self, err: &ChatRelayError) -> ChatEnvelope {
        self.metrics.record_request();
        self.fail(err)
    }

    fn fail(&self, err: &ChatRelayError) -> ChatEnvelope {
        let category = err.kind.category();
        error!(category, error = %err, "Chat request failed");
        self.metrics.record_failure(category);
        ChatEnvelope::from_error(err)
    }

    async fn handle_inner(&self, body: &[u8]) -> ChatRelayResult<ChatReply> {
        let request = ChatRequest::from_slice(body)?;
        self.respond(request).await
    }
}
