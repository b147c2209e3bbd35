//! Sampling parameters forwarded to the generation backend.

use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde::{Deserialize, Serialize};

/// Generation settings sent with every prompt.
///
/// Field names match the backend payload, so this struct is flattened
/// directly into [`crate::GenerationRequest`]. Every field defaults
/// independently when loaded from configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct SamplingParams {
    /// Maximum number of tokens to generate
    #[serde(default = "default_max_new_tokens")]
    max_new_tokens: u32,
    /// Whether sampling is enabled (greedy decoding otherwise)
    #[serde(default = "default_do_sample")]
    do_sample: bool,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    temperature: f64,
    /// Nucleus sampling probability mass
    #[serde(default = "default_top_p")]
    top_p: f64,
}

impl SamplingParams {
    /// Returns a builder seeded with the defaults.
    pub fn builder() -> SamplingParamsBuilder {
        SamplingParamsBuilder::default()
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero token budget, a negative
    /// temperature or a `top_p` outside `(0, 1]`.
    pub fn validate(&self) -> ChatRelayResult<()> {
        if self.max_new_tokens == 0 {
            return Err(ChatRelayError::configuration(
                "max_new_tokens must be greater than zero",
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ChatRelayError::configuration(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ChatRelayError::configuration(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            do_sample: default_do_sample(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_do_sample() -> bool {
    true
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}
