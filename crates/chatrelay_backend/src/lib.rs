//! Generation backend integration.
//!
//! Provides [`HttpGenerationClient`], the [`chatrelay_core::TextGenerator`]
//! implementation that POSTs prompts to a hosted text-generation endpoint.

mod client;
mod endpoint;

pub use client::{DEFAULT_RESPONSE_FIELD, HttpGenerationClient};
pub use endpoint::GenerationEndpoint;
