//! Core data types for the chatrelay generation proxy.
//!
//! This crate holds everything that does not touch the network: conversation
//! turns and transcripts, the bounded prompt builder, sampling parameters,
//! the generation request/response shapes and the [`TextGenerator`] seam.

mod arn;
mod generation;
mod prompt;
mod role;
mod sampling;
mod transcript;

pub use arn::region_from_arn;
pub use generation::{
    GenerationRequest, GenerationRequestBuilder, GenerationResponse, TextGenerator,
};
pub use prompt::{HistoryWindow, PromptBuilder, PromptLabels, build_prompt};
pub use role::Role;
pub use sampling::SamplingParams;
pub use transcript::{Transcript, Turn, TurnBuilder, append_turn};
