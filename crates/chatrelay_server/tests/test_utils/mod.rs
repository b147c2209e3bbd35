//! Shared test doubles for the chat relay.

#![allow(dead_code)]

use async_trait::async_trait;
use chatrelay_core::{GenerationRequest, GenerationResponse, TextGenerator};
use chatrelay_error::{ChatRelayError, ChatRelayErrorKind, ChatRelayResult};
use std::sync::{Arc, Mutex};

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Reply with this text
    Reply(String),
    /// Fail with this error kind
    Fail(ChatRelayErrorKind),
    /// Panic mid-call
    Panic,
}

/// Generator that records every request and follows a fixed behavior.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn replying(text: &str) -> Self {
        Self::with(Behavior::Reply(text.to_string()))
    }

    pub fn failing(kind: ChatRelayErrorKind) -> Self {
        Self::with(Behavior::Fail(kind))
    }

    pub fn panicking() -> Self {
        Self::with(Behavior::Panic)
    }

    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("Mock lock poisoned").clone()
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ChatRelayResult<GenerationResponse> {
        self.requests
            .lock()
            .expect("Mock lock poisoned")
            .push(request.clone());
        match &self.behavior {
            Behavior::Reply(text) => Ok(GenerationResponse::new(text.clone())),
            Behavior::Fail(kind) => Err(ChatRelayError::new(kind.clone())),
            Behavior::Panic => panic!("generator exploded"),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
