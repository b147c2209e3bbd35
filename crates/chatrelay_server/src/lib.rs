//! Stateless chat relay in front of a text-generation backend.
//!
//! Each request carries a new message and the caller's transcript. The relay
//! builds a bounded prompt, makes one backend call, and returns the reply
//! together with the grown transcript. Nothing is stored between requests.
//!
//! Two front ends share [`ChatService`]: an axum router ([`create_router`])
//! and a serverless proxy-event adapter ([`handle_event`]).

mod config;
mod envelope;
mod http;
mod identity;
mod lambda;
mod metrics;
mod service;

pub use config::{
    BackendSettings, DEFAULT_BASE_URL, DEFAULT_BODY_LIMIT_BYTES, PromptSettings, RelayConfig,
    ServerSettings,
};
pub use envelope::{
    CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, ChatEnvelope, ChatRequest, response_headers,
};
pub use http::{CLAIMS_HEADER, create_router, create_router_with_body_limit, serve};
pub use identity::CallerIdentity;
pub use lambda::{Authorizer, ProxyEvent, ProxyResponse, RequestContext, handle_event};
pub use metrics::{RelayMetrics, init_observability};
pub use service::{ChatReply, ChatService, ChatServiceBuilder};
