//! HTTP front end.

use crate::{CallerIdentity, ChatService, DEFAULT_BODY_LIMIT_BYTES, RelayConfig, response_headers};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde_json::json;
use tracing::{info, instrument, warn};

/// Header carrying the gateway's verified claims as a JSON object.
pub const CLAIMS_HEADER: &str = "x-authorizer-claims";

/// Creates the router with the default request body limit.
///
/// - `POST /chat` relays a message
/// - `OPTIONS /chat` answers CORS preflight
/// - `GET /health` reports liveness
pub fn create_router(service: ChatService) -> Router {
    create_router_with_body_limit(service, DEFAULT_BODY_LIMIT_BYTES)
}

/// Creates the router, accepting request bodies up to `body_limit` bytes.
///
/// Larger bodies still receive the JSON failure envelope with CORS headers.
pub fn create_router_with_body_limit(service: ChatService, body_limit: usize) -> Router {
    Router::new()
        .route("/chat", post(chat).options(preflight))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Binds the configured address and serves until the process exits.
///
/// # Errors
///
/// Returns a configuration error for a bad bind address, or an internal error
/// when the listener fails.
#[instrument(skip_all)]
pub async fn serve(config: &RelayConfig) -> ChatRelayResult<()> {
    let service = ChatService::from_config(config)?;
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        ChatRelayError::configuration(format!("Failed to bind {}: {}", addr, e))
    })?;
    info!(%addr, "Chat relay listening");

    let router = create_router_with_body_limit(service, config.server.body_limit_bytes);
    axum::serve(listener, router)
        .await
        .map_err(|e| ChatRelayError::internal(format!("Server error: {}", e)))
}

#[instrument(skip_all)]
async fn chat(
    State(service): State<ChatService>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let envelope = match body {
        Ok(body) => {
            let caller = caller_from_headers(&headers);
            service.handle(&body, caller.as_ref()).await
        }
        Err(rejection) => {
            warn!(status = %rejection.status(), "Request body rejected");
            service.reject(&ChatRelayError::validation(format!(
                "request body rejected: {}",
                rejection.body_text()
            )))
        }
    };
    (envelope.status_code(), response_headers(), Json(envelope)).into_response()
}

async fn preflight() -> Response {
    (StatusCode::OK, response_headers()).into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

fn caller_from_headers(headers: &HeaderMap) -> Option<CallerIdentity> {
    let raw = headers.get(CLAIMS_HEADER)?.to_str().ok()?;
    let identity = CallerIdentity::from_claims_json(raw);
    if identity.is_none() {
        warn!("Ignoring unreadable caller claims header");
    }
    identity
}
