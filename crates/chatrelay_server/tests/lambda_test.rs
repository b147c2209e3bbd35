//! Tests for the proxy-event adapter.

mod test_utils;

use chatrelay_server::{
    Authorizer, ChatEnvelope, ChatService, ProxyEvent, ProxyResponse, RequestContext,
    handle_event,
};
use serde_json::json;
use std::sync::Arc;
use test_utils::MockGenerator;

const FUNCTION_ARN: &str = "arn:aws:lambda:ap-northeast-1:123456789012:function:chat-relay";

fn service_with(generator: &MockGenerator) -> ChatService {
    ChatService::new(Arc::new(generator.clone()))
}

fn event_with_body(body: serde_json::Value) -> ProxyEvent {
    ProxyEvent {
        body: Some(body.to_string()),
        http_method: Some("POST".to_string()),
        request_context: None,
    }
}

#[tokio::test]
async fn test_success_event() {
    let generator = MockGenerator::replying("Hi there");
    let service = service_with(&generator);

    let response = handle_event(
        &service,
        event_with_body(json!({"message": "Hello", "conversationHistory": []})),
        Some(FUNCTION_ARN),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(response.headers["Access-Control-Allow-Methods"], "OPTIONS,POST");
    match response.envelope() {
        Some(ChatEnvelope::Success {
            response,
            conversation_history,
            ..
        }) => {
            assert_eq!(response, "Hi there");
            assert_eq!(conversation_history.len(), 2);
        }
        other => panic!("Expected success envelope, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_body_is_failure() {
    let generator = MockGenerator::replying("unused");
    let service = service_with(&generator);
    let event = ProxyEvent {
        http_method: Some("POST".to_string()),
        ..Default::default()
    };

    let response = handle_event(&service, event, None).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.headers.len(), 4);
    let envelope = response.envelope().expect("Body is an envelope");
    assert!(!envelope.is_success());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_empty_object_body_is_failure() {
    let generator = MockGenerator::replying("unused");
    let service = service_with(&generator);

    let response = handle_event(&service, event_with_body(json!({})), None).await;

    assert_eq!(response.status_code, 500);
    let body: serde_json::Value = serde_json::from_str(&response.body).expect("JSON body");
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_options_event_short_circuits() {
    let generator = MockGenerator::replying("unused");
    let service = service_with(&generator);
    let event = ProxyEvent {
        http_method: Some("options".to_string()),
        ..Default::default()
    };

    let response = handle_event(&service, event, None).await;

    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty());
    assert_eq!(
        response.headers["Access-Control-Allow-Headers"],
        "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token"
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_claims_are_read_but_not_required() {
    let generator = MockGenerator::replying("hello");
    let service = service_with(&generator);
    let mut event = event_with_body(json!({"message": "hi"}));
    event.request_context = Some(RequestContext {
        authorizer: Some(Authorizer {
            claims: Some(json!({"cognito:username": "alice", "sub": "abc-123"})),
        }),
    });

    assert_eq!(
        event.caller().map(|c| c.display_name().to_string()),
        Some("alice".to_string())
    );

    let response = handle_event(&service, event, Some(FUNCTION_ARN)).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_unreadable_claims_ignored() {
    let generator = MockGenerator::replying("hello");
    let service = service_with(&generator);
    let mut event = event_with_body(json!({"message": "hi"}));
    event.request_context = Some(RequestContext {
        authorizer: Some(Authorizer {
            claims: Some(json!("not an object")),
        }),
    });

    assert!(event.caller().is_none());
    let response = handle_event(&service, event, Some("not-an-arn")).await;
    assert_eq!(response.status_code, 200);
}

#[test]
fn test_event_deserializes_from_gateway_json() {
    let raw = r#"{
        "httpMethod": "POST",
        "body": "{\"message\":\"Hello\"}",
        "requestContext": {
            "authorizer": {"claims": {"email": "bob@example.com"}}
        },
        "headers": {"Host": "example.com"}
    }"#;

    let event: ProxyEvent = serde_json::from_str(raw).expect("Event parses");

    assert_eq!(event.http_method.as_deref(), Some("POST"));
    assert_eq!(event.body.as_deref(), Some(r#"{"message":"Hello"}"#));
    assert_eq!(
        event.caller().map(|c| c.display_name().to_string()),
        Some("bob@example.com".to_string())
    );
}

#[test]
fn test_response_serializes_with_camel_case_fields() {
    let response = ProxyResponse {
        status_code: 200,
        headers: Default::default(),
        body: "{}".to_string(),
    };

    let value = serde_json::to_value(&response).expect("Response serializes");

    assert_eq!(value["statusCode"], 200);
    assert_eq!(value["body"], "{}");
}

#[test]
fn test_event_from_reader_and_file() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;

    let raw = r#"{"httpMethod": "POST", "body": "{\"message\":\"Hi\"}"}"#;

    let from_reader = ProxyEvent::from_reader(raw.as_bytes())?;
    assert_eq!(from_reader.body.as_deref(), Some(r#"{"message":"Hi"}"#));

    let path = std::env::temp_dir().join(format!("chatrelay-event-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    file.write_all(raw.as_bytes())?;
    drop(file);
    let from_file = ProxyEvent::from_file(&path);
    std::fs::remove_file(&path)?;

    assert_eq!(from_file?, from_reader);
    Ok(())
}

#[test]
fn test_malformed_event_rejected() {
    let err = ProxyEvent::from_json("[1, 2, 3]").expect_err("Not an event");
    assert_eq!(err.kind.category(), "validation");

    let err = ProxyEvent::from_file("/definitely/not/here.json").expect_err("Missing file");
    assert_eq!(err.kind.category(), "internal");
}

#[tokio::test]
async fn test_saved_event_round_trip() {
    let generator = MockGenerator::replying("Hi there");
    let service = service_with(&generator);
    let event = ProxyEvent::from_json(
        r#"{"httpMethod": "POST", "body": "{\"message\":\"Hello\",\"conversationHistory\":null}"}"#,
    )
    .expect("Event parses");

    let response = handle_event(&service, event, None).await;

    assert_eq!(response.status_code, 200);
    assert!(response.envelope().is_some_and(|e| e.is_success()));
}
