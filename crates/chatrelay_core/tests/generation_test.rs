//! Tests for sampling parameters, generation payloads and the generator seam.

use async_trait::async_trait;
use chatrelay_core::{
    region_from_arn, GenerationRequest, GenerationResponse, SamplingParams, TextGenerator,
};
use chatrelay_error::ChatRelayResult;
use serde_json::json;

#[test]
fn test_request_payload_shape() {
    let request = GenerationRequest::new("User: Hello", SamplingParams::default());
    let value = serde_json::to_value(&request).expect("Serializable");
    assert_eq!(
        value,
        json!({
            "prompt": "User: Hello",
            "max_new_tokens": 512,
            "do_sample": true,
            "temperature": 0.7,
            "top_p": 0.9
        })
    );
}

#[test]
fn test_sampling_defaults_fill_missing_fields() {
    let params: SamplingParams =
        serde_json::from_value(json!({"max_new_tokens": 100})).expect("Valid params");
    assert_eq!(*params.max_new_tokens(), 100);
    assert!(*params.do_sample());
    assert_eq!(*params.temperature(), 0.7);
    assert_eq!(*params.top_p(), 0.9);
}

#[test]
fn test_sampling_builder_and_validation() -> Result<(), Box<dyn std::error::Error>> {
    let params = SamplingParams::builder().max_new_tokens(100u32).build()?;
    assert_eq!(*params.max_new_tokens(), 100);
    assert!(params.validate().is_ok());

    let zero_tokens = SamplingParams::builder().max_new_tokens(0u32).build()?;
    assert!(zero_tokens.validate().is_err());

    let bad_top_p = SamplingParams::builder().top_p(1.5).build()?;
    assert!(bad_top_p.validate().is_err());

    let negative_temperature = SamplingParams::builder().temperature(-0.1).build()?;
    assert!(negative_temperature.validate().is_err());
    Ok(())
}

#[test]
fn test_region_from_arn() {
    assert_eq!(
        region_from_arn("arn:aws:lambda:us-east-1:123456789012:function:chat-relay"),
        Some("us-east-1")
    );
    assert_eq!(
        region_from_arn("arn:aws-cn:lambda:cn-north-1:123456789012:function:f:live"),
        Some("cn-north-1")
    );
    assert_eq!(region_from_arn("arn:aws:iam::123456789012:role/x"), None);
    assert_eq!(region_from_arn(""), None);
}

struct Echo;

#[async_trait]
impl TextGenerator for Echo {
    async fn generate(&self, request: &GenerationRequest) -> ChatRelayResult<GenerationResponse> {
        Ok(GenerationResponse::new(format!("echo: {}", request.prompt())))
    }

    fn describe(&self) -> String {
        "echo".to_string()
    }
}

#[tokio::test]
async fn test_generator_is_object_safe() -> Result<(), Box<dyn std::error::Error>> {
    let generator: Box<dyn TextGenerator> = Box::new(Echo);
    let request = GenerationRequest::builder().prompt("User: ping").build()?;
    let response = generator.generate(&request).await?;
    assert_eq!(response.generated_text(), "echo: User: ping");
    assert_eq!(generator.describe(), "echo");
    Ok(())
}
