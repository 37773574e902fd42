//! HTTP-level tests for the Anthropic backend against a wiremock server.

use folio_core::{Error, GenerationBackend, InferenceSettings, VisionBackend};
use folio_inference::anthropic::{AnthropicBackend, AnthropicConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer, max_retries: u32) -> AnthropicBackend {
    let mut settings = InferenceSettings::with_api_key("sk-test");
    settings.base_url = server.uri();
    settings.model = "claude-test".to_string();
    settings.max_retries = max_retries;
    let config = AnthropicConfig {
        retry_base_ms: 1,
        retry_max_ms: 5,
        ..AnthropicConfig::from_settings(&settings)
    };
    AnthropicBackend::new(config).expect("Failed to create backend")
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

fn error_response(error_type: &str, message: &str) -> serde_json::Value {
    json!({"type": "error", "error": {"type": error_type, "message": message}})
}

#[tokio::test]
async fn test_generate_sends_headers_and_zero_temperature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "temperature": 0.0,
            "messages": [{"role": "user", "content": [{"type": "text", "text": "Summarize"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("- Point")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server, 0).generate("Summarize").await.unwrap();
    assert_eq!(reply, "- Point");
}

#[tokio::test]
async fn test_describe_image_sends_base64_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "Analyse this page"},
                    {"type": "image", "source": {
                        "type": "base64",
                        "media_type": "image/jpeg",
                        "data": "/9j/"
                    }}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A chart")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server, 0)
        .describe_image(&[0xFF, 0xD8, 0xFF], "image/jpeg", Some("Analyse this page"))
        .await
        .unwrap();
    assert_eq!(reply, "A chart");
}

#[tokio::test]
async fn test_retries_overloaded_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(529).set_body_json(error_response("overloaded_error", "busy")),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server, 3).generate("hi").await.unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(error_response("rate_limit_error", "slow down")),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = backend(&server, 2).generate("hi").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_auth_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(error_response("authentication_error", "invalid x-api-key")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server, 5).generate("hi").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_empty_content_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_02",
            "content": [],
            "stop_reason": "max_tokens"
        })))
        .mount(&server)
        .await;

    let err = backend(&server, 0).generate("hi").await.unwrap_err();
    assert!(err.to_string().contains("max_tokens"));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("x-api-key", "sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    assert!(backend(&server, 0).health_check().await.unwrap());
}
