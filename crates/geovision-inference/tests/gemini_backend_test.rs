//! HTTP contract tests for the Gemini backend.
//!
//! A wiremock server stands in for the Gemini REST API so the request shape
//! (endpoint, key header, parts, tools, location bias) and the response
//! handling (text, citations, error mapping) can be verified offline.

use geovision_core::{defaults, Error, GroundingCitation, Image, ModelGateway, UserCoordinates};
use geovision_inference::gemini::{GeminiBackend, GeminiConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn backend_for(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(GeminiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        describe_model: "describe-model".to_string(),
        locate_model: "locate-model".to_string(),
        quick_model: "quick-model".to_string(),
        timeout_seconds: Some(10),
    })
    .expect("Failed to create backend")
}

fn image() -> Image {
    Image::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap()
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_describe_sends_image_and_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}},
                    {"text": defaults::DESCRIBE_PROMPT}
                ]
            }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("brick rowhouses, cobblestone, French signage")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let description = backend_for(&server).describe(&image()).await.unwrap();
    assert_eq!(description, "brick rowhouses, cobblestone, French signage");
}

#[tokio::test]
async fn test_describe_empty_answer_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let description = backend_for(&server).describe(&image()).await.unwrap();
    assert_eq!(description, defaults::EMPTY_DESCRIPTION);
}

#[tokio::test]
async fn test_locate_enables_maps_and_returns_citations() {
    let server = MockServer::start().await;

    let response = json!({
        "candidates": [{
            "content": {"parts": [{
                "text": "Rue de X, Paris. The facades match.\nCOORDINATES: [LAT: 48.86, LNG: 2.35]"
            }]},
            "groundingMetadata": {"groundingChunks": [
                {"maps": {"uri": "https://maps.google.com/?cid=1", "title": "Rue de X"}},
                {"web": {"uri": "https://example.org/paris", "title": "Paris"}}
            ]}
        }]
    });

    Mock::given(method("POST"))
        .and(path("/models/locate-model:generateContent"))
        .and(body_partial_json(json!({"tools": [{"googleMaps": {}}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend_for(&server)
        .locate("brick rowhouses", &image(), None)
        .await
        .unwrap();

    assert!(answer.text.contains("COORDINATES: [LAT: 48.86, LNG: 2.35]"));
    assert_eq!(
        answer.citations,
        vec![
            GroundingCitation::map("https://maps.google.com/?cid=1", "Rue de X"),
            GroundingCitation::web("https://example.org/paris", "Paris"),
        ]
    );

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("toolConfig").is_none());
    let prompt = body["contents"][0]["parts"][1]["text"].as_str().unwrap();
    assert!(prompt.contains("Description: brick rowhouses"));
    assert!(prompt.contains("COORDINATES: [LAT:"));
    assert!(!prompt.contains("Hint:"));
}

#[tokio::test]
async fn test_locate_with_hint_biases_retrieval() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/locate-model:generateContent"))
        .and(body_partial_json(json!({
            "toolConfig": {"retrievalConfig": {"latLng": {"latitude": 48.85, "longitude": 2.29}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Paris")))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend_for(&server)
        .locate("desc", &image(), Some(UserCoordinates::new(48.85, 2.29)))
        .await
        .unwrap();
    assert_eq!(answer.text, "Paris");
    assert!(answer.citations.is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][1]["text"].as_str().unwrap();
    assert!(prompt.contains("Hint: The user is currently near 48.85, 2.29."));
}

#[tokio::test]
async fn test_locate_empty_answer_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/locate-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("")))
        .mount(&server)
        .await;

    let answer = backend_for(&server)
        .locate("desc", &image(), None)
        .await
        .unwrap();
    assert_eq!(answer.text, defaults::EMPTY_LOCATION);
}

#[tokio::test]
async fn test_quota_error_maps_to_inference_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend_for(&server).describe(&image()).await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
    assert!(err.to_string().contains("Quota exceeded"));
}

#[tokio::test]
async fn test_invalid_key_maps_to_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/locate-model:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .locate("desc", &image(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend_for(&server).describe(&image()).await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
    assert!(err.is_service_error());
}

#[tokio::test]
async fn test_blocked_prompt_is_inference_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).describe(&image()).await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_no_retry_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/describe-model:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend_for(&server).describe(&image()).await.unwrap_err();
    assert!(err.to_string().contains("Server error"));
}

#[tokio::test]
async fn test_quick_message_swallows_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/quick-model:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let reply = backend_for(&server).quick_message("hello").await;
    assert_eq!(reply, "");
}

#[tokio::test]
async fn test_quick_message_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/quick-model:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": defaults::GREETING_PROMPT}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Welcome aboard.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend_for(&server)
        .quick_message(defaults::GREETING_PROMPT)
        .await;
    assert_eq!(reply, "Welcome aboard.");
}
