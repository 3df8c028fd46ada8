//! Shared test utilities for Morsel integration tests.
//!
//! Provides config builders, an in-process router, and wiremock helpers for
//! the remote services strategies talk to.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use morsel::api::{create_router, AppState};
use morsel::config::{Credentials, MorselConfig};
use morsel::strategy::StrategyKind;
use serde_json::Value;
use std::sync::Arc;
use tower::Service;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// UUID v4 string length: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
pub const UUID_V4_STRING_LEN: usize = 36;

/// Base64 of the bytes "fake-jpeg".
pub const SAMPLE_IMAGE_BASE64: &str = "ZmFrZS1qcGVn";

// =============================================================================
// Config Builders
// =============================================================================

pub fn inline_key(key: &str) -> Credentials {
    Credentials {
        api_key: Some(key.to_string()),
        api_key_env: None,
    }
}

/// Config with short timeouts and no remote strategy configured.
pub fn base_config() -> MorselConfig {
    let mut config = MorselConfig::default();
    config.pipeline.strategy_timeout_seconds = 5;
    config.pipeline.call_timeout_seconds = 2;
    config
}

/// Config whose only remote strategy is the classification service at `endpoint`.
pub fn vision_config(endpoint: &str) -> MorselConfig {
    let mut config = base_config();
    config.strategies.order = vec![StrategyKind::Vision.into()];
    config.strategies.vision.endpoint = Some(endpoint.to_string());
    config.strategies.vision.credentials = inline_key("vk-test");
    config
}

/// Config whose only remote strategy is the managed model at `endpoint`,
/// optionally cross-validated against a reference service.
pub fn managed_config(endpoint: &str, reference: Option<&str>) -> MorselConfig {
    let mut config = base_config();
    config.strategies.order = vec![StrategyKind::Managed.into()];
    config.strategies.managed.endpoint = Some(endpoint.to_string());
    config.strategies.managed.credentials = inline_key("sk-test");
    if let Some(reference) = reference {
        config.strategies.reference.endpoint = reference.to_string();
        config.strategies.reference.credentials = inline_key("usda-test");
    } else {
        config.strategies.reference.credentials = Credentials::default();
    }
    config
}

// =============================================================================
// App Helpers
// =============================================================================

pub fn create_app(config: MorselConfig) -> axum::Router {
    let state = Arc::new(AppState::new(Arc::new(config)).unwrap());
    create_router(state)
}

pub async fn send(app: &mut axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn analyze_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze-food")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Remote Service Mocks
// =============================================================================

/// OpenAI-style chat completion whose message content is `content` as JSON text.
pub fn chat_completion(content: Value) -> Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content.to_string()},
            "finish_reason": "stop"
        }]
    })
}

/// Answer chat calls whose prompt contains `prompt_fragment` with `answer`.
pub async fn mount_chat_answer(server: &MockServer, prompt_fragment: &str, answer: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(prompt_fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(answer)))
        .mount(server)
        .await;
}

/// USDA search response with one food at `kcal_per_100g`.
pub fn usda_search(description: &str, kcal_per_100g: f64) -> Value {
    serde_json::json!({
        "totalHits": 1,
        "foods": [{
            "fdcId": 1,
            "description": description,
            "foodNutrients": [
                {"nutrientName": "Energy", "unitName": "KCAL", "value": kcal_per_100g}
            ]
        }]
    })
}

pub async fn mount_usda_search(server: &MockServer, description: &str, kcal_per_100g: f64) {
    Mock::given(method("GET"))
        .and(path("/v1/foods/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(usda_search(description, kcal_per_100g)),
        )
        .mount(server)
        .await;
}
