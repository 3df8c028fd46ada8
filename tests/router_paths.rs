//! End-to-end tests for the managed strategy's multi-path routing.
//!
//! A wiremock server plays both the OpenAI-compatible vision model (one
//! answer per prompt) and the USDA search API.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCENARIO_PROMPT: &str = "Classify this food photo";
const LABEL_PROMPT: &str = "nutrition facts label";
const MENU_PROMPT: &str = "Identify the menu item";
const GEOMETRY_PROMPT: &str = "Identify the main food";

async fn analyze(server: &MockServer, with_reference: bool) -> (StatusCode, Value) {
    let uri = server.uri();
    let reference = with_reference.then_some(uri.as_str());
    let mut app = create_app(managed_config(&uri, reference));
    send(
        &mut app,
        analyze_json(json!({"imageBase64": SAMPLE_IMAGE_BASE64})),
    )
    .await
}

fn evidence(body: &Value) -> Vec<String> {
    body["evidence"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_packaged_product_uses_label() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "packaged", "confidence": 0.9, "brand": "Oatly"}),
    )
    .await;
    mount_chat_answer(
        &server,
        LABEL_PROMPT,
        json!({
            "product_name": "Oat drink",
            "serving_size_grams": 250,
            "calories_per_serving": 120,
            "servings": 4,
            "total_calories": null,
            "confidence": 0.95
        }),
    )
    .await;

    let (status, body) = analyze(&server, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foodType"], "Oat drink");
    assert_eq!(body["calories"], 480);
    assert_eq!(body["weight"], 1000);
    assert_eq!(body["meta"]["calculationMethod"], "strategy-provided");
    assert_eq!(
        evidence(&body),
        vec!["Scenario:Packaged", "Label", "managed"]
    );
}

#[tokio::test]
async fn test_known_restaurant_uses_menu() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "restaurant", "confidence": 0.8, "restaurant": "Shake Shack"}),
    )
    .await;
    mount_chat_answer(
        &server,
        MENU_PROMPT,
        json!({"item": "ShackBurger", "calories": 500, "serving_grams": 200, "confidence": 0.85}),
    )
    .await;

    let (status, body) = analyze(&server, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foodType"], "ShackBurger");
    assert_eq!(body["calories"], 500);
    assert_eq!(body["emoji"], "🍔");
    assert_eq!(body["confidence"], 0.85);
    assert!(evidence(&body).contains(&"Menu".to_string()));
}

#[tokio::test]
async fn test_unknown_restaurant_uses_geometry() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "restaurant", "confidence": 0.6, "restaurant": null}),
    )
    .await;
    mount_chat_answer(
        &server,
        GEOMETRY_PROMPT,
        json!({
            "label": "pad thai",
            "category": "noodles",
            "confidence": 0.7,
            "density_g_per_ml": 0.7,
            "kcal_per_g": 1.6,
            "visual_portion": {"volume_ml": 450, "weight_grams": 320, "calories": 510}
        }),
    )
    .await;

    let (status, body) = analyze(&server, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 510);
    assert_eq!(body["weight"], 320);
    let tags = evidence(&body);
    assert_eq!(tags[0], "Scenario:Restaurant");
    assert!(tags.contains(&"Geometry".to_string()));
    assert!(tags.contains(&"Visual-portion".to_string()));
}

#[tokio::test]
async fn test_prepared_food_cross_validated_by_reference() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "prepared", "confidence": 0.75}),
    )
    .await;
    mount_chat_answer(
        &server,
        GEOMETRY_PROMPT,
        json!({
            "label": "white rice",
            "category": "grains",
            "confidence": 0.7,
            "density_g_per_ml": 0.85,
            "kcal_per_g": 1.5,
            "visual_portion": {"volume_ml": 200, "weight_grams": 170, "calories": 255}
        }),
    )
    .await;
    mount_usda_search(&server, "Rice, white, cooked", 130.0).await;

    let (status, body) = analyze(&server, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foodType"], "white rice");
    // The reference replaces kcal/g only; the visual calorie figure stands.
    assert_eq!(body["calories"], 255);
    assert!(evidence(&body).contains(&"USDA-validated".to_string()));
}

#[tokio::test]
async fn test_weak_reference_match_is_ignored() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "prepared", "confidence": 0.75}),
    )
    .await;
    mount_chat_answer(
        &server,
        GEOMETRY_PROMPT,
        json!({"label": "white rice", "category": "grains", "kcal_per_g": 1.5}),
    )
    .await;
    mount_usda_search(&server, "Beverages, coffee, brewed", 1.0).await;

    let (status, body) = analyze(&server, true).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!evidence(&body).contains(&"USDA-validated".to_string()));
}

#[tokio::test]
async fn test_geometry_without_portion_awaits_depth_sensor() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "prepared", "confidence": 0.75}),
    )
    .await;
    mount_chat_answer(
        &server,
        GEOMETRY_PROMPT,
        json!({
            "label": "lentil curry",
            "category": "stew",
            "density_g_per_ml": 1.05,
            "kcal_per_g": 1.2,
            "visual_portion": null
        }),
    )
    .await;

    let (status, body) = analyze(&server, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 0);
    assert_eq!(body["weight"], 0);
    assert_eq!(body["meta"]["calculationMethod"], "awaiting-depth-sensor");
    assert!(body["meta"]["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_prose_answer_falls_back_to_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Looks like a tasty salad!"}}]
        })))
        .mount(&server)
        .await;

    let (status, body) = analyze(&server, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["used"], json!(["managed", "placeholder"]));
    assert_eq!(body["meta"]["fallback"], true);
}

#[tokio::test]
async fn test_reference_outage_falls_back_to_placeholder() {
    let server = MockServer::start().await;
    mount_chat_answer(
        &server,
        SCENARIO_PROMPT,
        json!({"scenario": "prepared", "confidence": 0.75}),
    )
    .await;
    mount_chat_answer(
        &server,
        GEOMETRY_PROMPT,
        json!({"label": "white rice", "kcal_per_g": 1.5}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/foods/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = analyze(&server, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["used"], json!(["managed", "placeholder"]));
}
