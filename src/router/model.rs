//! Vision-model calls made by the router.
//!
//! Each router sub-step is one [`VisionTask`]; a [`VisionModel`] turns a task
//! plus the image into a JSON object. [`ChatVisionModel`] implements this on
//! top of any OpenAI-compatible `/v1/chat/completions` endpoint.

use crate::analysis::AnalysisRequest;
use crate::logging::truncate_payload;
use crate::strategy::remote::send_json;
use crate::strategy::StrategyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One remote sub-step of the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionTask<'a> {
    DetectScenario,
    ReadLabel { brand: Option<&'a str> },
    LookupMenu { restaurant: &'a str },
    ClassifyGeometry,
}

impl VisionTask<'_> {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            VisionTask::DetectScenario => "scenario",
            VisionTask::ReadLabel { .. } => "label",
            VisionTask::LookupMenu { .. } => "menu",
            VisionTask::ClassifyGeometry => "geometry",
        }
    }

    /// Instruction text sent alongside the image.
    pub fn prompt(&self, region: Option<&str>) -> String {
        let region_hint = region
            .map(|r| format!(" The photo was taken in region '{}'.", r))
            .unwrap_or_default();

        let body = match self {
            VisionTask::DetectScenario => "Classify this food photo. Answer with JSON: \
                {\"scenario\": \"packaged\" | \"restaurant\" | \"prepared\", \
                \"confidence\": number 0-1, \
                \"brand\": string or null (brand printed on packaging), \
                \"restaurant\": string or null (restaurant or chain, only if recognisable)}."
                .to_string(),
            VisionTask::ReadLabel { brand } => format!(
                "Read the nutrition facts label of this packaged product{}. Answer with JSON: \
                {{\"product_name\": string or null, \"serving_size_grams\": number or null, \
                \"calories_per_serving\": number or null, \"servings\": number or null \
                (servings per container), \"total_calories\": number or null (only if printed), \
                \"confidence\": number 0-1}}. Use null for anything not visible.",
                brand.map(|b| format!(" (brand: {})", b)).unwrap_or_default()
            ),
            VisionTask::LookupMenu { restaurant } => format!(
                "This dish was served at {}. Identify the menu item and give that \
                restaurant's published nutrition data. Answer with JSON: \
                {{\"item\": string, \"calories\": number or null, \
                \"serving_grams\": number or null, \"confidence\": number 0-1}}.",
                restaurant
            ),
            VisionTask::ClassifyGeometry => "Identify the main food in this photo. Answer with JSON: \
                {\"label\": string, \"category\": string, \"confidence\": number 0-1, \
                \"density_g_per_ml\": number, \"density_sigma\": number or null, \
                \"kcal_per_g\": number, \"kcal_per_g_sigma\": number or null, \
                \"visual_portion\": {\"volume_ml\": number, \"weight_grams\": number, \
                \"calories\": number} or null}. Only give visual_portion if the photo \
                shows enough context (plate, cutlery, hands) to judge absolute size."
                .to_string(),
        };

        format!("{}{}", body, region_hint)
    }
}

/// Something that can answer a [`VisionTask`] about an image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn extract(
        &self,
        task: &VisionTask<'_>,
        request: &AnalysisRequest,
    ) -> Result<Value, StrategyError>;
}

/// OpenAI-compatible chat-completions vision model.
pub struct ChatVisionModel {
    /// Base URL without trailing slash (e.g., "https://api.openai.com")
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
    call_timeout: Duration,
    log_payloads: bool,
}

impl ChatVisionModel {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        client: Client,
        call_timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            api_key,
            model,
            client,
            call_timeout,
            log_payloads: false,
        }
    }

    /// Log raw model answers at debug level.
    pub fn with_payload_logging(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Strip an optional Markdown code fence around a JSON answer.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[async_trait]
impl VisionModel for ChatVisionModel {
    async fn extract(
        &self,
        task: &VisionTask<'_>,
        request: &AnalysisRequest,
    ) -> Result<Value, StrategyError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: task.prompt(request.region.as_deref()),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.to_data_url(),
                        },
                    },
                ],
            }],
            temperature: 0.0,
            max_tokens: 600,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response: ChatResponse = send_json(
            self.client
                .post(&url)
                .header("authorization", format!("Bearer {}", self.api_key))
                .json(&body),
            self.call_timeout,
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                StrategyError::MalformedResponse(format!("{}: no message content", task.name()))
            })?;

        if let Some(preview) = truncate_payload(&content, self.log_payloads) {
            tracing::debug!(task = task.name(), content = %preview, "Vision model answer");
        }

        let value: Value = serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            StrategyError::MalformedResponse(format!("{}: answer is not JSON: {}", task.name(), e))
        })?;

        if !value.is_object() {
            return Err(StrategyError::MalformedResponse(format!(
                "{}: answer is not a JSON object",
                task.name()
            )));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_model(endpoint: String) -> ChatVisionModel {
        ChatVisionModel::new(
            endpoint,
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            Client::new(),
            Duration::from_secs(5),
        )
    }

    fn completion(content: &str) -> String {
        serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
        .to_string()
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::from_bytes(b"jpeg".to_vec(), Some("image/jpeg"), None).unwrap()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_prompts_mention_context() {
        let menu = VisionTask::LookupMenu {
            restaurant: "Five Guys",
        };
        assert!(menu.prompt(None).contains("Five Guys"));
        assert!(VisionTask::DetectScenario
            .prompt(Some("JP"))
            .contains("region 'JP'"));
        assert!(VisionTask::ReadLabel { brand: Some("Oatly") }
            .prompt(None)
            .contains("Oatly"));
    }

    #[tokio::test]
    async fn test_extract_parses_json_answer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_body(completion("```json\n{\"scenario\":\"prepared\"}\n```"))
            .create_async()
            .await;

        let model = test_model(server.url());
        let value = model
            .extract(&VisionTask::DetectScenario, &request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(value["scenario"], "prepared");
    }

    #[tokio::test]
    async fn test_extract_rejects_prose() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion("It looks like a salad."))
            .create_async()
            .await;

        let model = test_model(server.url());
        let err = model
            .extract(&VisionTask::ClassifyGeometry, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::MalformedResponse(ref m) if m.starts_with("geometry")));
    }

    #[tokio::test]
    async fn test_extract_empty_choices() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let model = test_model(server.url());
        let err = model
            .extract(&VisionTask::DetectScenario, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_extract_upstream_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let model = test_model(server.url());
        let err = model
            .extract(&VisionTask::DetectScenario, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::RemoteFailure(ref m) if m.contains("429")));
    }
}
