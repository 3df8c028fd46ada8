//! Remote food-image-classification strategy.

use super::remote::send_json;
use super::{EstimationStrategy, StrategyError, StrategyKind};
use crate::analysis::{
    AnalysisMeta, AnalysisRequest, AnalysisResult, Estimate, FoodItem, ImageSource, Priors,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Evidence tag attached to items from the classification service.
pub const VISION_EVIDENCE: &str = "Vision";

/// Relative sigma applied to service-reported calories.
const VISION_UNCERTAINTY: f64 = 0.2;

/// Classification-service strategy.
///
/// Sends the image to `POST {endpoint}/v1/food/recognize` with Bearer
/// authentication and maps the returned items one-to-one.
pub struct VisionStrategy {
    /// Base URL without trailing slash
    endpoint: String,
    api_key: String,
    /// Shared HTTP client for connection pooling
    client: Client,
    call_timeout: Duration,
}

impl VisionStrategy {
    pub fn new(endpoint: String, api_key: String, client: Client, call_timeout: Duration) -> Self {
        Self {
            endpoint,
            api_key,
            client,
            call_timeout,
        }
    }
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    image: ImagePayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ImagePayload<'a> {
    Url {
        url: &'a str,
    },
    Inline {
        base64: String,
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
    },
}

#[derive(Deserialize)]
struct RecognizeResponse {
    items: Vec<RecognizedFood>,
}

#[derive(Deserialize)]
struct RecognizedFood {
    #[serde(default)]
    label: String,
    #[serde(default)]
    confidence: f64,
    calories: Option<f64>,
    weight_grams: Option<f64>,
    volume_ml: Option<f64>,
    kcal_per_g: Option<f64>,
}

impl RecognizedFood {
    fn into_item(self) -> Option<FoodItem> {
        if self.label.trim().is_empty() {
            return None;
        }
        let mut item = FoodItem::new(self.label, self.confidence)
            .with_weight(self.weight_grams)
            .with_volume(self.volume_ml)
            .with_evidence(VISION_EVIDENCE);
        if let Some(calories) = self.calories {
            item = item.with_calories(calories, VISION_UNCERTAINTY);
        }
        if let Some(kcal_per_g) = self.kcal_per_g.and_then(|mu| Estimate::new(mu, 0.0)) {
            item = item.with_priors(Priors {
                kcal_per_g: Some(kcal_per_g),
                density: None,
            });
        }
        Some(item)
    }
}

#[async_trait]
impl EstimationStrategy for VisionStrategy {
    fn id(&self) -> &str {
        StrategyKind::Vision.as_str()
    }

    fn name(&self) -> &str {
        "Food classification service"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, StrategyError> {
        let url = format!("{}/v1/food/recognize", self.endpoint);

        let image = match &request.image {
            ImageSource::Url(url) => ImagePayload::Url { url: url.as_str() },
            ImageSource::Bytes { data, mime_type } => ImagePayload::Inline {
                base64: STANDARD.encode(data),
                mime_type,
            },
        };
        let body = RecognizeRequest {
            image,
            region: request.region.as_deref(),
        };

        let response: RecognizeResponse = send_json(
            self.client
                .post(&url)
                .header("authorization", format!("Bearer {}", self.api_key))
                .json(&body),
            self.call_timeout,
        )
        .await?;

        let mut items: Vec<FoodItem> = response
            .items
            .into_iter()
            .filter_map(RecognizedFood::into_item)
            .collect();
        items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        tracing::debug!(items = items.len(), "Classification service answered");

        AnalysisResult::new(
            items,
            AnalysisMeta {
                used: vec![self.id().to_string()],
                ..Default::default()
            },
        )
        .ok_or(StrategyError::EmptyResult)
    }
}
