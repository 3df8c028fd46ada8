//! Deterministic placeholder strategy.
//!
//! Used when no external service is configured, and as the guaranteed last
//! link of every fallback chain. It never fails and always returns the same
//! answer for the same image.

use super::{EstimationStrategy, StrategyError, StrategyKind};
use crate::analysis::{
    AnalysisMeta, AnalysisRequest, AnalysisResult, Estimate, FoodItem, ImageSource, Priors,
};
use async_trait::async_trait;

/// Evidence tag attached to placeholder items.
pub const PLACEHOLDER_EVIDENCE: &str = "Placeholder";

/// Confidence reported for placeholder answers. Low on purpose: the image
/// was never inspected.
const PLACEHOLDER_CONFIDENCE: f64 = 0.3;

struct CatalogueEntry {
    label: &'static str,
    calories: f64,
    weight_grams: f64,
}

const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry { label: "mixed salad", calories: 180.0, weight_grams: 250.0 },
    CatalogueEntry { label: "chicken with rice", calories: 520.0, weight_grams: 350.0 },
    CatalogueEntry { label: "pasta with tomato sauce", calories: 480.0, weight_grams: 300.0 },
    CatalogueEntry { label: "cheeseburger", calories: 550.0, weight_grams: 220.0 },
    CatalogueEntry { label: "vegetable soup", calories: 150.0, weight_grams: 300.0 },
    CatalogueEntry { label: "fruit bowl", calories: 120.0, weight_grams: 200.0 },
    CatalogueEntry { label: "sandwich", calories: 350.0, weight_grams: 180.0 },
    CatalogueEntry { label: "pizza slice", calories: 285.0, weight_grams: 110.0 },
];

/// Always-available strategy that picks from a fixed catalogue.
pub struct PlaceholderStrategy;

impl PlaceholderStrategy {
    pub fn new() -> Self {
        Self
    }

    /// FNV-1a over the image source, stable across runs and platforms.
    fn digest(image: &ImageSource) -> u64 {
        let bytes: &[u8] = match image {
            ImageSource::Bytes { data, .. } => data,
            ImageSource::Url(url) => url.as_str().as_bytes(),
        };
        bytes.iter().fold(0xcbf29ce484222325u64, |hash, b| {
            (hash ^ u64::from(*b)).wrapping_mul(0x100000001b3)
        })
    }

    fn pick(image: &ImageSource) -> FoodItem {
        let entry = &CATALOGUE[(Self::digest(image) % CATALOGUE.len() as u64) as usize];
        let kcal_per_g = entry.calories / entry.weight_grams;

        FoodItem::new(entry.label, PLACEHOLDER_CONFIDENCE)
            .with_calories(entry.calories, 0.5)
            .with_weight(Some(entry.weight_grams))
            .with_priors(Priors {
                kcal_per_g: Estimate::relative(kcal_per_g, 0.5),
                density: None,
            })
            .with_evidence(PLACEHOLDER_EVIDENCE)
    }
}

impl Default for PlaceholderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EstimationStrategy for PlaceholderStrategy {
    fn id(&self) -> &str {
        StrategyKind::Placeholder.as_str()
    }

    fn name(&self) -> &str {
        "Placeholder catalogue"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, StrategyError> {
        let item = Self::pick(&request.image);
        tracing::debug!(label = %item.label, "Placeholder strategy answered");

        AnalysisResult::new(
            vec![item],
            AnalysisMeta {
                used: vec![self.id().to_string()],
                ..Default::default()
            },
        )
        .ok_or(StrategyError::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_request(data: &[u8]) -> AnalysisRequest {
        AnalysisRequest::from_bytes(data.to_vec(), Some("image/png"), None).unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_is_deterministic() {
        let strategy = PlaceholderStrategy::new();
        let a = strategy.analyze(&bytes_request(b"same image")).await.unwrap();
        let b = strategy.analyze(&bytes_request(b"same image")).await.unwrap();
        assert_eq!(a.primary(), b.primary());
    }

    #[tokio::test]
    async fn test_placeholder_item_is_complete() {
        let strategy = PlaceholderStrategy::new();
        let result = strategy.analyze(&bytes_request(b"\x89PNG")).await.unwrap();
        let item = result.primary();

        assert!(!item.label.is_empty());
        assert!(item.calories.unwrap() >= 1.0);
        assert!(item.weight_grams.unwrap() > 0.0);
        assert!(item.kcal_per_g().is_some());
        assert_eq!(item.evidence, vec![PLACEHOLDER_EVIDENCE]);
        assert_eq!(result.meta().used, vec!["placeholder"]);
    }

    #[tokio::test]
    async fn test_placeholder_handles_url_sources() {
        let strategy = PlaceholderStrategy::new();
        let request =
            AnalysisRequest::from_fields(Some("https://img.example.com/meal.jpg"), None, None)
                .unwrap();
        assert!(strategy.analyze(&request).await.is_ok());
    }

    #[test]
    fn test_catalogue_entries_are_plausible() {
        for entry in CATALOGUE {
            let kcal_per_g = entry.calories / entry.weight_grams;
            assert!(kcal_per_g > 0.0 && kcal_per_g < 9.0, "{}", entry.label);
        }
    }
}
