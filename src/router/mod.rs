//! Multi-path classification router used by the managed strategy.
//!
//! One pass per request, no internal retries:
//!
//! 1. detect the [`ImageScenario`],
//! 2. run exactly one extraction path (label, menu or geometry),
//! 3. for geometry only, cross-validate kcal/g against a composition
//!    reference when one is configured.
//!
//! Any sub-step failure is returned as-is; the orchestrator decides what
//! happens next.

mod model;
mod paths;
mod reference;
mod scenario;

pub use model::{ChatVisionModel, VisionModel, VisionTask};
pub use paths::{
    GEOMETRY_EVIDENCE, LABEL_EVIDENCE, MENU_EVIDENCE, REFERENCE_EVIDENCE, VISUAL_PORTION_EVIDENCE,
};
pub use reference::{match_score, CompositionReference, ReferenceMatch, UsdaReference};
pub use scenario::{ImageScenario, ScenarioDetection};

use crate::analysis::{AnalysisRequest, FoodItem};
use crate::strategy::StrategyError;
use std::sync::Arc;

/// Routes one image through scenario detection and a single extraction path.
pub struct MultiPathRouter {
    model: Arc<dyn VisionModel>,
    reference: Option<Arc<dyn CompositionReference>>,
    /// Minimum [`ReferenceMatch::score`] for a reference value to be trusted.
    min_match_score: f64,
}

impl MultiPathRouter {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            reference: None,
            min_match_score: 0.5,
        }
    }

    /// Enable cross-validation of geometry results.
    pub fn with_reference(
        mut self,
        reference: Arc<dyn CompositionReference>,
        min_match_score: f64,
    ) -> Self {
        self.reference = Some(reference);
        self.min_match_score = min_match_score;
        self
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Run the full router for one request.
    pub async fn route(&self, request: &AnalysisRequest) -> Result<Vec<FoodItem>, StrategyError> {
        let detection = ScenarioDetection::from_value(
            self.model
                .extract(&VisionTask::DetectScenario, request)
                .await?,
        )?;
        let scenario_tag = format!("Scenario:{}", detection.scenario.tag());
        let confidence = detection.confidence;

        tracing::debug!(
            scenario = detection.scenario.tag(),
            confidence,
            "Scenario detected"
        );

        let mut item = match &detection.scenario {
            ImageScenario::Packaged { brand } => {
                let task = VisionTask::ReadLabel {
                    brand: brand.as_deref(),
                };
                let reading = self.model.extract(&task, request).await?;
                paths::label_item(reading, brand.as_deref(), confidence)?
            }
            ImageScenario::Restaurant {
                restaurant: Some(restaurant),
            } => {
                let task = VisionTask::LookupMenu {
                    restaurant: restaurant.as_str(),
                };
                let reading = self.model.extract(&task, request).await?;
                paths::menu_item(reading, restaurant, confidence)?
            }
            ImageScenario::Restaurant { restaurant: None } | ImageScenario::Prepared => {
                let reading = self
                    .model
                    .extract(&VisionTask::ClassifyGeometry, request)
                    .await?;
                let mut item = paths::geometry_item(reading, confidence)?;
                self.cross_validate(&mut item).await?;
                item
            }
        };

        item.evidence.insert(0, scenario_tag);
        Ok(vec![item])
    }

    async fn cross_validate(&self, item: &mut FoodItem) -> Result<(), StrategyError> {
        let Some(reference) = &self.reference else {
            return Ok(());
        };

        match reference.lookup(&item.label).await? {
            Some(found) if found.score >= self.min_match_score => {
                tracing::debug!(
                    label = %item.label,
                    reference = %found.description,
                    kcal_per_g = found.kcal_per_g,
                    "Reference match accepted"
                );
                paths::apply_reference(item, &found);
            }
            Some(found) => {
                tracing::debug!(
                    label = %item.label,
                    reference = %found.description,
                    score = found.score,
                    "Reference match too weak, keeping model priors"
                );
            }
            None => {
                tracing::debug!(label = %item.label, "No reference entry");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Answers each task from a script and records the order of calls.
    struct ScriptedModel {
        scenario: Value,
        label: Value,
        menu: Value,
        geometry: Value,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(scenario: Value) -> Self {
            Self {
                scenario,
                label: json!({}),
                menu: json!({}),
                geometry: json!({}),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedModel {
        async fn extract(
            &self,
            task: &VisionTask<'_>,
            _request: &AnalysisRequest,
        ) -> Result<Value, StrategyError> {
            self.calls.lock().unwrap().push(task.name().to_string());
            let answer = match task {
                VisionTask::DetectScenario => &self.scenario,
                VisionTask::ReadLabel { .. } => &self.label,
                VisionTask::LookupMenu { .. } => &self.menu,
                VisionTask::ClassifyGeometry => &self.geometry,
            };
            if answer.is_null() {
                return Err(StrategyError::RemoteFailure("scripted failure".into()));
            }
            Ok(answer.clone())
        }
    }

    struct FixedReference(Result<Option<ReferenceMatch>, StrategyError>);

    #[async_trait]
    impl CompositionReference for FixedReference {
        async fn lookup(&self, _label: &str) -> Result<Option<ReferenceMatch>, StrategyError> {
            self.0.clone()
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::from_bytes(b"img".to_vec(), Some("image/jpeg"), None).unwrap()
    }

    fn rice_reference(score: f64) -> Arc<dyn CompositionReference> {
        Arc::new(FixedReference(Ok(Some(ReferenceMatch {
            description: "Rice, white, cooked".to_string(),
            kcal_per_g: 1.3,
            score,
        }))))
    }

    #[tokio::test]
    async fn test_packaged_goes_to_label_path() {
        let mut model = ScriptedModel::new(json!({"scenario": "packaged", "brand": "Kind"}));
        model.label = json!({"calories_per_serving": 200, "servings": 1});
        let model = Arc::new(model);

        let router = MultiPathRouter::new(model.clone());
        let items = router.route(&request()).await.unwrap();

        assert_eq!(model.calls(), vec!["scenario", "label"]);
        assert_eq!(items[0].label, "Kind");
        assert_eq!(items[0].evidence, vec!["Scenario:Packaged", LABEL_EVIDENCE]);
    }

    #[tokio::test]
    async fn test_named_restaurant_goes_to_menu_path() {
        let mut model = ScriptedModel::new(
            json!({"scenario": "restaurant", "restaurant": "Chipotle", "confidence": 0.9}),
        );
        model.menu = json!({"item": "Chicken Burrito", "calories": 1050});
        let model = Arc::new(model);

        let router = MultiPathRouter::new(model.clone());
        let items = router.route(&request()).await.unwrap();

        assert_eq!(model.calls(), vec!["scenario", "menu"]);
        assert_eq!(items[0].calories, Some(1050.0));
        assert_eq!(items[0].confidence, 0.9);
    }

    #[tokio::test]
    async fn test_unnamed_restaurant_goes_to_geometry_path() {
        let mut model = ScriptedModel::new(json!({"scenario": "restaurant", "restaurant": null}));
        model.geometry = json!({"label": "pad thai", "kcal_per_g": 1.7, "density_g_per_ml": 0.8});
        let model = Arc::new(model);

        let router = MultiPathRouter::new(model.clone());
        let items = router.route(&request()).await.unwrap();

        assert_eq!(model.calls(), vec!["scenario", "geometry"]);
        assert_eq!(
            items[0].evidence,
            vec!["Scenario:Restaurant", GEOMETRY_EVIDENCE]
        );
        assert!(items[0].calories.is_none());
    }

    #[tokio::test]
    async fn test_confident_reference_replaces_kcal_per_g() {
        let mut model = ScriptedModel::new(json!({"scenario": "prepared"}));
        model.geometry = json!({"label": "white rice", "kcal_per_g": 1.6, "kcal_per_g_sigma": 0.4});
        let router =
            MultiPathRouter::new(Arc::new(model)).with_reference(rice_reference(1.0), 0.5);

        let items = router.route(&request()).await.unwrap();
        let kcal = items[0].kcal_per_g().unwrap();

        assert_eq!(kcal.mu, 1.3);
        assert!(kcal.sigma <= 0.13 + 1e-9);
        assert_eq!(items[0].label, "white rice");
        assert!(items[0].evidence.contains(&REFERENCE_EVIDENCE.to_string()));
    }

    #[tokio::test]
    async fn test_weak_reference_match_is_ignored() {
        let mut model = ScriptedModel::new(json!({"scenario": "prepared"}));
        model.geometry = json!({"label": "risotto", "kcal_per_g": 1.6});
        let router =
            MultiPathRouter::new(Arc::new(model)).with_reference(rice_reference(0.2), 0.5);

        let items = router.route(&request()).await.unwrap();
        assert_eq!(items[0].kcal_per_g().unwrap().mu, 1.6);
        assert!(!items[0].evidence.contains(&REFERENCE_EVIDENCE.to_string()));
    }

    #[tokio::test]
    async fn test_reference_failure_fails_the_route() {
        let mut model = ScriptedModel::new(json!({"scenario": "prepared"}));
        model.geometry = json!({"label": "rice"});
        let reference: Arc<dyn CompositionReference> = Arc::new(FixedReference(Err(
            StrategyError::RemoteFailure("HTTP 500".into()),
        )));
        let router = MultiPathRouter::new(Arc::new(model)).with_reference(reference, 0.5);

        let err = router.route(&request()).await.unwrap_err();
        assert!(matches!(err, StrategyError::RemoteFailure(_)));
    }

    #[tokio::test]
    async fn test_sub_step_failure_is_hard_error() {
        let mut model = ScriptedModel::new(json!({"scenario": "packaged"}));
        model.label = Value::Null;
        let model = Arc::new(model);

        let router = MultiPathRouter::new(model.clone());
        let err = router.route(&request()).await.unwrap_err();

        assert!(matches!(err, StrategyError::RemoteFailure(_)));
        assert_eq!(model.calls(), vec!["scenario", "label"]);
    }
}
