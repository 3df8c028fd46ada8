//! Managed-backend strategy: a hosted vision model driving the multi-path router.

use super::{EstimationStrategy, StrategyError, StrategyKind};
use crate::analysis::{AnalysisMeta, AnalysisRequest, AnalysisResult};
use crate::router::MultiPathRouter;
use async_trait::async_trait;

/// Strategy that delegates to a [`MultiPathRouter`].
pub struct ManagedStrategy {
    router: MultiPathRouter,
}

impl ManagedStrategy {
    pub fn new(router: MultiPathRouter) -> Self {
        Self { router }
    }
}

#[async_trait]
impl EstimationStrategy for ManagedStrategy {
    fn id(&self) -> &str {
        StrategyKind::Managed.as_str()
    }

    fn name(&self) -> &str {
        if self.router.has_reference() {
            "Managed vision model (multi-path, reference-validated)"
        } else {
            "Managed vision model (multi-path)"
        }
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, StrategyError> {
        let items = self.router.route(request).await?;

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
