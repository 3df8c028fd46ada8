//! Orchestration of the fallback chain.
//!
//! The [`Orchestrator`] is the only component that knows about ordering and
//! fallback. It walks the registry's chain strictly one strategy at a time,
//! bounds each invocation with a timeout and returns the first success.

pub mod error;
pub mod registry;

pub use error::{PipelineError, StrategyAttempt};
pub use registry::{StrategyRegistry, UnavailableStrategy};

use crate::analysis::{AnalysisMeta, AnalysisRequest, AnalysisResult};
use crate::strategy::{EstimationStrategy, StrategyError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs analysis requests through the fallback chain.
pub struct Orchestrator {
    registry: Arc<StrategyRegistry>,
    strategy_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: Arc<StrategyRegistry>, strategy_timeout: Duration) -> Self {
        Self {
            registry,
            strategy_timeout,
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Analyse one image. Dropping the returned future aborts the in-flight
    /// strategy call.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        self.run_cancellable(request, &CancellationToken::new()).await
    }

    /// Like [`Orchestrator::run`], but stops with [`PipelineError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn run_cancellable(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        run_chain(
            self.registry.strategies(),
            request,
            self.strategy_timeout,
            cancel,
        )
        .await
    }
}

async fn run_chain(
    chain: &[Arc<dyn EstimationStrategy>],
    request: &AnalysisRequest,
    strategy_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, PipelineError> {
    let started = Instant::now();
    let mut used = Vec::with_capacity(chain.len());
    let mut attempts = Vec::new();

    for (index, strategy) in chain.iter().enumerate() {
        let id = strategy.id().to_string();
        used.push(id.clone());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(strategy = %id, "Analysis cancelled");
                return Err(PipelineError::Cancelled);
            }
            outcome = tokio::time::timeout(strategy_timeout, strategy.analyze(request)) => outcome,
        };

        let error = match outcome {
            Ok(Ok(result)) => {
                let latency = started.elapsed();
                let fallback = index > 0;
                info!(
                    strategy = %id,
                    fallback,
                    latency_ms = latency.as_millis() as u64,
                    items = result.items().len(),
                    "Analysis succeeded"
                );

                metrics::counter!("morsel_analyses_total", "strategy" => id.clone()).increment(1);
                metrics::histogram!("morsel_analysis_duration_seconds", "strategy" => id.clone())
                    .record(latency.as_secs_f64());
                if fallback {
                    metrics::counter!("morsel_fallbacks_total", "strategy" => id).increment(1);
                }

                return Ok(result.with_meta(AnalysisMeta {
                    used,
                    fallback,
                    latency_ms: latency.as_millis() as u64,
                }));
            }
            Ok(Err(e)) => e,
            Err(_) => StrategyError::Timeout(strategy_timeout.as_millis() as u64),
        };

        warn!(
            strategy = %id,
            error_kind = error.kind(),
            error = %error,
            "Strategy failed, falling back"
        );
        metrics::counter!("morsel_strategy_failures_total",
            "strategy" => id.clone(),
            "kind" => error.kind()
        )
        .increment(1);

        attempts.push(StrategyAttempt {
            strategy: id,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    Err(PipelineError::AllStrategiesFailed { attempts })
}
