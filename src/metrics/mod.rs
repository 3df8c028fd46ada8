//! # Metrics Collection Module
//!
//! Prometheus export of pipeline activity, served at `GET /metrics`.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `morsel_analyses_total{strategy}` - Successful analyses by winning strategy
//! - `morsel_strategy_failures_total{strategy, kind}` - Strategy failures by error kind
//! - `morsel_fallbacks_total{strategy}` - Analyses won by a non-first strategy
//! - `morsel_calorie_recalculations_total{method}` - Reconciler recalculations
//! - `morsel_input_errors_total{code}` - Requests rejected before analysis
//!
//! **Histograms:**
//! - `morsel_analysis_duration_seconds{strategy}` - Pipeline latency
//!
//! **Gauges:**
//! - `morsel_strategies_available` - Strategies in the fallback chain
//! - `morsel_strategies_unavailable` - Configured strategies that could not be built

pub mod handler;

pub use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::pipeline::StrategyRegistry;
use std::time::Instant;

/// Renders Prometheus text and keeps the chain gauges current.
pub struct MetricsCollector {
    /// Service startup time for uptime calculation
    start_time: Instant,
    /// Prometheus handle for rendering metrics
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(start_time: Instant, prometheus_handle: PrometheusHandle) -> Self {
        Self {
            start_time,
            prometheus_handle,
        }
    }

    /// Update chain gauges from the registry.
    pub fn update_chain_gauges(&self, registry: &StrategyRegistry) {
        metrics::gauge!("morsel_strategies_available").set(registry.strategies().len() as f64);
        metrics::gauge!("morsel_strategies_unavailable").set(registry.unavailable().len() as f64);
    }

    /// Get uptime in seconds since startup.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Initialize the Prometheus exporter with custom histogram buckets.
///
/// Buckets follow the analysis latency profile: placeholder answers in
/// milliseconds, multi-path routing over several remote calls in tens of
/// seconds. Buckets: [0.01, 0.05, 0.1, 0.5, 1, 2.5, 5, 10, 20, 45, 90] seconds.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::Matcher;

    let duration_buckets = &[0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 45.0, 90.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("morsel_analysis_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Install the global recorder, or build a detached handle when one is
/// already installed (tests construct several servers in one process).
pub fn setup_metrics_or_detached() -> PrometheusHandle {
    setup_metrics().unwrap_or_else(|e| {
        tracing::debug!("Metrics already initialized, creating new handle: {}", e);
        PrometheusBuilder::new().build_recorder().handle()
    })
}
