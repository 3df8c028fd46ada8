//! # HTTP API
//!
//! Public endpoints of the food analysis service.
//!
//! ## Endpoints
//!
//! - `POST /api/analyze-food` - Analyse a food photo (multipart or JSON)
//! - `GET /health` - Service status with the resolved fallback chain
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Example
//!
//! ```no_run
//! use morsel::api::{AppState, create_router};
//! use morsel::config::MorselConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(MorselConfig::default());
//! let state = Arc::new(AppState::new(config)?);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Errors are returned as:
//! ```json
//! { "error": "imageBase64 is not valid base64", "errorCode": "invalid_base64" }
//! ```
//! with status 400 for input problems and 500 when every strategy failed.

mod adapter;
mod analyze;
mod health;
pub mod types;

pub use adapter::{adapt, display_for, AnalyzeResponse, ResponseMeta};
pub use health::HealthResponse;
pub use types::*;

use crate::config::MorselConfig;
use crate::metrics::MetricsCollector;
use crate::pipeline::{Orchestrator, StrategyRegistry};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<MorselConfig>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    /// Build the strategy chain from configuration and wrap it in shared state.
    pub fn new(config: Arc<MorselConfig>) -> Result<Self, reqwest::Error> {
        let http_client = build_http_client(&config)?;
        let registry = Arc::new(StrategyRegistry::from_config(&config, http_client));
        Ok(Self::with_registry(config, registry))
    }

    /// Create state around an already-built registry.
    pub fn with_registry(config: Arc<MorselConfig>, registry: Arc<StrategyRegistry>) -> Self {
        let start_time = Instant::now();
        let orchestrator = Arc::new(Orchestrator::new(
            registry,
            config.pipeline.strategy_timeout(),
        ));

        let prometheus_handle = crate::metrics::setup_metrics_or_detached();
        let metrics_collector = Arc::new(MetricsCollector::new(start_time, prometheus_handle));
        metrics_collector.update_chain_gauges(orchestrator.registry());

        Self {
            orchestrator,
            config,
            start_time,
            metrics_collector,
        }
    }
}

/// Shared outbound client. Per-call timeouts are applied by each remote
/// strategy, so only connection settings live here.
pub fn build_http_client(config: &MorselConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.pipeline.call_timeout())
        .pool_max_idle_per_host(10)
        .build()
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        .route("/api/analyze-food", post(analyze::handle))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
