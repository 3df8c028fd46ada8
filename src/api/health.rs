//! Health check endpoint handler.

use crate::api::AppState;
use crate::pipeline::UnavailableStrategy;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    /// Strategy ids in fallback order.
    pub chain: Vec<String>,
    pub unavailable: Vec<UnavailableStrategy>,
}

/// GET /health - Return service status and chain diagnostics.
///
/// "healthy" when every configured strategy was built, "degraded" when some
/// fell back to unavailable. The placeholder keeps the service answering
/// either way.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registry = state.orchestrator.registry();
    let unavailable = registry.unavailable().to_vec();

    let status = if unavailable.is_empty() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        chain: registry.resolve_chain(),
        unavailable,
    })
}
