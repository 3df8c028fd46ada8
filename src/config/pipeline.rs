//! Pipeline timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts applied by the orchestrator and by every outbound call.
///
/// # Example
///
/// ```toml
/// [pipeline]
/// strategy_timeout_seconds = 45
/// call_timeout_seconds = 20
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ceiling for one strategy invocation, all of its remote calls included.
    pub strategy_timeout_seconds: u64,

    /// Ceiling for a single remote call (scenario detection, OCR, menu
    /// lookup, geometry classification, reference lookup, classification).
    pub call_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy_timeout_seconds: 45,
            call_timeout_seconds: 20,
        }
    }
}

impl PipelineConfig {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}
