//! Error types for estimation strategies.

use std::time::Duration;
use thiserror::Error;

/// Errors a strategy may report. Every variant is recoverable by falling
/// through to the next strategy in the chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// Required credentials or endpoint are missing or malformed.
    #[error("Strategy not configured: {0}")]
    Unconfigured(String),

    /// Remote service unreachable or returned an error status.
    #[error("Remote call failed: {0}")]
    RemoteFailure(String),

    /// A remote call or the whole strategy exceeded its deadline.
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Remote service answered, but not in the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Nothing usable was recognised in the image.
    #[error("Strategy produced no food items")]
    EmptyResult,
}

impl StrategyError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyError::Unconfigured(_) => "unconfigured",
            StrategyError::RemoteFailure(_) => "remote_failure",
            StrategyError::Timeout(_) => "timeout",
            StrategyError::MalformedResponse(_) => "malformed_response",
            StrategyError::EmptyResult => "empty_result",
        }
    }

    /// Map a transport error, treating client-side timeouts as [`StrategyError::Timeout`].
    pub fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            StrategyError::Timeout(timeout.as_millis() as u64)
        } else if error.is_decode() {
            StrategyError::MalformedResponse(error.to_string())
        } else {
            StrategyError::RemoteFailure(error.to_string())
        }
    }
}
