//! Error types for pipeline runs

use thiserror::Error;

/// One failed strategy attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: String,
    /// [`crate::strategy::StrategyError::kind`] of the failure.
    pub kind: &'static str,
    pub message: String,
}

/// Errors that end a pipeline run without a result
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Every strategy in the chain failed
    #[error("All strategies in the fallback chain failed: {}", summarize(.attempts))]
    AllStrategiesFailed { attempts: Vec<StrategyAttempt> },

    /// The caller cancelled the run
    #[error("Analysis cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::AllStrategiesFailed { .. } => "analysis_failed",
            PipelineError::Cancelled => "cancelled",
        }
    }
}

fn summarize(attempts: &[StrategyAttempt]) -> String {
    if attempts.is_empty() {
        return "no strategies configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.strategy, a.kind))
        .collect::<Vec<_>>()
        .join(", ")
}
