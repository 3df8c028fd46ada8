//! Estimation strategies - interchangeable ways to turn an image into food items.
//!
//! This module provides the `EstimationStrategy` trait and its three
//! implementations. Strategies know nothing about ordering or fallback; that
//! belongs to the [`crate::pipeline`] orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod factory;
pub mod managed;
pub mod placeholder;
pub(crate) mod remote;
pub mod vision;

pub use error::StrategyError;
pub use factory::create_strategy;
pub use managed::ManagedStrategy;
pub use placeholder::PlaceholderStrategy;
pub use vision::VisionStrategy;

use crate::analysis::{AnalysisRequest, AnalysisResult};

/// The built-in strategy families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Managed backend fanning out through the multi-path router.
    Managed,
    /// Remote food-image-classification service.
    Vision,
    /// Deterministic offline answer; always available.
    Placeholder,
}

impl StrategyKind {
    /// Identifier reported in `meta.used`.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Managed => "managed",
            StrategyKind::Vision => "vision",
            StrategyKind::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "managed" => Ok(StrategyKind::Managed),
            "vision" => Ok(StrategyKind::Vision),
            "placeholder" => Ok(StrategyKind::Placeholder),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// One way of estimating food identity, portion and calories from an image.
///
/// # Contract
///
/// - Never returns an [`AnalysisResult`] without items; an empty outcome is
///   [`StrategyError::EmptyResult`].
/// - Never swallows a failure; every problem is reported as a
///   [`StrategyError`].
/// - Side effects are limited to outbound network calls.
///
/// # Cancellation Safety
///
/// Dropping the future returned by [`EstimationStrategy::analyze`] aborts any
/// in-flight HTTP request.
#[async_trait]
pub trait EstimationStrategy: Send + Sync + 'static {
    /// Stable identifier reported in `meta.used` (e.g. "vision").
    fn id(&self) -> &str;

    /// Human-readable name for logs and the CLI.
    fn name(&self) -> &str;

    /// Analyse one image.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, StrategyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_from_str() {
        assert_eq!("managed".parse::<StrategyKind>(), Ok(StrategyKind::Managed));
        assert_eq!(" Vision ".parse::<StrategyKind>(), Ok(StrategyKind::Vision));
        assert!("magic".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_kind_serde() {
        let json = serde_json::to_string(&StrategyKind::Placeholder).unwrap();
        assert_eq!(json, "\"placeholder\"");
        assert_eq!(StrategyKind::Vision.to_string(), "vision");
    }
}
