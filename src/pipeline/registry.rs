//! Strategy registry: which strategies exist and in what order to try them.

use crate::config::MorselConfig;
use crate::strategy::{create_strategy, EstimationStrategy, PlaceholderStrategy, StrategyKind};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

const UNKNOWN_STRATEGY_REASON: &str = "unknown strategy (expected managed, vision or placeholder)";

/// A configured strategy that could not be built, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableStrategy {
    pub id: String,
    pub reason: String,
}

/// The fallback chain, fixed at startup.
///
/// The placeholder strategy is always present and always last, so the chain
/// is never empty.
pub struct StrategyRegistry {
    chain: Vec<Arc<dyn EstimationStrategy>>,
    unavailable: Vec<UnavailableStrategy>,
}

impl StrategyRegistry {
    /// Build the chain from configuration.
    ///
    /// Strategies whose endpoints or credentials are missing or malformed,
    /// and names that match no built-in strategy, are recorded as
    /// unavailable instead of failing startup.
    pub fn from_config(config: &MorselConfig, client: Client) -> Self {
        let mut chain = Vec::new();
        let mut unavailable = Vec::new();

        for name in config.strategies.unknown_strategies() {
            tracing::warn!(strategy = %name, "Unknown strategy in configuration");
            unavailable.push(UnavailableStrategy {
                id: name,
                reason: UNKNOWN_STRATEGY_REASON.to_string(),
            });
        }

        for kind in config.strategies.effective_order() {
            match create_strategy(
                kind,
                &config.strategies,
                &config.pipeline,
                client.clone(),
                config.logging.log_remote_payloads,
            ) {
                Ok(strategy) => {
                    tracing::info!(strategy = %kind, name = strategy.name(), "Strategy available");
                    chain.push(strategy);
                }
                Err(e) => {
                    tracing::warn!(strategy = %kind, reason = %e, "Strategy unavailable");
                    unavailable.push(UnavailableStrategy {
                        id: kind.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut registry = Self::with_chain(chain);
        registry.unavailable = unavailable;
        registry
    }

    /// Build a registry from ready-made strategies, tried in the given order.
    ///
    /// Any placeholder in `strategies` is dropped and a single placeholder is
    /// appended at the end.
    pub fn with_chain(strategies: Vec<Arc<dyn EstimationStrategy>>) -> Self {
        let placeholder_id = StrategyKind::Placeholder.as_str();
        let mut chain: Vec<Arc<dyn EstimationStrategy>> = strategies
            .into_iter()
            .filter(|s| s.id() != placeholder_id)
            .collect();
        chain.push(Arc::new(PlaceholderStrategy::new()));

        Self {
            chain,
            unavailable: Vec::new(),
        }
    }

    /// Strategy ids in the order the orchestrator will try them.
    pub fn resolve_chain(&self) -> Vec<String> {
        self.chain.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn strategies(&self) -> &[Arc<dyn EstimationStrategy>] {
        &self.chain
    }

    pub fn unavailable(&self) -> &[UnavailableStrategy] {
        &self.unavailable
    }
}
