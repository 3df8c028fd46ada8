//! Strategy factory for creating EstimationStrategy trait objects from configuration.

use super::{
    EstimationStrategy, ManagedStrategy, PlaceholderStrategy, StrategyError, StrategyKind,
    VisionStrategy,
};
use crate::config::{parse_endpoint, PipelineConfig, StrategiesConfig};
use crate::router::{ChatVisionModel, MultiPathRouter, UsdaReference};
use reqwest::Client;
use std::sync::Arc;

/// Create a strategy of the given kind from configuration.
///
/// # Arguments
///
/// * `kind` - Which strategy to build
/// * `strategies` - Endpoints and credentials for every strategy
/// * `pipeline` - Timeouts; the per-call timeout is handed to each client
/// * `client` - Shared HTTP client for connection pooling
/// * `log_payloads` - Log raw model answers at debug level
///
/// # Errors
///
/// Returns [`StrategyError::Unconfigured`] with a human-readable reason when
/// an endpoint or credential is missing or malformed. Callers record that
/// reason and move on; it is never fatal.
///
/// # Examples
///
/// ```
/// use morsel::config::{PipelineConfig, StrategiesConfig};
/// use morsel::strategy::{create_strategy, StrategyKind};
/// use reqwest::Client;
///
/// let strategy = create_strategy(
///     StrategyKind::Placeholder,
///     &StrategiesConfig::default(),
///     &PipelineConfig::default(),
///     Client::new(),
///     false,
/// )
/// .unwrap();
/// assert_eq!(strategy.id(), "placeholder");
/// ```
pub fn create_strategy(
    kind: StrategyKind,
    strategies: &StrategiesConfig,
    pipeline: &PipelineConfig,
    client: Client,
    log_payloads: bool,
) -> Result<Arc<dyn EstimationStrategy>, StrategyError> {
    let call_timeout = pipeline.call_timeout();

    match kind {
        StrategyKind::Placeholder => Ok(Arc::new(PlaceholderStrategy::new())),
        StrategyKind::Vision => {
            let config = &strategies.vision;
            let endpoint = parse_endpoint(config.endpoint.as_deref())
                .map_err(|e| StrategyError::Unconfigured(format!("vision: {}", e)))?;
            let api_key = config
                .credentials
                .resolve()
                .map_err(|e| StrategyError::Unconfigured(format!("vision: {}", e)))?;

            Ok(Arc::new(VisionStrategy::new(
                endpoint,
                api_key,
                client,
                call_timeout,
            )))
        }
        StrategyKind::Managed => {
            let config = &strategies.managed;
            let endpoint = parse_endpoint(config.endpoint.as_deref())
                .map_err(|e| StrategyError::Unconfigured(format!("managed: {}", e)))?;
            let api_key = config
                .credentials
                .resolve()
                .map_err(|e| StrategyError::Unconfigured(format!("managed: {}", e)))?;
            if config.model.trim().is_empty() {
                return Err(StrategyError::Unconfigured(
                    "managed: no model configured".to_string(),
                ));
            }

            let model = ChatVisionModel::new(
                endpoint,
                api_key,
                config.model.clone(),
                client.clone(),
                call_timeout,
            )
            .with_payload_logging(log_payloads);
            let mut router = MultiPathRouter::new(Arc::new(model));

            // Cross-validation is optional; without it geometry results keep
            // the model's own priors.
            let reference = &strategies.reference;
            let resolved = parse_endpoint(Some(&reference.endpoint))
                .and_then(|endpoint| reference.credentials.resolve().map(|key| (endpoint, key)));
            match resolved {
                Ok((endpoint, api_key)) => {
                    let usda = UsdaReference::new(endpoint, api_key, client, call_timeout);
                    router = router.with_reference(Arc::new(usda), reference.min_match_score);
                }
                Err(reason) => {
                    tracing::info!(
                        reason = %reason,
                        "Reference lookup unavailable, geometry results will not be cross-validated"
                    );
                }
            }

            Ok(Arc::new(ManagedStrategy::new(router)))
        }
    }
}
