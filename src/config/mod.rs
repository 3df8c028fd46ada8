//! Configuration module for Morsel
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`MORSEL_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! Configuration is read once at startup and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use morsel::config::MorselConfig;
//!
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: MorselConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! assert_eq!(config.pipeline.call_timeout_seconds, 20);
//! ```

pub mod error;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod strategies;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use server::ServerConfig;
pub use strategies::{
    parse_endpoint, Credentials, ManagedConfig, ReferenceConfig, StrategiesConfig, StrategyChoice,
    VisionConfig,
};

use crate::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Morsel service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MorselConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Orchestrator and remote-call timeouts
    pub pipeline: PipelineConfig,
    /// Strategy order and credentials
    pub strategies: StrategiesConfig,
}

impl MorselConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (the previous value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("MORSEL_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("MORSEL_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("MORSEL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MORSEL_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(strategy) = std::env::var("MORSEL_STRATEGY") {
            match strategy.parse::<StrategyKind>() {
                Ok(kind) => self.strategies.preferred = Some(kind.into()),
                Err(e) => tracing::warn!(value = %strategy, error = %e, "Ignoring MORSEL_STRATEGY"),
            }
        }

        if let Ok(endpoint) = std::env::var("MORSEL_VISION_ENDPOINT") {
            self.strategies.vision.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("MORSEL_VISION_API_KEY") {
            self.strategies.vision.credentials.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("MORSEL_MANAGED_ENDPOINT") {
            self.strategies.managed.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("MORSEL_MANAGED_API_KEY") {
            self.strategies.managed.credentials.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("MORSEL_MANAGED_MODEL") {
            self.strategies.managed.model = model;
        }
        if let Ok(key) = std::env::var("MORSEL_USDA_API_KEY") {
            self.strategies.reference.credentials.api_key = Some(key);
        }

        self
    }

    /// Validate structural settings.
    ///
    /// Strategy credentials are deliberately not checked here; the strategy
    /// registry downgrades a badly configured strategy to "unavailable".
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }

        let pipeline = &self.pipeline;
        if pipeline.strategy_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "pipeline.strategy_timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        if pipeline.call_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "pipeline.call_timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        if pipeline.call_timeout_seconds > pipeline.strategy_timeout_seconds {
            return Err(ConfigError::invalid(
                "pipeline.call_timeout_seconds",
                format!(
                    "{}s exceeds strategy_timeout_seconds ({}s)",
                    pipeline.call_timeout_seconds, pipeline.strategy_timeout_seconds
                ),
            ));
        }

        let score = self.strategies.reference.min_match_score;
        if !(0.0..=1.0).contains(&score) {
            return Err(ConfigError::invalid(
                "strategies.reference.min_match_score",
                "must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use std::path::Path;

    #[test]
    fn test_morsel_config_defaults() {
        let config = MorselConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.pipeline.strategy_timeout_seconds, 45);
        assert!(config.strategies.vision.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../morsel.example.toml");
        let config: MorselConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = MorselConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = MorselConfig::load(Some(Path::new("/nonexistent/morsel.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server\nport = ").unwrap();

        let result = MorselConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = MorselConfig::load(None).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("MORSEL_PORT", "9999");
        std::env::set_var("MORSEL_STRATEGY", "vision");
        std::env::set_var("MORSEL_VISION_ENDPOINT", "https://vision.env.test");
        let config = MorselConfig::default().with_env_overrides();
        std::env::remove_var("MORSEL_PORT");
        std::env::remove_var("MORSEL_STRATEGY");
        std::env::remove_var("MORSEL_VISION_ENDPOINT");

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.strategies.preferred, Some(StrategyKind::Vision.into()));
        assert_eq!(
            config.strategies.vision.endpoint.as_deref(),
            Some("https://vision.env.test")
        );

        // An unknown name keeps whatever preference was already configured.
        std::env::set_var("MORSEL_STRATEGY", "gemini");
        let config = config.with_env_overrides();
        std::env::remove_var("MORSEL_STRATEGY");
        assert_eq!(config.strategies.preferred, Some(StrategyKind::Vision.into()));
    }

    #[test]
    fn test_config_load_tolerates_unknown_strategy() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "[strategies]\npreferred = \"gemini\"\norder = [\"vision\", \"claude\"]\n",
        )
        .unwrap();

        let config = MorselConfig::load(Some(temp_file.path())).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategies.effective_order(), vec![StrategyKind::Vision]);
        assert_eq!(
            config.strategies.unknown_strategies(),
            vec!["gemini", "claude"]
        );
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("MORSEL_LOG_FORMAT", "xml");
        let config = MorselConfig::default().with_env_overrides();
        std::env::remove_var("MORSEL_LOG_FORMAT");

        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = MorselConfig::default();
        config.server.port = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_config_validation_zero_call_timeout() {
        let mut config = MorselConfig::default();
        config.pipeline.call_timeout_seconds = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field.contains("call_timeout")
        ));
    }

    #[test]
    fn test_config_validation_call_longer_than_strategy() {
        let mut config = MorselConfig::default();
        config.pipeline.strategy_timeout_seconds = 10;
        config.pipeline.call_timeout_seconds = 30;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds strategy_timeout_seconds"));
    }

    #[test]
    fn test_malformed_credentials_do_not_fail_validation() {
        let mut config = MorselConfig::default();
        config.strategies.vision.endpoint = Some("::not a url::".to_string());
        assert!(config.validate().is_ok());
    }
}
