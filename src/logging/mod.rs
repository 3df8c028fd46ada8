//! Structured logging module for request tracing
//!
//! Filter construction from [`LoggingConfig`], correlation ids and the
//! field helpers used by the analysis handlers.

pub mod fields;
pub mod request_id;

pub use fields::{result_fields, truncate_payload};
pub use request_id::{analysis_span, generate_request_id, request_id_from_headers};

use crate::config::LoggingConfig;

/// Build an `EnvFilter` directive string from the base level plus any
/// per-module overrides, e.g. `"info,morsel::router=debug"`.
///
/// # Examples
///
/// ```
/// use morsel::config::LoggingConfig;
/// use morsel::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.component_levels.insert("router".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,morsel::router=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    config
        .component_levels
        .iter()
        .fold(config.level.clone(), |mut filter, (module, level)| {
            filter.push_str(&format!(",morsel::{}={}", module, level));
            filter
        })
}
