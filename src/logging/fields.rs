//! Field extraction helpers for structured logging

use crate::analysis::AnalysisResult;

/// Longest remote payload preview written to the logs.
pub const PAYLOAD_PREVIEW_CHARS: usize = 200;

/// Summarise an analysis result as (primary label, item count, strategies used).
///
/// # Examples
///
/// ```
/// use morsel::analysis::{AnalysisMeta, AnalysisResult, FoodItem};
/// use morsel::logging::result_fields;
///
/// let result = AnalysisResult::new(
///     vec![FoodItem::new("ramen", 0.8)],
///     AnalysisMeta { used: vec!["vision".to_string()], ..Default::default() },
/// )
/// .unwrap();
/// assert_eq!(result_fields(&result), ("ramen".to_string(), 1, "vision".to_string()));
/// ```
pub fn result_fields(result: &AnalysisResult) -> (String, usize, String) {
    (
        result.primary().label.clone(),
        result.items().len(),
        result.meta().used.join(","),
    )
}

/// Truncate a remote payload for logging.
///
/// Returns None if payload logging is disabled. Cuts on a character
/// boundary and marks the cut with "...".
///
/// # Examples
///
/// ```
/// use morsel::logging::truncate_payload;
///
/// assert_eq!(truncate_payload("{\"a\":1}", true).as_deref(), Some("{\"a\":1}"));
/// assert!(truncate_payload("secret", false).is_none());
/// ```
pub fn truncate_payload(payload: &str, enabled: bool) -> Option<String> {
    if !enabled || payload.is_empty() {
        return None;
    }
    Some(truncate_string(payload, PAYLOAD_PREVIEW_CHARS))
}

fn truncate_string(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}
