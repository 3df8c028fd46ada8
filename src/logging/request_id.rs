//! Request correlation ids.

use axum::http::HeaderMap;
use tracing::Span;
use uuid::Uuid;

/// Header a caller may use to supply its own correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is accepted as-is.
const MAX_CALLER_ID_LEN: usize = 128;

/// Generate a new request ID using UUID v4
///
/// # Examples
///
/// ```
/// use morsel::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert_eq!(request_id.len(), 36);
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Use the caller's `X-Request-Id` when it is short printable ASCII,
/// otherwise mint a fresh one.
pub fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_CALLER_ID_LEN
                && id.chars().all(|c| c.is_ascii_graphic())
        })
        .map(str::to_string)
        .unwrap_or_else(generate_request_id)
}

/// Span wrapping one analysis; every strategy log line inherits the id.
pub fn analysis_span(request_id: &str, source: &'static str) -> Span {
    tracing::info_span!("analyze", request_id = %request_id, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_generate_request_id_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }

    #[test]
    fn test_caller_id_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("mobile-7f3a"));
        assert_eq!(request_id_from_headers(&headers), "mobile-7f3a");
    }

    #[test]
    fn test_missing_or_bad_caller_id_is_replaced() {
        assert_eq!(request_id_from_headers(&HeaderMap::new()).len(), 36);

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("has space"));
        assert_eq!(request_id_from_headers(&headers).len(), 36);

        let long = "a".repeat(MAX_CALLER_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_eq!(request_id_from_headers(&headers).len(), 36);
    }
}
