//! Shared plumbing for outbound JSON calls.

use super::StrategyError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Send a request with a per-call timeout and decode a JSON body.
///
/// Non-2xx statuses become [`StrategyError::RemoteFailure`], undecodable
/// bodies become [`StrategyError::MalformedResponse`]. Dropping the returned
/// future aborts the in-flight call.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, StrategyError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| StrategyError::from_transport(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let mut body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(StrategyError::RemoteFailure(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| StrategyError::from_transport(e, timeout))?;

    serde_json::from_str(&body).map_err(|e| StrategyError::MalformedResponse(e.to_string()))
}
