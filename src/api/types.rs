//! Request and error types for the public API.

use crate::analysis::InputError;
use crate::pipeline::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON body of `POST /api/analyze-food`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeJsonRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// API error response: `{ "error": "...", "errorCode": "..." }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    pub error_code: String,
    #[serde(skip)]
    status: u16,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>, error_code: &str) -> Self {
        Self {
            error: error.into(),
            error_code: error_code.to_string(),
            status: status.as_u16(),
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(error: &InputError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error.to_string(), error.code())
    }

    /// Create an analysis failure (500).
    ///
    /// The message is generic; per-strategy detail only goes to the logs.
    pub fn analysis_failed(error: &PipelineError) -> Self {
        let message = match error {
            PipelineError::AllStrategiesFailed { .. } => {
                "Food analysis failed. Please try again with a different photo."
            }
            PipelineError::Cancelled => "Food analysis was cancelled.",
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, error.code())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<InputError> for ApiError {
    fn from(error: InputError) -> Self {
        Self::bad_request(&error)
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        Self::analysis_failed(&error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
