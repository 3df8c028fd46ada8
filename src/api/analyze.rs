//! Food analysis endpoint handler.

use crate::analysis::{AnalysisRequest, InputError};
use crate::api::{adapt, AnalyzeJsonRequest, AnalyzeResponse, ApiError, AppState};
use crate::logging::{analysis_span, request_id_from_headers, result_fields};
use crate::reconciler::reconcile;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

/// Multipart field names accepted for the image file.
const IMAGE_FIELDS: &[&str] = &["image", "file"];

/// POST /api/analyze-food - Identify the food in a photo and estimate its calories.
///
/// Accepts `multipart/form-data` (an `image` or `file` part plus optional
/// `region`) or a JSON body with exactly one of `imageUrl`/`imageBase64`.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = request_id_from_headers(request.headers());
    let span = analysis_span(&request_id, "http");

    async move {
        let analysis_request = parse_request(request).await.map_err(|e| {
            warn!(error_code = e.code(), error = %e, "Rejected analysis request");
            metrics::counter!("morsel_input_errors_total", "code" => e.code()).increment(1);
            ApiError::from(e)
        })?;

        info!(
            image = %analysis_request.image.describe(),
            region = analysis_request.region.as_deref().unwrap_or("-"),
            "Analysis request"
        );

        let result = state.orchestrator.run(&analysis_request).await.map_err(|e| {
            error!(error_code = e.code(), error = %e, "Analysis failed");
            ApiError::from(e)
        })?;

        let calories = reconcile(result.primary());
        let (label, items, used) = result_fields(&result);
        info!(
            label = %label,
            items,
            used = %used,
            calories = calories.calories,
            method = %calories.method,
            latency_ms = result.meta().latency_ms,
            "Analysis complete"
        );

        Ok::<_, ApiError>(Json(adapt(&result, &calories, &request_id)))
    }
    .instrument(span)
    .await
}

/// Turn an HTTP request into an [`AnalysisRequest`], dispatching on content type.
async fn parse_request(request: Request) -> Result<AnalysisRequest, InputError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| InputError::UnreadableBody(e.body_text()))?;
            parse_multipart(multipart).await
        }
        None => parse_json(request).await,
        Some(ct) if ct.starts_with("application/json") => parse_json(request).await,
        Some(ct) => Err(InputError::UnsupportedContentType(ct.to_string())),
    }
}

async fn parse_json(request: Request) -> Result<AnalysisRequest, InputError> {
    let body = Bytes::from_request(request, &())
        .await
        .map_err(|e| InputError::UnreadableBody(e.body_text()))?;

    // An empty body is a request without an image, not a syntax error.
    let fields: AnalyzeJsonRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AnalyzeJsonRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| InputError::UnreadableBody(e.to_string()))?
    };

    AnalysisRequest::from_fields(
        fields.image_url.as_deref(),
        fields.image_base64.as_deref(),
        fields.region,
    )
}

async fn parse_multipart(mut multipart: Multipart) -> Result<AnalysisRequest, InputError> {
    let mut image: Option<(Vec<u8>, Option<String>)> = None;
    let mut region = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| InputError::UnreadableBody(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if IMAGE_FIELDS.contains(&name.as_str()) {
            if image.is_some() {
                return Err(InputError::AmbiguousImage);
            }
            let mime_type = upload_mime_type(field.content_type(), field.file_name());
            let data = field
                .bytes()
                .await
                .map_err(|e| InputError::UnreadableBody(e.body_text()))?;
            image = Some((data.to_vec(), mime_type));
        } else if name == "region" {
            let text = field
                .text()
                .await
                .map_err(|e| InputError::UnreadableBody(e.body_text()))?;
            region = Some(text);
        }
    }

    let (data, mime_type) = image.ok_or(InputError::MissingImage)?;
    AnalysisRequest::from_bytes(data, mime_type.as_deref(), region)
}

/// MIME type of an uploaded part: the declared one if it is an image type,
/// otherwise a guess from the file name.
fn upload_mime_type(declared: Option<&str>, file_name: Option<&str>) -> Option<String> {
    declared
        .filter(|ct| ct.starts_with("image/"))
        .map(str::to_string)
        .or_else(|| {
            file_name
                .and_then(|name| mime_guess::from_path(name).first())
                .filter(|m| m.type_() == mime_guess::mime::IMAGE)
                .map(|m| m.essence_str().to_string())
        })
}
