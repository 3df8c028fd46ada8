//! Inbound analysis requests and their validation.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Url;
use thiserror::Error;

/// Client-caused problems with an analysis request.
///
/// These are surfaced immediately as a 400; no strategy is ever invoked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("An image is required: provide imageUrl, imageBase64 or a multipart image file")]
    MissingImage,

    #[error("Provide exactly one image source, not both imageUrl and imageBase64")]
    AmbiguousImage,

    #[error("imageBase64 is not valid base64")]
    MalformedBase64,

    #[error("imageUrl is not a valid http(s) URL: {0}")]
    InvalidUrl(String),

    #[error("Request body could not be parsed: {0}")]
    UnreadableBody(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

impl InputError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            InputError::MissingImage => "missing_image",
            InputError::AmbiguousImage => "ambiguous_image",
            InputError::MalformedBase64 => "invalid_base64",
            InputError::InvalidUrl(_) => "invalid_url",
            InputError::UnreadableBody(_) => "invalid_body",
            InputError::UnsupportedContentType(_) => "unsupported_content_type",
        }
    }
}

/// Where the image comes from. Exactly one source per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Bytes { data: Vec<u8>, mime_type: String },
    Url(Url),
}

impl ImageSource {
    /// Render the image as something a remote vision API accepts in an
    /// `image_url` field: the URL itself or a `data:` URL.
    pub fn to_data_url(&self) -> String {
        match self {
            ImageSource::Url(url) => url.to_string(),
            ImageSource::Bytes { data, mime_type } => {
                format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
            }
        }
    }

    /// Short description for logs; never includes image bytes.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => format!("url:{}", url.host_str().unwrap_or("?")),
            ImageSource::Bytes { data, mime_type } => {
                format!("bytes:{}:{}", mime_type, data.len())
            }
        }
    }
}

/// Input to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub image: ImageSource,
    pub region: Option<String>,
}

impl AnalysisRequest {
    pub fn new(image: ImageSource, region: Option<String>) -> Self {
        Self {
            image,
            region: region.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Build a request from the loosely-typed JSON fields of the public API.
    pub fn from_fields(
        image_url: Option<&str>,
        image_base64: Option<&str>,
        region: Option<String>,
    ) -> Result<Self, InputError> {
        let image_url = image_url.map(str::trim).filter(|s| !s.is_empty());
        let image_base64 = image_base64.map(str::trim).filter(|s| !s.is_empty());

        let image = match (image_url, image_base64) {
            (None, None) => return Err(InputError::MissingImage),
            (Some(_), Some(_)) => return Err(InputError::AmbiguousImage),
            (Some(url), None) => parse_image_url(url)?,
            (None, Some(encoded)) => decode_base64_image(encoded)?,
        };

        Ok(Self::new(image, region))
    }

    /// Build a request from raw uploaded bytes.
    pub fn from_bytes(
        data: Vec<u8>,
        mime_type: Option<&str>,
        region: Option<String>,
    ) -> Result<Self, InputError> {
        if data.is_empty() {
            return Err(InputError::MissingImage);
        }
        let mime_type = mime_type
            .filter(|m| m.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        Ok(Self::new(ImageSource::Bytes { data, mime_type }, region))
    }
}

fn parse_image_url(raw: &str) -> Result<ImageSource, InputError> {
    let url = Url::parse(raw).map_err(|e| InputError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(ImageSource::Url(url)),
        other => Err(InputError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

/// Decode base64 image text, accepting an optional `data:<mime>;base64,` prefix.
fn decode_base64_image(raw: &str) -> Result<ImageSource, InputError> {
    let (mime_type, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or(InputError::MalformedBase64)?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or(InputError::MalformedBase64)?;
            (mime.to_string(), payload)
        }
        None => ("image/jpeg".to_string(), raw),
    };

    if !is_base64_text(payload) {
        return Err(InputError::MalformedBase64);
    }

    let data = STANDARD
        .decode(payload)
        .map_err(|_| InputError::MalformedBase64)?;
    if data.is_empty() {
        return Err(InputError::MalformedBase64);
    }

    Ok(ImageSource::Bytes { data, mime_type })
}

/// Matches `^[A-Za-z0-9+/]+=*$`.
fn is_base64_text(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}
