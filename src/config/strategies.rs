//! Strategy selection and per-strategy credentials

use crate::strategy::StrategyKind;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default USDA FoodData Central base URL.
pub const DEFAULT_REFERENCE_ENDPOINT: &str = "https://api.nal.usda.gov/fdc";

/// A strategy named in configuration.
///
/// Names that do not match a built-in strategy are kept rather than
/// rejected, so a typo makes that entry unavailable instead of failing the
/// whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyChoice {
    Known(StrategyKind),
    Unknown(String),
}

impl From<StrategyKind> for StrategyChoice {
    fn from(kind: StrategyKind) -> Self {
        StrategyChoice::Known(kind)
    }
}

impl From<&str> for StrategyChoice {
    fn from(raw: &str) -> Self {
        match raw.parse() {
            Ok(kind) => StrategyChoice::Known(kind),
            Err(_) => StrategyChoice::Unknown(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyChoice::Known(kind) => write!(f, "{}", kind),
            StrategyChoice::Unknown(name) => f.write_str(name),
        }
    }
}

impl Serialize for StrategyChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StrategyChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = scalar_text(toml::Value::deserialize(deserializer)?);
        Ok(StrategyChoice::from(raw.as_str()))
    }
}

/// Text of a scalar TOML value; non-strings keep their TOML spelling
/// (`42`, `true`) so they fail later validation with a readable reason.
fn scalar_text(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Accept any scalar where a string is expected.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<toml::Value>::deserialize(deserializer)?.map(scalar_text))
}

/// Keep string keys; any other type counts as no key at all.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<toml::Value>::deserialize(deserializer)? {
        Some(toml::Value::String(s)) => Some(s),
        Some(other) => {
            tracing::warn!(value_type = other.type_str(), "Ignoring non-string credential");
            None
        }
        None => None,
    })
}

/// Accept a list of names or a single bare name.
fn lenient_choices<'de, D>(deserializer: D) -> Result<Vec<StrategyChoice>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match toml::Value::deserialize(deserializer)? {
        toml::Value::Array(values) => values
            .into_iter()
            .map(|v| StrategyChoice::from(scalar_text(v).as_str()))
            .collect(),
        single => vec![StrategyChoice::from(scalar_text(single).as_str())],
    })
}

/// Which strategies to try and how to reach them.
///
/// # Example
///
/// ```toml
/// [strategies]
/// order = ["managed", "vision"]
/// preferred = "vision"
///
/// [strategies.vision]
/// endpoint = "https://food-vision.example.com"
/// api_key_env = "FOOD_VISION_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Preference order among remote strategies. The placeholder strategy is
    /// always appended last regardless of what is listed here.
    #[serde(deserialize_with = "lenient_choices")]
    pub order: Vec<StrategyChoice>,
    /// Explicit choice; moved to the front of `order` when set.
    pub preferred: Option<StrategyChoice>,
    pub vision: VisionConfig,
    pub managed: ManagedConfig,
    pub reference: ReferenceConfig,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            order: vec![StrategyKind::Managed.into(), StrategyKind::Vision.into()],
            preferred: None,
            vision: VisionConfig::default(),
            managed: ManagedConfig::default(),
            reference: ReferenceConfig::default(),
        }
    }
}

impl StrategiesConfig {
    /// Remote strategies in the order they should be tried.
    ///
    /// Duplicates and the placeholder are removed; `preferred` goes first.
    pub fn effective_order(&self) -> Vec<StrategyKind> {
        let mut order = Vec::new();
        for choice in self.choices() {
            if let StrategyChoice::Known(kind) = choice {
                if *kind != StrategyKind::Placeholder && !order.contains(kind) {
                    order.push(*kind);
                }
            }
        }
        order
    }

    /// Configured names that match no built-in strategy, de-duplicated.
    pub fn unknown_strategies(&self) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for choice in self.choices() {
            if let StrategyChoice::Unknown(name) = choice {
                if !unknown.contains(name) {
                    unknown.push(name.clone());
                }
            }
        }
        unknown
    }

    fn choices(&self) -> impl Iterator<Item = &StrategyChoice> {
        self.preferred.iter().chain(self.order.iter())
    }
}

/// An API key given inline or through an environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_env: Option<String>,
}

impl Credentials {
    /// Resolve the key, preferring the inline value.
    pub fn resolve(&self) -> Result<String, String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }
        match &self.api_key_env {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
                _ => Err(format!("environment variable '{}' is not set", var)),
            },
            None => Err("no api_key or api_key_env configured".to_string()),
        }
    }
}

/// Remote food-image-classification service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub endpoint: Option<String>,
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// Managed backend: an OpenAI-compatible vision model driving the
/// multi-path router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub endpoint: Option<String>,
    pub model: String,
    #[serde(flatten)]
    pub credentials: Credentials,
}

impl Default for ManagedConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            credentials: Credentials::default(),
        }
    }
}

/// Food-composition reference used to cross-validate geometry results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub endpoint: String,
    /// Fraction of label words that must appear in a reference description
    /// for the match to count as confident.
    pub min_match_score: f64,
    #[serde(flatten)]
    pub credentials: Credentials,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REFERENCE_ENDPOINT.to_string(),
            min_match_score: 0.5,
            credentials: Credentials::default(),
        }
    }
}

/// Parse an endpoint, accepting only absolute http(s) URLs.
///
/// A trailing slash is trimmed so paths can be appended with `format!`.
pub fn parse_endpoint(raw: Option<&str>) -> Result<String, String> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "no endpoint configured".to_string())?;
    let url = Url::parse(raw).map_err(|e| format!("endpoint '{}' is not a valid URL: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(format!("endpoint scheme '{}' is not http(s)", other)),
    }
}
