//! Core data model for food analysis.
//!
//! Everything that flows between strategies, the orchestrator and the
//! reconciler lives here: the inbound [`AnalysisRequest`], the per-food
//! [`FoodItem`] a strategy produces, and the immutable [`AnalysisResult`]
//! returned to callers.

mod request;

pub use request::{AnalysisRequest, ImageSource, InputError};

use serde::{Deserialize, Serialize};

/// A point estimate with its standard deviation.
///
/// `mu` is always positive and `sigma` never negative; use [`Estimate::new`]
/// to build one from untrusted numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub mu: f64,
    pub sigma: f64,
}

impl Estimate {
    /// Build an estimate, rejecting non-finite values, `mu <= 0` and `sigma < 0`.
    pub fn new(mu: f64, sigma: f64) -> Option<Self> {
        if mu.is_finite() && sigma.is_finite() && mu > 0.0 && sigma >= 0.0 {
            Some(Self { mu, sigma })
        } else {
            None
        }
    }

    /// Estimate whose sigma is a fraction of its mean.
    pub fn relative(mu: f64, relative_sigma: f64) -> Option<Self> {
        Self::new(mu, mu * relative_sigma)
    }
}

/// Statistical parameters used when no direct calorie figure is trustworthy.
///
/// Only `mu` feeds point estimates inside the pipeline; `sigma` is carried
/// untouched for depth-sensing consumers that do their own propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kcal_per_g: Option<Estimate>,
    /// Grams per milliliter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<Estimate>,
}

/// One food a strategy recognised in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    /// Informal free-text label, e.g. "grilled chicken salad".
    pub label: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f64,
    /// Direct calorie estimate, if the producing path had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Absolute standard deviation of `calories`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<f64>,
    #[serde(rename = "volumeML", skip_serializing_if = "Option::is_none")]
    pub volume_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priors: Option<Priors>,
    /// Which sub-systems contributed. Informational only.
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl FoodItem {
    /// Create an item with a label and confidence; everything else empty.
    ///
    /// Confidence is clamped into `[0, 1]` and a blank label becomes
    /// `"unknown food"` so the non-empty label invariant always holds.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        let label = label.into();
        let label = if label.trim().is_empty() {
            "unknown food".to_string()
        } else {
            label.trim().to_string()
        };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            label,
            confidence,
            calories: None,
            calorie_sigma: None,
            weight_grams: None,
            volume_ml: None,
            priors: None,
            evidence: Vec::new(),
        }
    }

    pub fn with_calories(mut self, calories: f64, relative_sigma: f64) -> Self {
        if calories.is_finite() {
            self.calories = Some(calories);
            self.calorie_sigma = Some((calories * relative_sigma).abs());
        }
        self
    }

    pub fn with_weight(mut self, grams: Option<f64>) -> Self {
        self.weight_grams = grams.filter(|g| g.is_finite() && *g > 0.0);
        self
    }

    pub fn with_volume(mut self, milliliters: Option<f64>) -> Self {
        self.volume_ml = milliliters.filter(|v| v.is_finite() && *v > 0.0);
        self
    }

    pub fn with_priors(mut self, priors: Priors) -> Self {
        self.priors = Some(priors);
        self
    }

    pub fn with_evidence(mut self, tag: impl Into<String>) -> Self {
        self.push_evidence(tag);
        self
    }

    /// Append an evidence tag unless it is already present.
    pub fn push_evidence(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.evidence.contains(&tag) {
            self.evidence.push(tag);
        }
    }

    pub fn kcal_per_g(&self) -> Option<Estimate> {
        self.priors.and_then(|p| p.kcal_per_g)
    }

    pub fn density(&self) -> Option<Estimate> {
        self.priors.and_then(|p| p.density)
    }
}

/// Metadata describing how a result was obtained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    /// Strategies consulted, in the order they were tried.
    pub used: Vec<String>,
    /// True when the winning strategy was not first in the chain.
    pub fallback: bool,
    pub latency_ms: u64,
}

/// Outcome of one analysis. Never empty, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    items: Vec<FoodItem>,
    meta: AnalysisMeta,
}

impl AnalysisResult {
    /// Build a result from strategy output. Returns `None` when `items` is empty.
    pub fn new(items: Vec<FoodItem>, meta: AnalysisMeta) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items, meta })
        }
    }

    /// Re-issue this result with orchestrator-level metadata.
    pub fn with_meta(self, meta: AnalysisMeta) -> Self {
        Self {
            items: self.items,
            meta,
        }
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    /// The first item, which the strategy ranked highest.
    pub fn primary(&self) -> &FoodItem {
        &self.items[0]
    }

    pub fn meta(&self) -> &AnalysisMeta {
        &self.meta
    }
}
