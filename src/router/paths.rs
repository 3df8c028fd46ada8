//! Extraction paths: turn one vision-model reading into a [`FoodItem`].
//!
//! Each path trusts a different kind of evidence, and its relative
//! uncertainty says how much.

use super::reference::ReferenceMatch;
use crate::analysis::{Estimate, FoodItem, Priors};
use crate::strategy::StrategyError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Printed nutrition label.
pub const LABEL_UNCERTAINTY: f64 = 0.05;
/// Restaurant-published nutrition data.
pub const MENU_UNCERTAINTY: f64 = 0.10;
/// Portion judged from the photo alone.
pub const VISUAL_UNCERTAINTY: f64 = 0.25;
/// Used for density and kcal/g when the model gives no sigma.
pub const DEFAULT_PRIOR_UNCERTAINTY: f64 = 0.30;
/// Upper bound on kcal/g sigma after a confident reference match.
pub const REFERENCE_UNCERTAINTY: f64 = 0.10;

pub const LABEL_EVIDENCE: &str = "Label";
pub const MENU_EVIDENCE: &str = "Menu";
pub const GEOMETRY_EVIDENCE: &str = "Geometry";
pub const VISUAL_PORTION_EVIDENCE: &str = "Visual-portion";
pub const REFERENCE_EVIDENCE: &str = "USDA-validated";

fn parse<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, StrategyError> {
    serde_json::from_value(value)
        .map_err(|e| StrategyError::MalformedResponse(format!("{}: {}", path, e)))
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn confidence_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|c| c.is_finite()).unwrap_or(fallback)
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

#[derive(Deserialize)]
struct LabelReading {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    serving_size_grams: Option<f64>,
    #[serde(default)]
    calories_per_serving: Option<f64>,
    #[serde(default)]
    servings: Option<f64>,
    #[serde(default)]
    total_calories: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Packaged product: read the nutrition label.
///
/// Prefers a printed total, then calories-per-serving times servings, then a
/// single serving. A label with no calorie figure at all is
/// [`StrategyError::EmptyResult`].
pub fn label_item(
    value: Value,
    brand: Option<&str>,
    scenario_confidence: f64,
) -> Result<FoodItem, StrategyError> {
    let reading: LabelReading = parse("label", value)?;

    let per_serving = positive(reading.calories_per_serving);
    let servings = positive(reading.servings);
    let serving_grams = positive(reading.serving_size_grams);

    let (calories, weight) = match (positive(reading.total_calories), per_serving, servings) {
        (Some(total), _, Some(n)) => (total, serving_grams.map(|g| g * n)),
        // Servings not printed: infer them from the per-serving figure, or
        // take the total as covering one printed serving.
        (Some(total), Some(cps), None) => {
            let servings = (total / cps).max(1.0);
            (total, serving_grams.map(|g| g * servings))
        }
        (Some(total), None, None) => (total, serving_grams),
        (None, Some(cps), Some(n)) => (cps * n, serving_grams.map(|g| g * n)),
        (None, Some(cps), None) => (cps, serving_grams),
        (None, None, _) => return Err(StrategyError::EmptyResult),
    };

    let label = text(reading.product_name)
        .or_else(|| brand.map(str::to_string))
        .unwrap_or_else(|| "packaged food".to_string());

    let mut item = FoodItem::new(label, confidence_or(reading.confidence, scenario_confidence))
        .with_calories(calories, LABEL_UNCERTAINTY)
        .with_weight(weight)
        .with_evidence(LABEL_EVIDENCE);

    if let Some(kcal_per_g) = per_serving
        .zip(serving_grams)
        .and_then(|(cps, g)| Estimate::relative(cps / g, LABEL_UNCERTAINTY))
    {
        item = item.with_priors(Priors {
            kcal_per_g: Some(kcal_per_g),
            density: None,
        });
    }

    Ok(item)
}

#[derive(Deserialize)]
struct MenuReading {
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    serving_grams: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Restaurant dish with a known venue: use its published nutrition data.
pub fn menu_item(
    value: Value,
    restaurant: &str,
    scenario_confidence: f64,
) -> Result<FoodItem, StrategyError> {
    let reading: MenuReading = parse("menu", value)?;
    let calories = positive(reading.calories).ok_or(StrategyError::EmptyResult)?;

    let label = text(reading.item).unwrap_or_else(|| format!("{} dish", restaurant));
    let weight = positive(reading.serving_grams);

    let mut item = FoodItem::new(label, confidence_or(reading.confidence, scenario_confidence))
        .with_calories(calories, MENU_UNCERTAINTY)
        .with_weight(weight)
        .with_evidence(MENU_EVIDENCE);

    if let Some(kcal_per_g) = weight.and_then(|g| Estimate::relative(calories / g, MENU_UNCERTAINTY))
    {
        item = item.with_priors(Priors {
            kcal_per_g: Some(kcal_per_g),
            density: None,
        });
    }

    Ok(item)
}

#[derive(Deserialize)]
struct GeometryReading {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    density_g_per_ml: Option<f64>,
    #[serde(default)]
    density_sigma: Option<f64>,
    #[serde(default)]
    kcal_per_g: Option<f64>,
    #[serde(default)]
    kcal_per_g_sigma: Option<f64>,
    #[serde(default)]
    visual_portion: Option<VisualPortion>,
}

#[derive(Deserialize)]
struct VisualPortion {
    #[serde(default)]
    volume_ml: Option<f64>,
    #[serde(default)]
    weight_grams: Option<f64>,
    #[serde(default)]
    calories: Option<f64>,
}

fn prior(mu: Option<f64>, sigma: Option<f64>) -> Option<Estimate> {
    let mu = positive(mu)?;
    match sigma.filter(|s| s.is_finite() && *s >= 0.0) {
        Some(sigma) => Estimate::new(mu, sigma),
        None => Estimate::relative(mu, DEFAULT_PRIOR_UNCERTAINTY),
    }
}

/// Prepared food, or a restaurant dish whose venue is unknown: classify and
/// attach physical priors.
///
/// A visual portion contributes whatever it has: weight and volume as
/// evidence, calories at [`VISUAL_UNCERTAINTY`]. Without one only the priors
/// are emitted and the calorie figure is left for a depth-aware measurement.
pub fn geometry_item(value: Value, scenario_confidence: f64) -> Result<FoodItem, StrategyError> {
    let reading: GeometryReading = parse("geometry", value)?;

    let label = text(reading.label)
        .or_else(|| text(reading.category))
        .ok_or(StrategyError::EmptyResult)?;

    let priors = Priors {
        kcal_per_g: prior(reading.kcal_per_g, reading.kcal_per_g_sigma),
        density: prior(reading.density_g_per_ml, reading.density_sigma),
    };

    let mut item = FoodItem::new(label, confidence_or(reading.confidence, scenario_confidence))
        .with_priors(priors)
        .with_evidence(GEOMETRY_EVIDENCE);

    if let Some(portion) = reading.visual_portion {
        item = item
            .with_weight(portion.weight_grams)
            .with_volume(portion.volume_ml);
        let calories = positive(portion.calories);
        if let Some(calories) = calories {
            item = item.with_calories(calories, VISUAL_UNCERTAINTY);
        }
        if calories.is_some() || item.weight_grams.is_some() || item.volume_ml.is_some() {
            item.push_evidence(VISUAL_PORTION_EVIDENCE);
        }
    }

    Ok(item)
}

/// Replace the item's kcal/g with the reference value and tighten its sigma.
/// Label, path and calories are left alone.
pub fn apply_reference(item: &mut FoodItem, found: &ReferenceMatch) {
    let mut priors = item.priors.unwrap_or_default();
    let tightened = priors
        .kcal_per_g
        .map(|old| old.sigma)
        .unwrap_or(f64::INFINITY)
        .min(found.kcal_per_g * REFERENCE_UNCERTAINTY);

    if let Some(estimate) = Estimate::new(found.kcal_per_g, tightened) {
        priors.kcal_per_g = Some(estimate);
        item.priors = Some(priors);
        item.push_evidence(REFERENCE_EVIDENCE);
    }
}
