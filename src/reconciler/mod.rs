//! Calorie reconciliation.
//!
//! Turns whatever a strategy produced into one validated integer calorie
//! figure, independent of which strategy won. A direct estimate is trusted
//! only when it passes the sanity checks below; otherwise the figure is
//! recomputed from physical evidence (weight, volume, density, kcal/g).

use crate::analysis::FoodItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest plausible calorie figure for a recognised food.
pub const MIN_CALORIES: f64 = 1.0;
/// Largest plausible calorie figure for a single photographed portion.
pub const MAX_CALORIES: f64 = 5000.0;
/// A direct figure more than this many times the evidence estimate is rejected.
pub const MAX_EVIDENCE_RATIO: f64 = 3.0;
/// Energy density assumed for the ratio check when the item carries weight or
/// volume but no kcal/g prior.
pub const DEFAULT_KCAL_PER_G: f64 = 5.0;

/// How the final calorie figure was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
    #[serde(rename = "strategy-provided")]
    StrategyProvided,
    #[serde(rename = "weight×kcalPerG")]
    WeightTimesKcalPerG,
    #[serde(rename = "volume×density×kcalPerG")]
    VolumeTimesDensityTimesKcalPerG,
    #[serde(rename = "awaiting-depth-sensor")]
    AwaitingDepthSensor,
}

impl CalculationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::StrategyProvided => "strategy-provided",
            CalculationMethod::WeightTimesKcalPerG => "weight×kcalPerG",
            CalculationMethod::VolumeTimesDensityTimesKcalPerG => "volume×density×kcalPerG",
            CalculationMethod::AwaitingDepthSensor => "awaiting-depth-sensor",
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final calorie figure for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledCalories {
    pub calories: u32,
    pub method: CalculationMethod,
    /// At most one note, present when a direct estimate was rejected.
    pub warnings: Vec<String>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Calories implied by the item's physical evidence, if any.
fn recompute(item: &FoodItem) -> Option<(f64, CalculationMethod)> {
    let kcal_per_g = positive(item.kcal_per_g().map(|e| e.mu))?;

    if let Some(weight) = positive(item.weight_grams) {
        return Some((weight * kcal_per_g, CalculationMethod::WeightTimesKcalPerG));
    }

    let volume = positive(item.volume_ml)?;
    let density = positive(item.density().map(|e| e.mu))?;
    Some((
        volume * density * kcal_per_g,
        CalculationMethod::VolumeTimesDensityTimesKcalPerG,
    ))
}

/// Evidence-based estimate used for the relative ceiling.
///
/// Falls back to [`DEFAULT_KCAL_PER_G`] when a weight (or a volume with a
/// density) is known but the energy density is not.
fn evidence_estimate(item: &FoodItem) -> Option<f64> {
    let kcal_per_g = positive(item.kcal_per_g().map(|e| e.mu)).unwrap_or(DEFAULT_KCAL_PER_G);

    if let Some(weight) = positive(item.weight_grams) {
        return Some(weight * kcal_per_g);
    }
    let volume = positive(item.volume_ml)?;
    let density = positive(item.density().map(|e| e.mu))?;
    Some(volume * density * kcal_per_g)
}

/// Why a direct figure was rejected, if it was.
fn validate_direct(calories: f64, item: &FoodItem) -> Option<String> {
    if !calories.is_finite() || calories < MIN_CALORIES {
        return Some(format!(
            "Strategy estimate of {} kcal is below the {} kcal minimum",
            calories, MIN_CALORIES
        ));
    }
    if calories > MAX_CALORIES {
        return Some(format!(
            "Strategy estimate of {} kcal exceeds the {} kcal ceiling",
            calories, MAX_CALORIES
        ));
    }
    if let Some(expected) = evidence_estimate(item) {
        if calories > MAX_EVIDENCE_RATIO * expected {
            return Some(format!(
                "Strategy estimate of {} kcal is more than {}x the {:.0} kcal implied by portion evidence",
                calories, MAX_EVIDENCE_RATIO, expected
            ));
        }
    }
    None
}

/// Produce the validated calorie figure for `item`.
///
/// Never fails: a rejected direct estimate falls through to recalculation and
/// leaves a warning, and an item with no usable evidence is reported as
/// [`CalculationMethod::AwaitingDepthSensor`] with zero calories.
pub fn reconcile(item: &FoodItem) -> ReconciledCalories {
    let mut rejection = None;

    if let Some(direct) = item.calories {
        match validate_direct(direct, item) {
            None => {
                return ReconciledCalories {
                    calories: direct.round() as u32,
                    method: CalculationMethod::StrategyProvided,
                    warnings: Vec::new(),
                };
            }
            Some(reason) => {
                tracing::debug!(
                    label = %item.label,
                    reason = %reason,
                    "Direct calorie estimate rejected"
                );
                rejection = Some(reason);
            }
        }
    }

    let (calories, method) =
        recompute(item).unwrap_or((0.0, CalculationMethod::AwaitingDepthSensor));

    let warnings = rejection
        .map(|reason| vec![format!("{}; recalculated using {}", reason, method)])
        .unwrap_or_default();

    metrics::counter!("morsel_calorie_recalculations_total", "method" => method.as_str())
        .increment(1);

    ReconciledCalories {
        calories: calories.round() as u32,
        method,
        warnings,
    }
}
