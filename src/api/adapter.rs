//! Mapping from pipeline output to the public response contract.

use crate::analysis::{AnalysisResult, FoodItem};
use crate::reconciler::ReconciledCalories;
use serde::{Deserialize, Serialize};

/// Successful `POST /api/analyze-food` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub food_type: String,
    pub confidence: f64,
    pub calories: u32,
    /// Grams, rounded.
    pub weight: u32,
    pub emoji: String,
    pub portion_sizes: Vec<String>,
    pub evidence: Vec<String>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub used: Vec<String>,
    pub latency_ms: u64,
    pub fallback: bool,
    pub calculation_method: String,
    pub warnings: Vec<String>,
    pub request_id: String,
}

struct DisplayEntry {
    keys: &'static [&'static str],
    emoji: &'static str,
    portions: &'static [&'static str],
}

/// Checked in order; the first entry with a key contained in the label wins.
const DISPLAY_TABLE: &[DisplayEntry] = &[
    DisplayEntry {
        keys: &["pizza"],
        emoji: "🍕",
        portions: &["1 slice", "2 slices", "Half pizza"],
    },
    DisplayEntry {
        keys: &["burger", "hamburger"],
        emoji: "🍔",
        portions: &["Single patty", "Double patty", "Slider"],
    },
    DisplayEntry {
        keys: &["salad"],
        emoji: "🥗",
        portions: &["Side salad", "Regular bowl", "Large bowl"],
    },
    DisplayEntry {
        keys: &["ramen", "noodle", "pho", "soup"],
        emoji: "🍜",
        portions: &["Small bowl", "Regular bowl", "Large bowl"],
    },
    DisplayEntry {
        keys: &["sushi", "sashimi", "maki"],
        emoji: "🍣",
        portions: &["4 pieces", "8 pieces", "12 pieces"],
    },
    DisplayEntry {
        keys: &["pasta", "spaghetti", "lasagna"],
        emoji: "🍝",
        portions: &["1 cup", "Regular plate", "Large plate"],
    },
    DisplayEntry {
        keys: &["rice", "curry"],
        emoji: "🍛",
        portions: &["1/2 cup", "1 cup", "2 cups"],
    },
    DisplayEntry {
        keys: &["taco", "burrito"],
        emoji: "🌮",
        portions: &["1 piece", "2 pieces", "3 pieces"],
    },
    DisplayEntry {
        keys: &["sandwich", "sub", "wrap"],
        emoji: "🥪",
        portions: &["Half", "Whole", "Footlong"],
    },
    DisplayEntry {
        keys: &["apple"],
        emoji: "🍎",
        portions: &["Small", "Medium", "Large"],
    },
    DisplayEntry {
        keys: &["banana"],
        emoji: "🍌",
        portions: &["Small", "Medium", "Large"],
    },
    DisplayEntry {
        keys: &["egg", "omelet"],
        emoji: "🍳",
        portions: &["1 egg", "2 eggs", "3 eggs"],
    },
    DisplayEntry {
        keys: &["steak", "beef"],
        emoji: "🥩",
        portions: &["4 oz", "8 oz", "12 oz"],
    },
    DisplayEntry {
        keys: &["chicken"],
        emoji: "🍗",
        portions: &["1 piece", "Breast", "Half chicken"],
    },
    DisplayEntry {
        keys: &["bread", "toast", "bagel"],
        emoji: "🍞",
        portions: &["1 slice", "2 slices", "3 slices"],
    },
    DisplayEntry {
        keys: &["cake", "cupcake"],
        emoji: "🍰",
        portions: &["Small slice", "Regular slice", "Large slice"],
    },
    DisplayEntry {
        keys: &["cookie", "biscuit"],
        emoji: "🍪",
        portions: &["1 cookie", "2 cookies", "3 cookies"],
    },
    DisplayEntry {
        keys: &["milk", "latte", "coffee", "juice", "smoothie"],
        emoji: "🥤",
        portions: &["Small (240 ml)", "Medium (350 ml)", "Large (470 ml)"],
    },
    DisplayEntry {
        keys: &["chips", "crisps", "bar", "snack"],
        emoji: "🍫",
        portions: &["1 serving", "Half pack", "Whole pack"],
    },
];

const DEFAULT_EMOJI: &str = "🍽️";
const DEFAULT_PORTIONS: &[&str] = &["Small", "Medium", "Large"];

/// Emoji and portion suggestions for a label.
///
/// # Examples
///
/// ```
/// use morsel::api::display_for;
///
/// assert_eq!(display_for("Margherita Pizza").0, "🍕");
/// assert_eq!(display_for("mystery stew").0, "🍽️");
/// ```
pub fn display_for(label: &str) -> (&'static str, &'static [&'static str]) {
    let normalized = label.trim().to_lowercase();
    DISPLAY_TABLE
        .iter()
        .find(|entry| entry.keys.iter().any(|k| normalized.contains(k)))
        .map(|entry| (entry.emoji, entry.portions))
        .unwrap_or((DEFAULT_EMOJI, DEFAULT_PORTIONS))
}

/// Best weight figure for display: measured weight, else volume × density.
fn display_weight(item: &FoodItem) -> u32 {
    let grams = item.weight_grams.or_else(|| {
        let volume = item.volume_ml?;
        let density = item.density()?.mu;
        Some(volume * density)
    });
    grams
        .filter(|g| g.is_finite() && *g > 0.0)
        .map(|g| g.round() as u32)
        .unwrap_or(0)
}

/// Item evidence followed by the strategies used, first occurrence kept.
fn merge_evidence(item: &FoodItem, used: &[String]) -> Vec<String> {
    let mut evidence: Vec<String> = Vec::with_capacity(item.evidence.len() + used.len());
    for tag in item.evidence.iter().chain(used.iter()) {
        if !evidence.contains(tag) {
            evidence.push(tag.clone());
        }
    }
    evidence
}

/// Build the public response for the primary item of `result`.
pub fn adapt(
    result: &AnalysisResult,
    calories: &ReconciledCalories,
    request_id: &str,
) -> AnalyzeResponse {
    let item = result.primary();
    let meta = result.meta();
    let (emoji, portions) = display_for(&item.label);

    AnalyzeResponse {
        food_type: item.label.clone(),
        confidence: item.confidence,
        calories: calories.calories,
        weight: display_weight(item),
        emoji: emoji.to_string(),
        portion_sizes: portions.iter().map(|p| p.to_string()).collect(),
        evidence: merge_evidence(item, &meta.used),
        meta: ResponseMeta {
            used: meta.used.clone(),
            latency_ms: meta.latency_ms,
            fallback: meta.fallback,
            calculation_method: calories.method.to_string(),
            warnings: calories.warnings.clone(),
            request_id: request_id.to_string(),
        },
    }
}
