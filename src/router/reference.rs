//! Food-composition reference lookups used for cross-validation.

use crate::strategy::remote::send_json;
use crate::strategy::StrategyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Best reference entry found for a label.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatch {
    pub description: String,
    pub kcal_per_g: f64,
    /// Fraction of the label's words found in `description`, in `[0, 1]`.
    pub score: f64,
}

/// A database mapping food labels to energy density.
#[async_trait]
pub trait CompositionReference: Send + Sync {
    /// Look up `label`. `Ok(None)` means the reference answered but had
    /// nothing usable; transport problems are errors.
    async fn lookup(&self, label: &str) -> Result<Option<ReferenceMatch>, StrategyError>;
}

/// USDA FoodData Central search client.
pub struct UsdaReference {
    endpoint: String,
    api_key: String,
    client: Client,
    call_timeout: Duration,
}

impl UsdaReference {
    pub fn new(endpoint: String, api_key: String, client: Client, call_timeout: Duration) -> Self {
        Self {
            endpoint,
            api_key,
            client,
            call_timeout,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    description: String,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    #[serde(default)]
    nutrient_name: String,
    #[serde(default)]
    unit_name: String,
    #[serde(default)]
    value: Option<f64>,
}

impl SearchFood {
    /// Energy per gram; the search API reports kcal per 100 g.
    fn kcal_per_g(&self) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_name == "Energy" && n.unit_name.eq_ignore_ascii_case("kcal"))
            .and_then(|n| n.value)
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|per_100g| per_100g / 100.0)
    }
}

#[async_trait]
impl CompositionReference for UsdaReference {
    async fn lookup(&self, label: &str) -> Result<Option<ReferenceMatch>, StrategyError> {
        let url = format!("{}/v1/foods/search", self.endpoint);

        let response: SearchResponse = send_json(
            self.client.get(&url).query(&[
                ("query", label),
                ("pageSize", "5"),
                ("dataType", "Foundation,SR Legacy"),
                ("api_key", self.api_key.as_str()),
            ]),
            self.call_timeout,
        )
        .await?;

        let best = response
            .foods
            .into_iter()
            .filter_map(|food| {
                let kcal_per_g = food.kcal_per_g()?;
                Some(ReferenceMatch {
                    score: match_score(label, &food.description),
                    description: food.description,
                    kcal_per_g,
                })
            })
            .max_by(|a, b| a.score.total_cmp(&b.score));

        Ok(best)
    }
}

const STOP_WORDS: &[&str] = &["with", "and", "the", "of", "in", "on"];

fn significant_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Whether two words are equal up to a trailing plural "s" / "es".
fn same_word(a: &str, b: &str) -> bool {
    fn singular(w: &str) -> [&str; 3] {
        [
            w,
            w.strip_suffix('s').unwrap_or(w),
            w.strip_suffix("es").unwrap_or(w),
        ]
    }
    let (a, b) = (singular(a), singular(b));
    a.iter().any(|x| b.contains(x))
}

/// Fraction of the label's significant words that appear in `description`.
pub fn match_score(label: &str, description: &str) -> f64 {
    let wanted = significant_words(label);
    if wanted.is_empty() {
        return 0.0;
    }
    let have = significant_words(description);

    let found = wanted
        .iter()
        .filter(|w| have.iter().any(|h| same_word(w, h)))
        .count();

    found as f64 / wanted.len() as f64
}
