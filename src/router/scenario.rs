//! Scenario detection - what kind of food photo is this?

use crate::strategy::StrategyError;
use serde::Deserialize;
use serde_json::Value;

/// The three kinds of food photo the router distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageScenario {
    /// Packaged product with a printed nutrition label.
    Packaged { brand: Option<String> },
    /// Dish from a restaurant or chain; `restaurant` is set when the venue
    /// could be identified.
    Restaurant { restaurant: Option<String> },
    /// Home-prepared or otherwise unbranded food.
    Prepared,
}

impl ImageScenario {
    /// Name used in evidence tags and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ImageScenario::Packaged { .. } => "Packaged",
            ImageScenario::Restaurant { .. } => "Restaurant",
            ImageScenario::Prepared => "Prepared",
        }
    }
}

/// Scenario plus the detector's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioDetection {
    pub scenario: ImageScenario,
    pub confidence: f64,
}

#[derive(Deserialize)]
struct ScenarioReading {
    scenario: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    restaurant: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| {
        !s.is_empty() && !s.eq_ignore_ascii_case("null") && !s.eq_ignore_ascii_case("unknown")
    })
}

impl ScenarioDetection {
    /// Interpret the scenario detector's JSON answer.
    pub fn from_value(value: Value) -> Result<Self, StrategyError> {
        let reading: ScenarioReading = serde_json::from_value(value)
            .map_err(|e| StrategyError::MalformedResponse(format!("scenario: {}", e)))?;

        let scenario = match reading.scenario.trim().to_lowercase().as_str() {
            "packaged" | "packaged_product" | "label" => ImageScenario::Packaged {
                brand: non_blank(reading.brand),
            },
            "restaurant" | "chain" | "restaurant_item" => ImageScenario::Restaurant {
                restaurant: non_blank(reading.restaurant),
            },
            "prepared" | "homemade" | "home" | "home_prepared" => ImageScenario::Prepared,
            other => {
                return Err(StrategyError::MalformedResponse(format!(
                    "unknown scenario '{}'",
                    other
                )))
            }
        };

        let confidence = reading
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(0.5);

        Ok(Self {
            scenario,
            confidence,
        })
    }
}
