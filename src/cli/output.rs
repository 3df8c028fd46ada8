//! Output formatting helpers for CLI commands

use crate::api::AnalyzeResponse;
use crate::pipeline::StrategyRegistry;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for one fallback chain entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChainEntryView {
    pub position: usize,
    pub id: String,
    pub name: String,
}

impl ChainEntryView {
    pub fn from_registry(registry: &StrategyRegistry) -> Vec<Self> {
        registry
            .strategies()
            .iter()
            .enumerate()
            .map(|(i, s)| Self {
                position: i + 1,
                id: s.id().to_string(),
                name: s.name().to_string(),
            })
            .collect()
    }
}

/// Format the fallback chain and unavailable strategies as tables
pub fn format_chain_table(registry: &StrategyRegistry) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Strategy", "Name", "Status"]);

    for entry in ChainEntryView::from_registry(registry) {
        table.add_row(vec![
            Cell::new(entry.position),
            Cell::new(&entry.id),
            Cell::new(&entry.name),
            Cell::new("Available".green().to_string()),
        ]);
    }
    for unavailable in registry.unavailable() {
        table.add_row(vec![
            Cell::new("-"),
            Cell::new(&unavailable.id),
            Cell::new(&unavailable.reason),
            Cell::new("Unavailable".red().to_string()),
        ]);
    }

    table.to_string()
}

/// Format the fallback chain as JSON
pub fn format_chain_json(registry: &StrategyRegistry) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "chain": ChainEntryView::from_registry(registry),
        "unavailable": registry.unavailable(),
    }))
}

/// Format an analysis response as a key/value table
pub fn format_analysis_table(response: &AnalyzeResponse) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    let method = if response.meta.warnings.is_empty() {
        response.meta.calculation_method.clone()
    } else {
        response.meta.calculation_method.yellow().to_string()
    };
    let used = if response.meta.fallback {
        format!("{} {}", response.meta.used.join(" -> "), "(fallback)".yellow())
    } else {
        response.meta.used.join(" -> ")
    };

    let rows = vec![
        ("Food", format!("{} {}", response.emoji, response.food_type)),
        ("Confidence", format!("{:.0}%", response.confidence * 100.0)),
        ("Calories", format!("{} kcal", response.calories)),
        ("Weight", format!("{} g", response.weight)),
        ("Method", method),
        ("Portions", response.portion_sizes.join(", ")),
        ("Evidence", response.evidence.join(", ")),
        ("Strategies", used),
        ("Latency", format!("{}ms", response.meta.latency_ms)),
    ];
    for (field, value) in rows {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }
    for warning in &response.meta.warnings {
        table.add_row(vec![
            Cell::new("Warning".yellow().to_string()),
            Cell::new(warning),
        ]);
    }

    table.to_string()
}

/// Format an analysis response as JSON
pub fn format_analysis_json(response: &AnalyzeResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}
