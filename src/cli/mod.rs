//! CLI module for Morsel
//!
//! Command-line interface definitions and handlers for the food analysis service.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP service
//! - `analyze` - Analyse one image from a file or URL
//! - `chain` - Show the resolved fallback chain
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! morsel serve
//!
//! # Analyse a photo and print JSON
//! morsel analyze lunch.jpg --json
//!
//! # Generate shell completions
//! morsel completions bash > ~/.bash_completion.d/morsel
//! ```

pub mod analyze;
pub mod chain;
pub mod completions;
pub mod config;
pub mod output;
pub mod serve;

pub use analyze::handle_analyze;
pub use chain::handle_chain;
pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::strategy::StrategyKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Morsel - Food photo analysis
#[derive(Parser, Debug)]
#[command(
    name = "morsel",
    version,
    about = "Food photo analysis: identity, portion and calorie estimation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve(ServeArgs),
    /// Analyse a single image
    Analyze(AnalyzeArgs),
    /// Show the strategy fallback chain
    Chain(ChainArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "morsel.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "MORSEL_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "MORSEL_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MORSEL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Try this strategy first (managed, vision, placeholder)
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file path or http(s) URL
    pub image: String,

    /// Region hint (e.g. "US", "JP")
    #[arg(short, long)]
    pub region: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Try this strategy first (managed, vision, placeholder)
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,

    /// Path to configuration file
    #[arg(short, long, default_value = "morsel.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "morsel.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "morsel.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
