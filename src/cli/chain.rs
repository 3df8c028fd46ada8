//! Chain command implementation

use crate::api::build_http_client;
use crate::cli::output::{format_chain_json, format_chain_table};
use crate::cli::serve::load_config_file;
use crate::cli::ChainArgs;
use crate::pipeline::StrategyRegistry;

/// Handle `morsel chain` command
///
/// Builds the registry exactly as `serve` would and reports the resulting
/// order plus any strategies left out, without calling any remote service.
pub fn handle_chain(args: &ChainArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_file(&args.config)?;
    let registry = StrategyRegistry::from_config(&config, build_http_client(&config)?);

    if args.json {
        Ok(format_chain_json(&registry)?)
    } else {
        Ok(format_chain_table(&registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chain_json_lists_unavailable_strategies() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("morsel.toml");
        std::fs::write(
            &config,
            "[strategies]\norder = [\"vision\"]\n\n[strategies.vision]\nendpoint = \"not a url\"\napi_key = \"k\"\n",
        )
        .unwrap();

        let output = handle_chain(&ChainArgs { json: true, config }).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["chain"][0]["id"], "placeholder");
        assert_eq!(parsed["unavailable"][0]["id"], "vision");
    }

    #[test]
    fn test_chain_table_with_vision_configured() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("morsel.toml");
        std::fs::write(
            &config,
            "[strategies]\norder = [\"vision\"]\n\n[strategies.vision]\nendpoint = \"https://vision.test\"\napi_key = \"k\"\n",
        )
        .unwrap();

        let output = handle_chain(&ChainArgs { json: false, config }).unwrap();
        assert!(output.contains("vision"));
        assert!(output.contains("placeholder"));
    }
}
