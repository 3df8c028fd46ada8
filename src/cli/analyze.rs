//! Analyze command implementation

use crate::analysis::AnalysisRequest;
use crate::api::{adapt, build_http_client, AnalyzeResponse};
use crate::cli::output::{format_analysis_json, format_analysis_table};
use crate::cli::serve::{load_config_file, shutdown_signal};
use crate::cli::AnalyzeArgs;
use crate::logging::{analysis_span, generate_request_id};
use crate::pipeline::{Orchestrator, StrategyRegistry};
use crate::reconciler::reconcile;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Build an analysis request from a file path or an http(s) URL.
pub async fn load_image(
    image: &str,
    region: Option<String>,
) -> Result<AnalysisRequest, Box<dyn std::error::Error>> {
    if image.starts_with("http://") || image.starts_with("https://") {
        return Ok(AnalysisRequest::from_fields(Some(image), None, region)?);
    }

    let path = Path::new(image);
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Cannot read image {}: {}", path.display(), e))?;
    let mime_type = mime_guess::from_path(path).first_raw();

    Ok(AnalysisRequest::from_bytes(data, mime_type, region)?)
}

/// Run the pipeline once and return the adapted response.
pub async fn run_analyze(
    args: &AnalyzeArgs,
    cancel: &CancellationToken,
) -> Result<AnalyzeResponse, Box<dyn std::error::Error>> {
    let mut config = load_config_file(&args.config)?;
    if let Some(strategy) = args.strategy {
        config.strategies.preferred = Some(strategy.into());
    }
    config.validate()?;

    let request = load_image(&args.image, args.region.clone()).await?;

    let registry = Arc::new(StrategyRegistry::from_config(
        &config,
        build_http_client(&config)?,
    ));
    let orchestrator = Orchestrator::new(registry, config.pipeline.strategy_timeout());

    let request_id = generate_request_id();
    let result = orchestrator
        .run_cancellable(&request, cancel)
        .instrument(analysis_span(&request_id, "cli"))
        .await?;
    let calories = reconcile(result.primary());

    Ok(adapt(&result, &calories, &request_id))
}

/// Handle `morsel analyze` command
///
/// Ctrl-C cancels any in-flight remote call.
pub async fn handle_analyze(args: &AnalyzeArgs) -> Result<String, Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(shutdown_signal(cancel.clone()));

    let outcome = run_analyze(args, &cancel).await;
    watcher.abort();

    let response = outcome?;
    if args.json {
        Ok(format_analysis_json(&response)?)
    } else {
        Ok(format_analysis_table(&response))
    }
}
