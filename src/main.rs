//! Binary entry point for webgl-effect-orchestrator.
//!
//! Loads an optional TOML config (`--config path` or first positional
//! argument), builds the pipeline, and either serves the HTTP API (feature
//! `web-api`) or runs a set of demo descriptions through the pipeline.
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json` — structured JSON output (overrides config)
//! - `RUST_LOG=info` — log level filter

use std::path::PathBuf;

use tracing::info;
use webgl_effect_orchestrator::config::{loader, EngineConfig};
use webgl_effect_orchestrator::{init_tracing, metrics, EffectPipeline};

#[cfg(not(feature = "web-api"))]
use webgl_effect_orchestrator::{EffectRequest, GenerationOptions, Platform};

/// Pull the config path from `--config <path>` or the first positional arg.
fn config_path_from_args() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().position(|a| a == "--config") {
        Some(i) => args.get(i + 1).map(PathBuf::from),
        None => args.first().filter(|a| !a.starts_with('-')).map(PathBuf::from),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path_from_args() {
        Some(path) => loader::load_from_file(&path)?,
        None => EngineConfig::default(),
    };

    // Config supplies the log format unless the environment already did.
    if std::env::var("LOG_FORMAT").is_err() {
        std::env::set_var("LOG_FORMAT", &config.observability.log_format);
    }
    let _ = init_tracing();

    // Initialize Prometheus metrics before serving any request.
    metrics::init_metrics()?;

    let pipeline = EffectPipeline::from_config(&config)?;
    info!(engine = %config.engine.name, "pipeline constructed");

    #[cfg(feature = "web-api")]
    {
        webgl_effect_orchestrator::web_api::serve(&config.server, pipeline).await?;
    }

    #[cfg(not(feature = "web-api"))]
    {
        run_demo(&pipeline).await?;
    }

    Ok(())
}

/// Push a handful of demo descriptions through the pipeline and log the
/// selection outcomes.
#[cfg(not(feature = "web-api"))]
async fn run_demo(pipeline: &EffectPipeline) -> Result<(), Box<dyn std::error::Error>> {
    let demo_descriptions = [
        "fire explosion with particles",
        "calm water waves with soft glow",
        "morphing shapes over procedural noise",
        "sparks bouncing under gravity",
        "a completely unrelated request",
    ];

    info!(count = demo_descriptions.len(), "running demo requests");

    for (i, description) in demo_descriptions.iter().enumerate() {
        let request = EffectRequest {
            request_id: format!("demo-req-{i:03}"),
            description: description.to_string(),
            context: None,
            platform: Platform::default(),
            options: GenerationOptions::default(),
        };

        let response = pipeline.handle(request).await?;
        let modules: Vec<&str> = response.modules.iter().map(|d| d.module.as_str()).collect();
        info!(
            request_id = %response.request_id,
            modules = ?modules,
            confidence = response.confidence,
            fallback = response.fallback_used,
            source_bytes = response.source.len(),
            "demo request complete"
        );
    }

    info!("demo complete");
    Ok(())
}
