//! # webgl-effect-orchestrator
//!
//! A web backend that turns a natural-language description of a visual effect
//! ("fire explosion with particles") into generated JavaScript/WebGL source,
//! plus metadata about which effect modules were combined and why.
//!
//! ## Architecture
//!
//! Four-stage request flow, each stage a direct call inside the request
//! handler:
//! ```text
//! EffectRequest → Extract → Select → Generate(×module) → Assemble → EffectResponse
//! ```
//!
//! The heart of the crate is [`selection::ModuleSelector`]: a deterministic
//! scoring pipeline that decides which effect modules (particles, physics,
//! lighting, morphing, fluid, procedural) to combine for a given concept set,
//! ranks them, prunes by a complexity budget, and slowly adapts its
//! per-module acceptance thresholds and concept weights from its own output.

// ── Lint policy (aerospace-grade) ─────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod concept;
pub mod config;
pub mod generate;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod selection;
pub mod templates;

#[cfg(feature = "web-api")]
pub mod web_api;

// Re-exports for convenience
pub use concept::{Concept, ConceptExtractor, KeywordExtractor};
pub use generate::{GenerationOptions, Platform, QualityTier};
pub use pipeline::EffectPipeline;
pub use selection::{DecisionContext, ModuleDecision, ModuleSelector, PerformanceRequirement};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for production log aggregators
/// - anything else (including unset) — human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`EffectError::Other`] if the global subscriber has already been
/// set (e.g. by a previous call or a test harness).
///
/// # Panics
///
/// This function never panics.
pub fn init_tracing() -> Result<(), EffectError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| EffectError::Other(format!("tracing init failed: {e}")))
}

/// Top-level errors for the effect-generation pipeline.
///
/// Every error surface in the crate is mapped to a variant here. All variants
/// implement `std::error::Error` via [`thiserror`].
#[derive(Error, Debug)]
pub enum EffectError {
    /// A configuration value is missing, malformed, or semantically invalid.
    ///
    /// Returned at construction/startup time so misconfiguration surfaces
    /// immediately rather than at the first request.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Concept extraction failed for the given description.
    #[error("concept extraction failed: {0}")]
    ConceptExtraction(String),

    /// A module code generator failed to produce source.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A selected module has no registered code generator.
    ///
    /// This indicates a rule-table/registry mismatch that validation should
    /// have caught at startup.
    #[error("no generator registered for module: {0}")]
    UnknownModule(String),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}

/// A request to generate an effect from a free-text description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRequest {
    /// Unique identifier for this request, used for trace correlation.
    pub request_id: String,
    /// The raw user-supplied effect description.
    pub description: String,
    /// Optional decision context forwarded to the module selector.
    #[serde(default)]
    pub context: Option<DecisionContext>,
    /// Target platform for the generated source.
    #[serde(default)]
    pub platform: Platform,
    /// Generation tuning options.
    #[serde(default)]
    pub options: GenerationOptions,
}

/// The generated effect plus the selection metadata that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectResponse {
    /// Request ID propagated from the originating [`EffectRequest`].
    pub request_id: String,
    /// The assembled, runnable JavaScript/WebGL source.
    pub source: String,
    /// The module decisions that shaped the source, in ranked order.
    pub modules: Vec<ModuleDecision>,
    /// Mean confidence across the selected modules.
    pub confidence: f64,
    /// Sum of per-module performance impacts (relative cost units).
    pub performance_estimate: f64,
    /// True when the selector returned nothing and the pipeline fell back
    /// to its default module.
    pub fallback_used: bool,
    /// Names of stored templates whose description overlaps this request.
    pub related_templates: Vec<String>,
    /// RFC 3339 timestamp of when the source was generated.
    pub generated_at: String,
}
