//! Request pipeline: extract → select → generate → assemble.
//!
//! Each stage runs as a direct call inside the request handler (the
//! selection core is synchronous and fast; generation is async for the sake
//! of remote generator implementations). Every stage records its latency
//! and outcome to metrics fire-and-forget.
//!
//! ## Span Fields (every stage)
//!
//! | Field | Description |
//! |-------|-------------|
//! | `request_id` | Unique ID for trace correlation |
//! | `stage` | Stage name string |
//! | `duration_ms` | Recorded after processing completes |
//! | `outcome` | `"ok"` or `"err"` |
//!
//! ## Sensitive Fields — NEVER Logged
//!
//! - Effect descriptions (`request.description`)
//! - Generated source text

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::concept::{Concept, ConceptExtractor, KeywordExtractor};
use crate::config::{validation, EngineConfig};
use crate::generate::{assemble, GenerationRequest, GeneratorRegistry, ModuleSnippet};
use crate::metrics;
use crate::retry::RetryPolicy;
use crate::selection::{ModuleDecision, ModuleSelector};
use crate::templates::TemplateStore;
use crate::{EffectError, EffectRequest, EffectResponse};

/// The end-to-end effect-generation pipeline.
///
/// Construct once per process via [`EffectPipeline::from_config`] and share
/// across request handlers (`Clone` is cheap; all clones share the selector
/// state).
#[derive(Clone)]
pub struct EffectPipeline {
    extractor: Arc<dyn ConceptExtractor>,
    selector: ModuleSelector,
    generators: GeneratorRegistry,
    templates: TemplateStore,
    retry: RetryPolicy,
    default_module: String,
}

impl EffectPipeline {
    /// Build a pipeline from a config with custom collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::ConfigError`] when the config fails semantic
    /// validation or a rule-table module has no generator. Both are fatal
    /// at startup.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(
        config: &EngineConfig,
        extractor: Arc<dyn ConceptExtractor>,
        generators: GeneratorRegistry,
    ) -> Result<Self, EffectError> {
        validation::validate(config).map_err(|errors| {
            EffectError::ConfigError(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        })?;
        generators.validate_against(&config.selection)?;

        let retry = RetryPolicy::exponential(
            config.resilience.retry_attempts,
            std::time::Duration::from_millis(config.resilience.retry_base_ms),
        );

        Ok(Self {
            extractor,
            selector: ModuleSelector::new(config.selection.clone()),
            generators,
            templates: TemplateStore::with_defaults(),
            retry,
            default_module: config.engine.default_module.clone(),
        })
    }

    /// Build a pipeline from a config with the built-in extractor and
    /// generators.
    ///
    /// # Errors
    ///
    /// See [`EffectPipeline::new`].
    pub fn from_config(config: &EngineConfig) -> Result<Self, EffectError> {
        Self::new(
            config,
            Arc::new(KeywordExtractor::from_table(&config.selection)),
            GeneratorRegistry::with_defaults(),
        )
    }

    /// Build a pipeline entirely from built-in defaults.
    ///
    /// # Errors
    ///
    /// See [`EffectPipeline::new`].
    pub fn with_defaults() -> Result<Self, EffectError> {
        Self::from_config(&EngineConfig::default())
    }

    /// The shared module selector (for introspection endpoints and tests).
    pub fn selector(&self) -> &ModuleSelector {
        &self.selector
    }

    /// Process one effect request end to end.
    ///
    /// When selection returns no decisions the pipeline generates the
    /// configured default module instead and marks the response
    /// `fallback_used` — the selector itself never falls back.
    ///
    /// # Errors
    ///
    /// - [`EffectError::ConceptExtraction`] when the extractor fails.
    /// - [`EffectError::Generation`] when a generator exhausts its retries.
    /// - [`EffectError::UnknownModule`] when a selected module has no
    ///   generator (a startup-validation escape, should not happen).
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub async fn handle(&self, request: EffectRequest) -> Result<EffectResponse, EffectError> {
        let request_id = if request.request_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            request.request_id.clone()
        };

        // ── Stage: extract ───────────────────────────────────────────
        let started = Instant::now();
        metrics::inc_request("extract");
        let concepts = match self.extractor.extract(&request.description) {
            Ok(concepts) => concepts,
            Err(e) => {
                metrics::inc_error("extract", "extraction");
                warn!(request_id = %request_id, stage = "extract", outcome = "err", "concept extraction failed");
                return Err(EffectError::ConceptExtraction(e.to_string()));
            }
        };
        metrics::record_stage_latency("extract", started.elapsed());
        info!(
            request_id = %request_id,
            stage = "extract",
            duration_ms = started.elapsed().as_millis() as u64,
            outcome = "ok",
            concept_count = concepts.len(),
            "stage complete"
        );

        // ── Stage: select ────────────────────────────────────────────
        let started = Instant::now();
        metrics::inc_request("select");
        let mut decisions = self
            .selector
            .select_modules(&concepts, request.context.as_ref());
        let fallback_used = decisions.is_empty();
        if fallback_used {
            metrics::inc_fallback();
            decisions = vec![self.fallback_decision(&concepts)];
        }
        metrics::record_stage_latency("select", started.elapsed());
        info!(
            request_id = %request_id,
            stage = "select",
            duration_ms = started.elapsed().as_millis() as u64,
            outcome = "ok",
            module_count = decisions.len(),
            fallback = fallback_used,
            "stage complete"
        );

        // ── Stage: generate ──────────────────────────────────────────
        let started = Instant::now();
        metrics::inc_request("generate");
        let generation_request = GenerationRequest {
            concepts: concepts.clone(),
            platform: request.platform,
            options: request.options.clone(),
        };
        let mut snippets: Vec<ModuleSnippet> = Vec::with_capacity(decisions.len());
        for decision in &decisions {
            let generator = self
                .generators
                .get(&decision.module)
                .ok_or_else(|| EffectError::UnknownModule(decision.module.clone()))?;
            let source = self
                .retry
                .retry(|| generator.generate(&generation_request))
                .await
                .map_err(|e| {
                    metrics::inc_error("generate", "generation");
                    EffectError::Generation(format!("{}: {e}", decision.module))
                })?;
            snippets.push(ModuleSnippet {
                module: decision.module.clone(),
                source,
            });
        }
        metrics::record_stage_latency("generate", started.elapsed());
        info!(
            request_id = %request_id,
            stage = "generate",
            duration_ms = started.elapsed().as_millis() as u64,
            outcome = "ok",
            "stage complete"
        );

        // ── Stage: assemble ──────────────────────────────────────────
        let started = Instant::now();
        metrics::inc_request("assemble");
        let source = assemble(&snippets, request.platform);
        let confidence = if decisions.is_empty() {
            0.0
        } else {
            decisions.iter().map(|d| d.confidence).sum::<f64>() / decisions.len() as f64
        };
        let performance_estimate = decisions.iter().map(|d| d.performance_impact).sum();
        let concept_names: Vec<String> = concepts.iter().map(|c| c.name.clone()).collect();
        let related_templates = self.templates.names_matching(&concept_names);
        metrics::record_stage_latency("assemble", started.elapsed());
        info!(
            request_id = %request_id,
            stage = "assemble",
            duration_ms = started.elapsed().as_millis() as u64,
            outcome = "ok",
            source_bytes = source.len(),
            "stage complete"
        );

        Ok(EffectResponse {
            request_id,
            source,
            modules: decisions,
            confidence,
            performance_estimate,
            fallback_used,
            related_templates,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Synthesize the decision record for the default-module fallback.
    fn fallback_decision(&self, concepts: &[Concept]) -> ModuleDecision {
        let table = self.selector.table();
        let (base_confidence, complexity, performance_cost) = table
            .rule(&self.default_module)
            .map(|r| (r.base_confidence, r.complexity, r.performance_cost))
            .unwrap_or((0.5, 0.0, 0.0));
        ModuleDecision {
            module: self.default_module.clone(),
            confidence: base_confidence.min(0.98),
            priority: table.base_priority(&self.default_module).floor() as i64,
            reasoning: vec!["fallback: no module cleared selection".to_string()],
            performance_impact: performance_cost * (concepts.len() as f64 / 5.0).min(2.0),
            complexity_score: complexity,
            synergy_boost: 0.0,
        }
    }
}

impl std::fmt::Debug for EffectPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectPipeline")
            .field("default_module", &self.default_module)
            .field("generators", &self.generators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::StaticExtractor;
    use crate::generate::{GenerationOptions, Platform};

    struct FailingExtractor;

    impl ConceptExtractor for FailingExtractor {
        fn extract(&self, _description: &str) -> Result<Vec<Concept>, EffectError> {
            Err(EffectError::Other("upstream NLP unavailable".to_string()))
        }
    }

    fn request(description: &str) -> EffectRequest {
        EffectRequest {
            request_id: "req-test".to_string(),
            description: description.to_string(),
            context: None,
            platform: Platform::default(),
            options: GenerationOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_fire_description_produces_particle_source() {
        let pipeline = EffectPipeline::with_defaults().unwrap();
        let response = pipeline
            .handle(request("fire explosion with particles"))
            .await
            .unwrap();

        assert!(!response.fallback_used);
        assert!(response.modules.iter().any(|d| d.module == "particles"));
        assert!(response.source.contains("registerEffectModule('particles'"));
        assert!(response.source.contains("EffectPlayer"));
        assert_eq!(response.request_id, "req-test");
    }

    #[tokio::test]
    async fn test_unrecognised_description_falls_back_to_default_module() {
        let pipeline = EffectPipeline::with_defaults().unwrap();
        let response = pipeline
            .handle(request("quarterly revenue dashboard"))
            .await
            .unwrap();

        assert!(response.fallback_used);
        assert_eq!(response.modules.len(), 1);
        assert_eq!(response.modules[0].module, "particles");
        assert!(response.source.contains("registerEffectModule('particles'"));
    }

    #[tokio::test]
    async fn test_extractor_failure_maps_to_concept_extraction_error() {
        let config = EngineConfig::default();
        let pipeline = EffectPipeline::new(
            &config,
            Arc::new(FailingExtractor),
            GeneratorRegistry::with_defaults(),
        )
        .unwrap();

        let result = pipeline.handle(request("fire")).await;
        assert!(matches!(result, Err(EffectError::ConceptExtraction(_))));
    }

    #[tokio::test]
    async fn test_empty_request_id_is_filled() {
        let pipeline = EffectPipeline::with_defaults().unwrap();
        let mut req = request("glowing sparks");
        req.request_id = String::new();
        let response = pipeline.handle(req).await.unwrap();
        assert!(!response.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_response_metadata_is_bounded() {
        let pipeline = EffectPipeline::with_defaults().unwrap();
        let response = pipeline
            .handle(request("fire and gravity with glow"))
            .await
            .unwrap();

        assert!((0.0..=0.98).contains(&response.confidence));
        assert!(response.performance_estimate >= 0.0);
        assert!(response.modules.len() <= 4);
    }

    #[tokio::test]
    async fn test_related_templates_surface_matching_presets() {
        let pipeline = EffectPipeline::with_defaults().unwrap();
        let response = pipeline
            .handle(request("a huge fire explosion"))
            .await
            .unwrap();
        assert!(response
            .related_templates
            .iter()
            .any(|name| name == "fire-burst"));
    }

    #[tokio::test]
    async fn test_static_extractor_drives_selection() {
        let config = EngineConfig::default();
        let fixed = vec![Concept {
            name: "water".to_string(),
            confidence: 0.9,
            kind: "element".to_string(),
        }];
        let pipeline = EffectPipeline::new(
            &config,
            Arc::new(StaticExtractor::new(fixed)),
            GeneratorRegistry::with_defaults(),
        )
        .unwrap();

        let response = pipeline.handle(request("anything")).await.unwrap();
        assert!(response.modules.iter().any(|d| d.module == "fluid"));
        assert!(response.source.contains("class FluidSurface"));
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.engine.default_module = "plasma".to_string();
        let result = EffectPipeline::from_config(&config);
        assert!(matches!(result, Err(EffectError::ConfigError(_))));
    }
}
