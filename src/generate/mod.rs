//! Per-module JavaScript/WebGL source generation.
//!
//! ## Responsibility
//! Turn a selected module plus the extracted concepts into a source snippet,
//! and register one generator per selectable module. Generators are opaque
//! code-string producers: deterministic string templates whose parameters
//! (palettes, counts, forces) are chosen from the concepts.
//!
//! ## Guarantees
//! - **Deterministic**: same request, same snippet — byte for byte.
//! - **Registry coverage**: `GeneratorRegistry::validate_against` confirms
//!   every rule-table module has a generator, fatal at startup otherwise.
//!
//! ## NOT Responsible For
//! - Deciding which modules run (the selector's job)
//! - Combining snippets into a runnable program (that belongs to `assemble`)

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::concept::Concept;
use crate::selection::RuleTable;
use crate::EffectError;

pub mod assemble;
pub mod fluid;
pub mod lighting;
pub mod morphing;
pub mod particles;
pub mod physics;
pub mod procedural;

pub use assemble::{assemble, ModuleSnippet};
pub use fluid::FluidGenerator;
pub use lighting::LightingGenerator;
pub use morphing::MorphingGenerator;
pub use particles::ParticlesGenerator;
pub use physics::PhysicsGenerator;
pub use procedural::ProceduralGenerator;

// ── Request types ────────────────────────────────────────────────────────

/// Target WebGL platform for generated source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// WebGL 1.0 (`webgl` context, GLSL ES 1.00).
    Webgl1,
    /// WebGL 2.0 (`webgl2` context, GLSL ES 3.00).
    #[default]
    Webgl2,
}

impl Platform {
    /// The `canvas.getContext` argument for this platform.
    pub fn context_name(&self) -> &'static str {
        match self {
            Platform::Webgl1 => "webgl",
            Platform::Webgl2 => "webgl2",
        }
    }
}

/// Output quality tier; scales particle counts, resolutions, and iteration
/// depths in the templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Halved budgets for weak devices.
    Low,
    /// Baseline budgets.
    #[default]
    Medium,
    /// Doubled budgets for showcase output.
    High,
}

impl QualityTier {
    /// Multiplier applied to count-like template parameters.
    pub fn scale(&self) -> f64 {
        match self {
            QualityTier::Low => 0.5,
            QualityTier::Medium => 1.0,
            QualityTier::High => 2.0,
        }
    }
}

/// Generation tuning options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationOptions {
    /// Output quality tier.
    #[serde(default)]
    pub quality: QualityTier,
    /// Baseline particle capacity before quality scaling.
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
}

fn default_max_particles() -> usize {
    2000
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            max_particles: default_max_particles(),
        }
    }
}

/// Everything a generator needs to produce its snippet.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Concepts extracted from the user's description.
    pub concepts: Vec<Concept>,
    /// Target platform.
    pub platform: Platform,
    /// Tuning options.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Confidence of the named concept, or 0.0 when absent.
    pub fn concept_confidence(&self, name: &str) -> f64 {
        self.concepts
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.confidence)
            .unwrap_or(0.0)
    }

    /// True if any concept name contains the given term.
    pub fn mentions(&self, term: &str) -> bool {
        self.concepts.iter().any(|c| c.name.contains(term))
    }
}

// ── Generator trait & registry ───────────────────────────────────────────

/// A per-module source producer.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across tasks.
/// The trait is object-safe to allow dynamic dispatch via
/// `Arc<dyn CodeGenerator>`.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Name of the module this generator serves.
    fn module(&self) -> &str;

    /// Produce the module's JavaScript/WebGL snippet.
    ///
    /// # Errors
    ///
    /// In-process template generators never fail; remote or compiled
    /// implementations may return [`EffectError::Generation`].
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError>;
}

/// Maps module names to their generators.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn CodeGenerator>>,
}

impl GeneratorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering all six built-in modules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ParticlesGenerator));
        registry.register(Arc::new(PhysicsGenerator));
        registry.register(Arc::new(LightingGenerator));
        registry.register(Arc::new(MorphingGenerator));
        registry.register(Arc::new(FluidGenerator));
        registry.register(Arc::new(ProceduralGenerator));
        registry
    }

    /// Register a generator. A later registration for the same module name
    /// replaces the earlier one.
    pub fn register(&mut self, generator: Arc<dyn CodeGenerator>) {
        self.generators
            .retain(|g| g.module() != generator.module());
        self.generators.push(generator);
    }

    /// Look up the generator for a module.
    pub fn get(&self, module: &str) -> Option<Arc<dyn CodeGenerator>> {
        self.generators
            .iter()
            .find(|g| g.module() == module)
            .cloned()
    }

    /// Number of registered generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// True when no generator is registered.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Confirm every module in the rule table has a generator.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::ConfigError`] naming every uncovered module.
    /// Called once at startup; a failure here is fatal.
    pub fn validate_against(&self, table: &RuleTable) -> Result<(), EffectError> {
        let missing: Vec<String> = table
            .rules
            .iter()
            .filter(|r| self.get(&r.name).is_none())
            .map(|r| r.name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EffectError::ConfigError(format!(
                "modules without a code generator: {}",
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.generators.iter().map(|g| g.module()).collect();
        f.debug_struct("GeneratorRegistry")
            .field("modules", &names)
            .finish()
    }
}

// ── Shared template helpers ──────────────────────────────────────────────

/// Pick a colour palette from the dominant concepts.
///
/// Warm for fire-like concepts, blue for water-like, grey for smoke/dust,
/// and a neutral cool palette otherwise.
pub(crate) fn palette_for(request: &GenerationRequest) -> [&'static str; 3] {
    if request.mentions("fire") || request.mentions("explosion") || request.mentions("ember") {
        ["#ff6b26", "#ffc53d", "#7a1f06"]
    } else if request.mentions("water") || request.mentions("fluid") || request.mentions("wave") {
        ["#2e78ff", "#7fd4ff", "#0b2d66"]
    } else if request.mentions("smoke") || request.mentions("dust") {
        ["#9aa0a6", "#d7dade", "#4a4e54"]
    } else {
        ["#8ab4f8", "#e8eaed", "#3c4043"]
    }
}

/// Format a palette as a JavaScript array literal.
pub(crate) fn palette_literal(palette: [&str; 3]) -> String {
    format!("['{}', '{}', '{}']", palette[0], palette[1], palette[2])
}
