//! Static selection configuration: module rules, synergy matrix, and the
//! fixed priority/penalty tables.
//!
//! ## Responsibility
//! Define the data the [`super::ModuleSelector`] scores against. Everything
//! here is loaded once at startup (from the built-in defaults or a TOML
//! file) and never mutated afterwards.
//!
//! ## Guarantees
//! - Rule iteration order is the declaration order of the table — a
//!   specified property the synergy computation depends on, so rules live in
//!   a `Vec`, never a hash map.
//! - Synergy strength lookup is symmetric by construction: edges are
//!   undirected and lookup normalises pair order.
//!
//! ## NOT Responsible For
//! - Semantic validation (that belongs to `config::validation`)
//! - Scoring (that belongs to `selector`)

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Default value functions ──────────────────────────────────────────────

/// Default base priority for modules absent from the priority table.
pub const DEFAULT_BASE_PRIORITY: f64 = 50.0;

/// Default complexity penalty for modules absent from the penalty table.
pub const DEFAULT_COMPLEXITY_PENALTY: f64 = 0.1;

fn default_base_confidence() -> f64 {
    0.5
}

// ── Module rule ──────────────────────────────────────────────────────────

/// Static per-module selection rule.
///
/// One entry per candidate effect module. Defined at startup, never mutated.
/// The `synergies` and `anti_synergies` lists must be disjoint — enforced by
/// `config::validation` before a table is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ModuleRule {
    /// Module name (e.g. "particles"). Unique within a table.
    pub name: String,
    /// Keywords matched by case-insensitive substring containment against
    /// concept names.
    pub keywords: Vec<String>,
    /// Starting confidence before activation evidence is applied (0.0–1.0).
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
    /// Relative complexity cost, consumed by the caller's complexity budget.
    pub complexity: f64,
    /// Relative per-frame performance cost.
    pub performance_cost: f64,
    /// Modules this one combines well with.
    #[serde(default)]
    pub synergies: Vec<String>,
    /// Modules this one degrades when combined with.
    #[serde(default)]
    pub anti_synergies: Vec<String>,
    /// Sparse concept → activation-strength table (keys lowercase, values
    /// 0.0–1.0). A hit contributes `strength × concept confidence` to the
    /// module's activation score.
    #[serde(default)]
    pub activations: HashMap<String, f64>,
}

// ── Synergy matrix ───────────────────────────────────────────────────────

/// One undirected weighted edge between two module names.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SynergyEdge {
    /// First endpoint module name.
    pub a: String,
    /// Second endpoint module name.
    pub b: String,
    /// Pairwise synergy strength (0.0–1.0).
    pub strength: f64,
}

/// Symmetric weighted graph over module names.
///
/// Stored as undirected edges; [`SynergyMatrix::strength`] checks both
/// orientations, so `strength(a, b) == strength(b, a)` holds structurally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(transparent)]
pub struct SynergyMatrix {
    /// The undirected edge list.
    pub edges: Vec<SynergyEdge>,
}

impl SynergyMatrix {
    /// Return the synergy strength between two modules, or `None` if no
    /// edge exists.
    pub fn strength(&self, a: &str, b: &str) -> Option<f64> {
        self.edges
            .iter()
            .find(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
            .map(|e| e.strength)
    }
}

// ── Bootstrap weights ────────────────────────────────────────────────────

/// A fixed seed entry for the concept-weight table.
///
/// Missing (module, concept) pairs read as 0.5 at selection time; these
/// entries shift a handful of well-known pairings off that default.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BootstrapWeight {
    /// Module name.
    pub module: String,
    /// Concept name (lowercase).
    pub concept: String,
    /// Starting weight (0.1–1.0).
    pub weight: f64,
}

// ── Rule table ───────────────────────────────────────────────────────────

/// The complete static selection configuration.
///
/// Rules are evaluated in `rules` order on every call — earlier entries can
/// grant synergy credit to later ones, not vice versa.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RuleTable {
    /// Modules boosted ×1.2 when the caller demands high performance
    /// (cheap-per-frame modules). Serialized before the table-valued
    /// fields below so the TOML form stays valid.
    #[serde(default)]
    pub high_performance_modules: Vec<String>,
    /// Ordered module rules.
    pub rules: Vec<ModuleRule>,
    /// Pairwise synergy strengths.
    #[serde(default)]
    pub synergies: SynergyMatrix,
    /// Per-module base priority; modules absent here use
    /// [`DEFAULT_BASE_PRIORITY`].
    #[serde(default)]
    pub base_priority: HashMap<String, f64>,
    /// Per-module complexity penalty applied under tight budgets; modules
    /// absent here use [`DEFAULT_COMPLEXITY_PENALTY`].
    #[serde(default)]
    pub complexity_penalty: HashMap<String, f64>,
    /// Deterministic seed entries for the concept-weight table.
    #[serde(default)]
    pub bootstrap_weights: Vec<BootstrapWeight>,
}

impl RuleTable {
    /// Base priority for a module, with the documented default for unknown
    /// names.
    pub fn base_priority(&self, module: &str) -> f64 {
        self.base_priority
            .get(module)
            .copied()
            .unwrap_or(DEFAULT_BASE_PRIORITY)
    }

    /// Complexity penalty for a module, with the documented default for
    /// unknown names.
    pub fn complexity_penalty(&self, module: &str) -> f64 {
        self.complexity_penalty
            .get(module)
            .copied()
            .unwrap_or(DEFAULT_COMPLEXITY_PENALTY)
    }

    /// True if the module gets the high-performance contextual boost.
    pub fn is_high_performance(&self, module: &str) -> bool {
        self.high_performance_modules.iter().any(|m| m == module)
    }

    /// Look up a rule by module name.
    pub fn rule(&self, module: &str) -> Option<&ModuleRule> {
        self.rules.iter().find(|r| r.name == module)
    }

    /// All module names, in table order.
    pub fn module_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }
}

fn rule(
    name: &str,
    keywords: &[&str],
    base_confidence: f64,
    complexity: f64,
    performance_cost: f64,
    synergies: &[&str],
    anti_synergies: &[&str],
    activations: &[(&str, f64)],
) -> ModuleRule {
    ModuleRule {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        base_confidence,
        complexity,
        performance_cost,
        synergies: synergies.iter().map(|s| s.to_string()).collect(),
        anti_synergies: anti_synergies.iter().map(|s| s.to_string()).collect(),
        activations: activations
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
    }
}

impl Default for RuleTable {
    /// The built-in six-module table.
    ///
    /// Evaluation order: particles, physics, lighting, morphing, fluid,
    /// procedural.
    fn default() -> Self {
        let rules = vec![
            rule(
                "particles",
                &[
                    "particle", "fire", "explosion", "spark", "smoke", "dust", "burst", "ember",
                ],
                0.85,
                3.0,
                2.0,
                &["physics", "lighting"],
                &[],
                &[
                    ("explosion", 0.95),
                    ("fire", 0.9),
                    ("spark", 0.85),
                    ("smoke", 0.8),
                    ("burst", 0.75),
                ],
            ),
            rule(
                "physics",
                &["physics", "gravity", "collision", "force", "bounce", "velocity"],
                0.8,
                4.0,
                2.5,
                &["particles", "fluid"],
                &[],
                &[("gravity", 0.9), ("collision", 0.85), ("force", 0.8)],
            ),
            rule(
                "lighting",
                &["light", "glow", "shadow", "illumination", "shine", "bloom"],
                0.75,
                2.0,
                1.5,
                &["particles", "morphing"],
                &[],
                &[("glow", 0.9), ("light", 0.85), ("shadow", 0.8)],
            ),
            rule(
                "morphing",
                &["morph", "transform", "shape", "blend", "transition"],
                0.7,
                3.5,
                2.0,
                &["lighting"],
                &["fluid"],
                &[("morph", 0.95), ("transform", 0.85)],
            ),
            rule(
                "fluid",
                &["fluid", "water", "liquid", "wave", "splash", "flow"],
                0.8,
                4.5,
                3.0,
                &["physics"],
                &["morphing"],
                &[
                    ("water", 0.95),
                    ("fluid", 0.9),
                    ("wave", 0.85),
                    ("splash", 0.8),
                ],
            ),
            rule(
                "procedural",
                &["procedural", "noise", "pattern", "fractal", "terrain"],
                0.65,
                2.5,
                1.0,
                &[],
                &[],
                &[("noise", 0.9), ("fractal", 0.85), ("pattern", 0.8)],
            ),
        ];

        let synergies = SynergyMatrix {
            edges: vec![
                SynergyEdge {
                    a: "particles".to_string(),
                    b: "physics".to_string(),
                    strength: 0.8,
                },
                SynergyEdge {
                    a: "particles".to_string(),
                    b: "lighting".to_string(),
                    strength: 0.7,
                },
                SynergyEdge {
                    a: "physics".to_string(),
                    b: "fluid".to_string(),
                    strength: 0.75,
                },
                SynergyEdge {
                    a: "lighting".to_string(),
                    b: "morphing".to_string(),
                    strength: 0.6,
                },
            ],
        };

        let base_priority = [
            ("particles", 100.0),
            ("physics", 90.0),
            ("lighting", 80.0),
            ("morphing", 70.0),
            ("fluid", 85.0),
            ("procedural", 60.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let complexity_penalty = [
            ("particles", 0.1),
            ("physics", 0.3),
            ("lighting", 0.2),
            ("morphing", 0.15),
            ("fluid", 0.35),
            ("procedural", 0.2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let bootstrap_weights = vec![
            BootstrapWeight {
                module: "particles".to_string(),
                concept: "fire".to_string(),
                weight: 0.62,
            },
            BootstrapWeight {
                module: "particles".to_string(),
                concept: "explosion".to_string(),
                weight: 0.68,
            },
            BootstrapWeight {
                module: "physics".to_string(),
                concept: "gravity".to_string(),
                weight: 0.64,
            },
            BootstrapWeight {
                module: "lighting".to_string(),
                concept: "glow".to_string(),
                weight: 0.58,
            },
            BootstrapWeight {
                module: "fluid".to_string(),
                concept: "water".to_string(),
                weight: 0.6,
            },
        ];

        Self {
            high_performance_modules: vec!["morphing".to_string(), "procedural".to_string()],
            rules,
            synergies,
            base_priority,
            complexity_penalty,
            bootstrap_weights,
        }
    }
}
