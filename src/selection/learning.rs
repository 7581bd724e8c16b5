//! The two slow-feedback tables the selector reads and nudges on every call.
//!
//! ## Responsibility
//! Own the mutable per-module acceptance thresholds and per-(module, concept)
//! match weights, with their documented defaults and clamp ranges.
//!
//! ## Guarantees
//! - Thresholds stay in `[0.2, 0.8]` and weights in `[0.1, 1.0]` across any
//!   update sequence — the clamp is applied on every write.
//! - Missing entries read as the documented default (0.5) — a recoverable,
//!   expected condition, never an error.
//! - Updates drift slowly (±0.001/+0.002 thresholds, +0.01×confidence
//!   weights) so one request never dominates the tables.
//!
//! ## NOT Responsible For
//! - Locking (the selector serialises access around a whole call)
//! - Deciding *when* to update (the selector drives updates from its final
//!   returned decisions only)

use std::collections::HashMap;

use super::rules::BootstrapWeight;

/// Lower clamp bound for adaptive thresholds.
pub const THRESHOLD_MIN: f64 = 0.2;
/// Upper clamp bound for adaptive thresholds.
pub const THRESHOLD_MAX: f64 = 0.8;
/// Value read for modules with no threshold entry yet.
pub const THRESHOLD_DEFAULT: f64 = 0.5;

/// Lower clamp bound for concept weights.
pub const WEIGHT_MIN: f64 = 0.1;
/// Upper clamp bound for concept weights.
pub const WEIGHT_MAX: f64 = 1.0;
/// Value read for (module, concept) pairs with no weight entry yet.
pub const WEIGHT_DEFAULT: f64 = 0.5;

// ── Adaptive thresholds ──────────────────────────────────────────────────

/// Per-module acceptance bar that drifts with past acceptance outcomes.
///
/// High-confidence selections lower a module's bar slightly (it keeps
/// earning its place); ordinary selections raise it, twice as fast.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveThresholds {
    thresholds: HashMap<String, f64>,
}

impl AdaptiveThresholds {
    /// Create an empty table; every module starts at the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current threshold for a module (default 0.5 when unset).
    pub fn get(&self, module: &str) -> f64 {
        self.thresholds
            .get(module)
            .copied()
            .unwrap_or(THRESHOLD_DEFAULT)
    }

    /// Drift a module's threshold after it was returned from a selection.
    ///
    /// `high_confidence` is "decision confidence > 0.8": true lowers the
    /// bar by 0.001, false raises it by 0.002. The result is clamped to
    /// `[0.2, 0.8]`.
    pub fn adjust(&mut self, module: &str, high_confidence: bool) {
        let delta = if high_confidence { -0.001 } else { 0.002 };
        let current = self.get(module);
        self.thresholds.insert(
            module.to_string(),
            (current + delta).clamp(THRESHOLD_MIN, THRESHOLD_MAX),
        );
    }

    /// Snapshot of all explicit entries (modules still at the default are
    /// absent).
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.thresholds.clone()
    }
}

// ── Concept weights ──────────────────────────────────────────────────────

/// Per-(module, concept) keyword-match weight.
///
/// Multiplies keyword-match evidence during activation accumulation; nudged
/// upward every time a module is returned for a concept, so repeated
/// pairings strengthen over time.
#[derive(Debug, Clone, Default)]
pub struct ConceptWeights {
    weights: HashMap<String, HashMap<String, f64>>,
}

impl ConceptWeights {
    /// Create an empty table; every pair starts at the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table seeded with fixed bootstrap entries.
    ///
    /// Entries are clamped into `[0.1, 1.0]` on insert, so a mistyped
    /// bootstrap value can never escape the invariant.
    pub fn with_bootstrap(entries: &[BootstrapWeight]) -> Self {
        let mut weights: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for entry in entries {
            weights
                .entry(entry.module.clone())
                .or_default()
                .insert(entry.concept.clone(), entry.weight.clamp(WEIGHT_MIN, WEIGHT_MAX));
        }
        Self { weights }
    }

    /// Current weight for a (module, concept) pair (default 0.5 when unset).
    pub fn get(&self, module: &str, concept: &str) -> f64 {
        self.weights
            .get(module)
            .and_then(|m| m.get(concept))
            .copied()
            .unwrap_or(WEIGHT_DEFAULT)
    }

    /// Nudge a pair's weight by `delta`, clamped to `[0.1, 1.0]`.
    pub fn nudge(&mut self, module: &str, concept: &str, delta: f64) {
        let current = self.get(module, concept);
        self.weights
            .entry(module.to_string())
            .or_default()
            .insert(
                concept.to_string(),
                (current + delta).clamp(WEIGHT_MIN, WEIGHT_MAX),
            );
    }

    /// Number of explicit (module, concept) entries.
    pub fn entry_count(&self) -> usize {
        self.weights.values().map(|m| m.len()).sum()
    }
}
