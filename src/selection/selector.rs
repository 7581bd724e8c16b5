//! # Stage: Module Selection
//!
//! ## Responsibility
//!
//! Decide which effect modules to combine for a given concept set: accumulate
//! activation evidence per module, apply contextual boosts, gate on the
//! per-module adaptive threshold, credit synergy between co-selected modules,
//! rank, prune by the caller's complexity budget, and return at most four
//! decisions. After returning, nudge the feedback tables and append the batch
//! to the decision history.
//!
//! ## Guarantees
//!
//! - **Thread-safe**: mutable state protected by `Arc<Mutex<_>>`, held for
//!   the duration of one call — reads see a consistent snapshot and
//!   read-modify-write updates are serialised.
//! - **Deterministic**: identical inputs against identical table state
//!   produce identical output, same order and values. No randomness anywhere
//!   in this module.
//! - **Ordered**: rules are evaluated in table declaration order; synergy
//!   credit only looks backward at modules already accepted earlier in the
//!   same call.
//! - **Total**: never panics and never errors for well-typed input. Empty
//!   concepts yield an empty decision list.
//!
//! ## NOT Responsible For
//!
//! - Concept extraction (upstream collaborator)
//! - Code generation and fallback-module policy (the pipeline's job)
//! - Rule-table validation (done once at startup by `config::validation`)

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::concept::Concept;
use crate::metrics;

use super::history::DecisionHistory;
use super::learning::{AdaptiveThresholds, ConceptWeights};
use super::rules::RuleTable;

/// Maximum number of decisions one call may return.
pub const MAX_DECISIONS: usize = 4;

/// Upper cap on any reported confidence.
pub const CONFIDENCE_CAP: f64 = 0.98;

/// Clamp bound on the synergy boost (symmetric).
pub const SYNERGY_CLAMP: f64 = 0.3;

// ── Context & decision types ─────────────────────────────────────────────

/// Caller-stated performance requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceRequirement {
    /// Frame budget is generous.
    Low,
    /// Typical interactive target.
    #[default]
    Medium,
    /// Tight frame budget; prefer cheap-per-frame modules.
    High,
}

/// Optional caller context that shapes a selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Free-text statement of what the caller is trying to achieve.
    #[serde(default)]
    pub user_intent: String,
    /// Performance requirement for the generated effect.
    #[serde(default)]
    pub performance_requirement: PerformanceRequirement,
    /// Ceiling on the summed complexity of selected modules.
    #[serde(default)]
    pub complexity_budget: Option<f64>,
    /// Platform constraint hints (currently informational).
    #[serde(default)]
    pub platform_constraints: Vec<String>,
    /// Modules the caller already used; repeats are mildly penalised.
    #[serde(default)]
    pub previous_choices: Vec<String>,
}

/// One selected module with the evidence that selected it.
///
/// Created fresh per call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecision {
    /// Module name from the rule table.
    pub module: String,
    /// Final confidence, in `[0, 0.98]`.
    pub confidence: f64,
    /// Ranking priority (higher sorts first).
    pub priority: i64,
    /// Human-readable evidence strings, in accumulation order.
    pub reasoning: Vec<String>,
    /// Estimated relative performance cost, scaled by concept count.
    pub performance_impact: f64,
    /// The module's complexity cost (copied from its rule).
    pub complexity_score: f64,
    /// Net synergy adjustment applied to confidence, in `[-0.3, 0.3]`.
    pub synergy_boost: f64,
}

/// Mutable selector state, locked once per call.
#[derive(Debug)]
struct SelectorState {
    thresholds: AdaptiveThresholds,
    weights: ConceptWeights,
    history: DecisionHistory,
}

/// The module-selection engine.
///
/// Holds the static rule table plus the two feedback tables and the decision
/// history. Construct one per process and share it (`Clone` is cheap,
/// `Arc`-based; all clones share state).
#[derive(Debug, Clone)]
pub struct ModuleSelector {
    table: Arc<RuleTable>,
    state: Arc<Mutex<SelectorState>>,
}

impl ModuleSelector {
    /// Create a selector over an already-validated rule table.
    ///
    /// The concept-weight table is seeded from the table's bootstrap
    /// entries; thresholds start at their default.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(table: RuleTable) -> Self {
        let weights = ConceptWeights::with_bootstrap(&table.bootstrap_weights);
        Self {
            table: Arc::new(table),
            state: Arc::new(Mutex::new(SelectorState {
                thresholds: AdaptiveThresholds::new(),
                weights,
                history: DecisionHistory::new(),
            })),
        }
    }

    /// Create a selector over the built-in default table.
    pub fn with_defaults() -> Self {
        Self::new(RuleTable::default())
    }

    /// The rule table this selector scores against.
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Select and rank effect modules for the given concepts.
    ///
    /// Side effects: nudges the feedback tables from the *returned*
    /// decisions and appends the batch to the decision history, all within
    /// the same lock scope as the scoring pass.
    ///
    /// Returns an empty list when no concept matches anything or no module
    /// clears its threshold — a valid outcome, not an error.
    ///
    /// # Panics
    ///
    /// This function never panics. A poisoned state lock degrades to an
    /// empty decision list.
    pub fn select_modules(
        &self,
        concepts: &[Concept],
        context: Option<&DecisionContext>,
    ) -> Vec<ModuleDecision> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("selector state lock poisoned; returning no decisions");
                return Vec::new();
            }
        };

        let candidates = self.evaluate_rules(concepts, context, &state);
        let ranked = rank(candidates);
        let selected = self.choose(ranked, context, &state);

        if selected.is_empty() {
            metrics::inc_empty_selection();
        }
        for decision in &selected {
            metrics::inc_module_decision(&decision.module);
            debug!(
                module = %decision.module,
                confidence = decision.confidence,
                priority = decision.priority,
                synergy_boost = decision.synergy_boost,
                "module selected"
            );
        }

        apply_feedback(&mut state, &selected, concepts);
        state.history.push(selected.clone());

        selected
    }

    /// Current adaptive threshold for a module.
    pub fn threshold(&self, module: &str) -> f64 {
        match self.state.lock() {
            Ok(guard) => guard.thresholds.get(module),
            Err(_) => super::learning::THRESHOLD_DEFAULT,
        }
    }

    /// Current concept weight for a (module, concept) pair.
    pub fn concept_weight(&self, module: &str, concept: &str) -> f64 {
        match self.state.lock() {
            Ok(guard) => guard.weights.get(module, concept),
            Err(_) => super::learning::WEIGHT_DEFAULT,
        }
    }

    /// Number of decision batches recorded so far.
    pub fn history_len(&self) -> usize {
        self.state.lock().map(|g| g.history.len()).unwrap_or(0)
    }

    // ── Scoring pass ─────────────────────────────────────────────────────

    /// Evaluate every rule in table order, emitting a decision for each
    /// module that clears the acceptance gate.
    fn evaluate_rules(
        &self,
        concepts: &[Concept],
        context: Option<&DecisionContext>,
        state: &SelectorState,
    ) -> Vec<ModuleDecision> {
        let concept_count = concepts.len();
        let mut accepted: Vec<ModuleDecision> = Vec::new();

        for rule in &self.table.rules {
            let mut activation = 0.0_f64;
            let mut match_count = 0_usize;
            let mut reasoning: Vec<String> = Vec::new();

            for concept in concepts {
                let lower = concept.name.to_lowercase();

                if let Some(strength) = rule.activations.get(&lower) {
                    activation += strength * concept.confidence;
                    reasoning.push(format!(
                        "concept '{}' activates {} at strength {:.2}",
                        concept.name, rule.name, strength
                    ));
                }

                let matched: Vec<&str> = rule
                    .keywords
                    .iter()
                    .filter(|k| lower.contains(k.as_str()))
                    .map(|k| k.as_str())
                    .collect();
                if !matched.is_empty() {
                    let weight = state.weights.get(&rule.name, &concept.name);
                    activation += concept.confidence * matched.len() as f64 * weight;
                    match_count += matched.len();
                    reasoning.push(format!(
                        "keywords [{}] matched concept '{}' (weight {:.2})",
                        matched.join(", "),
                        concept.name,
                        weight
                    ));
                }
            }

            let boost = self.contextual_boost(&rule.name, context);

            let performance_impact =
                rule.performance_cost * (concept_count as f64 / 5.0).min(2.0);

            // Acceptance gate: evidence from both channels, then the
            // adaptive threshold.
            if activation <= 0.0 || match_count == 0 {
                continue;
            }
            let base_confidence = (rule.base_confidence
                + (activation / concept_count.max(1) as f64) * 0.4)
                .min(CONFIDENCE_CAP);
            let final_confidence = base_confidence * boost;
            if final_confidence <= state.thresholds.get(&rule.name) {
                continue;
            }

            // Synergy looks backward only: modules accepted earlier in this
            // call influence later ones, not vice versa.
            let mut synergy = 0.0_f64;
            for prior in &accepted {
                if let Some(strength) = self.table.synergies.strength(&rule.name, &prior.module) {
                    synergy += strength * 0.1;
                }
                if rule.anti_synergies.contains(&prior.module) {
                    synergy -= 0.15;
                }
            }
            let synergy = synergy.clamp(-SYNERGY_CLAMP, SYNERGY_CLAMP);

            let priority = (self.table.base_priority(&rule.name)
                + final_confidence * 100.0
                + (match_count as f64 * 20.0).min(100.0)
                - rule.complexity * 10.0)
                .floor() as i64;

            accepted.push(ModuleDecision {
                module: rule.name.clone(),
                confidence: (final_confidence + synergy).clamp(0.0, CONFIDENCE_CAP),
                priority,
                reasoning,
                performance_impact,
                complexity_score: rule.complexity,
                synergy_boost: synergy,
            });
        }

        accepted
    }

    /// Multiplicative confidence adjustment from the caller's context.
    fn contextual_boost(&self, module: &str, context: Option<&DecisionContext>) -> f64 {
        let Some(ctx) = context else {
            return 1.0;
        };

        let mut boost = 1.0_f64;
        if ctx.performance_requirement == PerformanceRequirement::High
            && self.table.is_high_performance(module)
        {
            boost *= 1.2;
        }
        if let Some(budget) = ctx.complexity_budget {
            if budget < 5.0 {
                boost *= (1.0 - self.table.complexity_penalty(module)).max(0.5);
            }
        }
        if ctx.previous_choices.iter().any(|p| p == module) {
            boost *= 0.8;
        }
        boost
    }

    /// Budget-constrained pick with the intentional fallthrough: when the
    /// greedy pass selects nothing, fall back to the unbudgeted
    /// threshold-filtered ranking. A budget of zero with passing modules
    /// therefore still returns them.
    fn choose(
        &self,
        ranked: Vec<ModuleDecision>,
        context: Option<&DecisionContext>,
        state: &SelectorState,
    ) -> Vec<ModuleDecision> {
        if let Some(budget) = context.and_then(|c| c.complexity_budget) {
            let mut total = 0.0_f64;
            let mut picked: Vec<ModuleDecision> = Vec::new();
            for decision in &ranked {
                if total + decision.complexity_score <= budget {
                    total += decision.complexity_score;
                    picked.push(decision.clone());
                }
            }
            if !picked.is_empty() {
                picked.truncate(MAX_DECISIONS);
                return picked;
            }
        }

        ranked
            .iter()
            .filter(|d| d.confidence > state.thresholds.get(&d.module))
            .take(MAX_DECISIONS)
            .cloned()
            .collect()
    }
}

/// Ranking score: priority dominates, confidence and synergy break ties.
fn ranking_score(decision: &ModuleDecision) -> f64 {
    decision.priority as f64 + decision.confidence * 100.0 + decision.synergy_boost * 50.0
}

/// Sort decisions by descending ranking score (stable, deterministic).
fn rank(mut decisions: Vec<ModuleDecision>) -> Vec<ModuleDecision> {
    decisions.sort_by(|a, b| ranking_score(b).total_cmp(&ranking_score(a)));
    decisions
}

/// Nudge both feedback tables from the final returned decisions.
fn apply_feedback(state: &mut SelectorState, selected: &[ModuleDecision], concepts: &[Concept]) {
    for decision in selected {
        for concept in concepts {
            state
                .weights
                .nudge(&decision.module, &concept.name, 0.01 * concept.confidence);
        }
        state
            .thresholds
            .adjust(&decision.module, decision.confidence > 0.8);
    }
}
