//! Module-selection subsystem: the decision-scoring core of the crate.
//!
//! Static rules and synergy data live in [`rules`], the slow-feedback tables
//! in [`learning`], the bounded batch record in [`history`], and the scoring
//! engine itself in [`selector`].

pub mod history;
pub mod learning;
pub mod rules;
pub mod selector;

// Re-exports
pub use history::DecisionHistory;
pub use learning::{AdaptiveThresholds, ConceptWeights};
pub use rules::{BootstrapWeight, ModuleRule, RuleTable, SynergyEdge, SynergyMatrix};
pub use selector::{
    DecisionContext, ModuleDecision, ModuleSelector, PerformanceRequirement, MAX_DECISIONS,
};
