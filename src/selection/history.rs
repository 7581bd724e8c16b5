//! Bounded record of past decision batches.
//!
//! Consumed only by metrics and introspection endpoints; the selector never
//! reads it back when scoring. Trim policy is block-trim, not per-entry
//! FIFO: the buffer grows to 1000 batches, then drops the oldest half in
//! one step.

use std::collections::VecDeque;

use super::selector::ModuleDecision;

/// Hard cap on stored batches.
pub const HISTORY_CAP: usize = 1000;
/// Batch count retained after a trim.
pub const HISTORY_TRIM_TO: usize = 500;

/// Append-only ring of decision batches (one batch per selection call).
#[derive(Debug, Clone, Default)]
pub struct DecisionHistory {
    batches: VecDeque<Vec<ModuleDecision>>,
}

impl DecisionHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch; when the cap is exceeded, drop the oldest batches
    /// so that exactly [`HISTORY_TRIM_TO`] remain.
    pub fn push(&mut self, batch: Vec<ModuleDecision>) {
        self.batches.push_back(batch);
        if self.batches.len() > HISTORY_CAP {
            let excess = self.batches.len() - HISTORY_TRIM_TO;
            self.batches.drain(..excess);
        }
    }

    /// Number of stored batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True when no batch has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The most recent `n` batches, oldest first. Fewer are returned if
    /// fewer exist.
    pub fn recent(&self, n: usize) -> Vec<Vec<ModuleDecision>> {
        let start = self.batches.len().saturating_sub(n);
        self.batches.iter().skip(start).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_batch(module: &str) -> Vec<ModuleDecision> {
        vec![ModuleDecision {
            module: module.to_string(),
            confidence: 0.9,
            priority: 100,
            reasoning: Vec::new(),
            performance_impact: 1.0,
            complexity_score: 2.0,
            synergy_boost: 0.0,
        }]
    }

    #[test]
    fn test_push_and_len() {
        let mut history = DecisionHistory::new();
        assert!(history.is_empty());
        history.push(make_batch("particles"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_no_trim_at_exactly_cap() {
        let mut history = DecisionHistory::new();
        for _ in 0..HISTORY_CAP {
            history.push(make_batch("particles"));
        }
        assert_eq!(history.len(), HISTORY_CAP);
    }

    #[test]
    fn test_trim_to_half_when_cap_exceeded() {
        let mut history = DecisionHistory::new();
        for _ in 0..(HISTORY_CAP + 1) {
            history.push(make_batch("particles"));
        }
        // One over the cap triggers a block trim, not a single eviction.
        assert_eq!(history.len(), HISTORY_TRIM_TO);
    }

    #[test]
    fn test_trim_keeps_most_recent_batches() {
        let mut history = DecisionHistory::new();
        for i in 0..=HISTORY_CAP {
            history.push(make_batch(&format!("module-{i}")));
        }
        let recent = history.recent(1);
        assert_eq!(recent[0][0].module, format!("module-{HISTORY_CAP}"));
    }

    #[test]
    fn test_recent_returns_fewer_when_short() {
        let mut history = DecisionHistory::new();
        history.push(make_batch("particles"));
        let recent = history.recent(10);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_empty_batches_are_stored() {
        // An empty selection outcome is still a recorded batch.
        let mut history = DecisionHistory::new();
        history.push(Vec::new());
        assert_eq!(history.len(), 1);
    }
}
