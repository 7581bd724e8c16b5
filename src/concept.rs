//! Concept extraction from free-text effect descriptions.
//!
//! ## Responsibility
//! Turn a user description ("fire explosion with particles") into a list of
//! weighted, typed [`Concept`]s the selector can score against. One
//! production implementation ([`KeywordExtractor`]) scans the rule-table
//! vocabulary; [`StaticExtractor`] returns a fixed list for tests and demos.
//!
//! ## Guarantees
//! - Confidences are normalised to `[0, 1]` before the concepts leave this
//!   module.
//! - Extraction is deterministic: the same description always yields the
//!   same concepts in the same order.
//!
//! ## NOT Responsible For
//! - Scoring (the selector's job)
//! - Deciding what to do when nothing is extracted (the pipeline's job)

use serde::{Deserialize, Serialize};

use crate::selection::RuleTable;
use crate::EffectError;

/// A weighted, typed token extracted from an effect description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Canonical concept name (lowercase vocabulary term).
    pub name: String,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Concept category (e.g. "element", "motion", "appearance").
    pub kind: String,
}

/// Producer of concepts from a free-text description.
///
/// Implementations must be thread-safe (`Send + Sync`) so one instance can
/// serve concurrent requests.
pub trait ConceptExtractor: Send + Sync {
    /// Extract weighted concepts from `description`.
    ///
    /// # Errors
    ///
    /// Implementations backed by external services may fail; the in-process
    /// implementations in this crate never do.
    fn extract(&self, description: &str) -> Result<Vec<Concept>, EffectError>;
}

// ── Vocabulary-scan extractor ────────────────────────────────────────────

/// One recognisable term with its category and extraction confidence.
#[derive(Debug, Clone)]
struct VocabTerm {
    term: String,
    kind: String,
    confidence: f64,
}

/// Confidence for terms that appear in a module's activation table.
const ACTIVATION_TERM_CONFIDENCE: f64 = 0.9;
/// Confidence for plain keyword terms.
const KEYWORD_TERM_CONFIDENCE: f64 = 0.7;

/// Deterministic vocabulary-scan extractor over the rule table's terms.
///
/// Terms that appear in a module's activation table are more specific than
/// plain keywords and extract with higher confidence. Duplicate hits keep
/// the highest confidence.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    vocabulary: Vec<VocabTerm>,
}

/// Concept category for a module's vocabulary.
fn kind_for_module(module: &str) -> &'static str {
    match module {
        "particles" | "fluid" => "element",
        "physics" | "morphing" => "motion",
        "lighting" => "appearance",
        "procedural" => "texture",
        _ => "element",
    }
}

impl KeywordExtractor {
    /// Build an extractor from a rule table's keyword and activation
    /// vocabulary.
    pub fn from_table(table: &RuleTable) -> Self {
        let mut vocabulary: Vec<VocabTerm> = Vec::new();
        for rule in &table.rules {
            let kind = kind_for_module(&rule.name);
            for term in rule.activations.keys() {
                vocabulary.push(VocabTerm {
                    term: term.to_lowercase(),
                    kind: kind.to_string(),
                    confidence: ACTIVATION_TERM_CONFIDENCE,
                });
            }
            for keyword in &rule.keywords {
                vocabulary.push(VocabTerm {
                    term: keyword.to_lowercase(),
                    kind: kind.to_string(),
                    confidence: KEYWORD_TERM_CONFIDENCE,
                });
            }
        }
        // Stable order independent of rule-table hash iteration: by term,
        // strongest first so dedup keeps the activation-level confidence.
        vocabulary.sort_by(|a, b| {
            a.term
                .cmp(&b.term)
                .then(b.confidence.total_cmp(&a.confidence))
        });
        vocabulary.dedup_by(|a, b| a.term == b.term);
        Self { vocabulary }
    }

    /// Build an extractor over the built-in default table.
    pub fn with_defaults() -> Self {
        Self::from_table(&RuleTable::default())
    }
}

impl ConceptExtractor for KeywordExtractor {
    fn extract(&self, description: &str) -> Result<Vec<Concept>, EffectError> {
        let lower = description.to_lowercase();
        let mut concepts: Vec<Concept> = self
            .vocabulary
            .iter()
            .filter(|v| lower.contains(v.term.as_str()))
            .map(|v| Concept {
                name: v.term.clone(),
                confidence: v.confidence.clamp(0.0, 1.0),
                kind: v.kind.clone(),
            })
            .collect();
        // Strongest evidence first; name as the deterministic tiebreak.
        concepts.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(concepts)
    }
}

// ── Fixed-output extractor (tests, demos) ────────────────────────────────

/// Extractor that ignores its input and returns a fixed concept list.
///
/// The concept-extraction analogue of an echo worker: useful for pipeline
/// tests without vocabulary dependencies.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    concepts: Vec<Concept>,
}

impl StaticExtractor {
    /// Create an extractor that always returns `concepts`.
    pub fn new(concepts: Vec<Concept>) -> Self {
        Self { concepts }
    }
}

impl ConceptExtractor for StaticExtractor {
    fn extract(&self, _description: &str) -> Result<Vec<Concept>, EffectError> {
        Ok(self.concepts.clone())
    }
}
