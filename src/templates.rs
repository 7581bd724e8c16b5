//! Static in-memory effect template catalogue.
//!
//! A fixed list of named, tagged effect presets with case-insensitive
//! substring search. The pipeline uses matches purely as related-work hints
//! in the response; templates never influence selection or generation.

use serde::{Deserialize, Serialize};

/// One stored effect preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectTemplate {
    /// Unique template name.
    pub name: String,
    /// Short human description.
    pub description: String,
    /// Free-form search tags.
    pub tags: Vec<String>,
    /// Modules this preset combines.
    pub modules: Vec<String>,
}

/// In-memory template catalogue with substring search.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<EffectTemplate>,
}

fn template(name: &str, description: &str, tags: &[&str], modules: &[&str]) -> EffectTemplate {
    EffectTemplate {
        name: name.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        modules: modules.iter().map(|m| m.to_string()).collect(),
    }
}

impl TemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in preset catalogue.
    pub fn with_defaults() -> Self {
        Self {
            templates: vec![
                template(
                    "fire-burst",
                    "Explosive fire burst with ember particles and glow",
                    &["fire", "explosion", "ember", "burst"],
                    &["particles", "lighting"],
                ),
                template(
                    "ocean-waves",
                    "Rolling water waves with splash physics",
                    &["water", "wave", "splash", "ocean"],
                    &["fluid", "physics"],
                ),
                template(
                    "smoke-plume",
                    "Rising smoke plume with soft shadows",
                    &["smoke", "dust", "plume"],
                    &["particles", "lighting"],
                ),
                template(
                    "shape-shift",
                    "Smooth morph between a sphere and a cube",
                    &["morph", "transform", "blend"],
                    &["morphing"],
                ),
                template(
                    "noise-terrain",
                    "Procedural fractal noise terrain flyover",
                    &["noise", "fractal", "terrain", "procedural"],
                    &["procedural"],
                ),
                template(
                    "gravity-rain",
                    "Falling particles under gravity with floor bounces",
                    &["gravity", "collision", "bounce", "rain"],
                    &["particles", "physics"],
                ),
            ],
        }
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when the store holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Case-insensitive substring search over name, description, and tags.
    pub fn search(&self, query: &str) -> Vec<&EffectTemplate> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.templates
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
                    || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Template names matching any of the given terms, deduplicated, in
    /// catalogue order.
    pub fn names_matching(&self, terms: &[String]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for t in &self.templates {
            let hit = terms.iter().any(|term| {
                let needle = term.to_lowercase();
                !needle.is_empty()
                    && (t.name.to_lowercase().contains(&needle)
                        || t.description.to_lowercase().contains(&needle)
                        || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle)))
            });
            if hit && !names.contains(&t.name) {
                names.push(t.name.clone());
            }
        }
        names
    }
}
