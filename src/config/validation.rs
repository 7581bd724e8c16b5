//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`EngineConfig`] that cannot be
//! expressed through the type system alone: range checks, cross-field
//! invariants, and referential integrity of the rule table. Violations are
//! fatal at startup — there is no per-call recovery from a bad table.
//!
//! ## Guarantees
//! - Every validation rule has at least one test that triggers it
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value
//!
//! ## NOT Responsible For
//! - Parsing TOML (that belongs to `loader`)
//! - File I/O (that belongs to `loader`)

use super::EngineConfig;

/// Errors arising from configuration parsing, validation, or I/O.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "selection.rules[0].complexity").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn invalid(field: impl ToString, value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Validate all semantic constraints on an [`EngineConfig`].
///
/// Collects every violation before returning so the caller sees the full
/// scope of issues at once.
///
/// # Errors
///
/// `Err(Vec<ConfigError>)` with every violation found.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &EngineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let table = &config.selection;
    let known: Vec<&str> = table.rules.iter().map(|r| r.name.as_str()).collect();

    // ── Rule table ───────────────────────────────────────────────────
    if table.rules.is_empty() {
        errors.push(invalid("selection.rules", "[]", "at least one module rule is required"));
    }

    for (i, rule) in table.rules.iter().enumerate() {
        let path = format!("selection.rules[{i}]");

        if known.iter().filter(|n| **n == rule.name).count() > 1 {
            errors.push(invalid(
                format!("{path}.name"),
                &rule.name,
                "duplicate module name",
            ));
        }
        if !(0.0..=1.0).contains(&rule.base_confidence) {
            errors.push(invalid(
                format!("{path}.base_confidence"),
                rule.base_confidence,
                "must be between 0.0 and 1.0",
            ));
        }
        if rule.complexity < 0.0 {
            errors.push(invalid(
                format!("{path}.complexity"),
                rule.complexity,
                "must be non-negative",
            ));
        }
        if rule.performance_cost < 0.0 {
            errors.push(invalid(
                format!("{path}.performance_cost"),
                rule.performance_cost,
                "must be non-negative",
            ));
        }
        for (concept, strength) in &rule.activations {
            if !(0.0..=1.0).contains(strength) {
                errors.push(invalid(
                    format!("{path}.activations.{concept}"),
                    strength,
                    "must be between 0.0 and 1.0",
                ));
            }
        }

        // Synergy and anti-synergy sets must be disjoint and well-formed.
        for synergy in &rule.synergies {
            if rule.anti_synergies.contains(synergy) {
                errors.push(invalid(
                    format!("{path}.synergies"),
                    synergy,
                    "listed in both synergies and anti_synergies",
                ));
            }
            if !known.contains(&synergy.as_str()) {
                errors.push(invalid(
                    format!("{path}.synergies"),
                    synergy,
                    "references unknown module",
                ));
            }
        }
        for anti in &rule.anti_synergies {
            if !known.contains(&anti.as_str()) {
                errors.push(invalid(
                    format!("{path}.anti_synergies"),
                    anti,
                    "references unknown module",
                ));
            }
        }
    }

    // ── Synergy matrix ───────────────────────────────────────────────
    for (i, edge) in table.synergies.edges.iter().enumerate() {
        let path = format!("selection.synergies[{i}]");
        if edge.a == edge.b {
            errors.push(invalid(&path, &edge.a, "self-referencing synergy edge"));
        }
        for endpoint in [&edge.a, &edge.b] {
            if !known.contains(&endpoint.as_str()) {
                errors.push(invalid(&path, endpoint, "references unknown module"));
            }
        }
        if !(0.0..=1.0).contains(&edge.strength) {
            errors.push(invalid(
                format!("{path}.strength"),
                edge.strength,
                "must be between 0.0 and 1.0",
            ));
        }
        let duplicates = table.synergies.edges[..i].iter().any(|other| {
            (other.a == edge.a && other.b == edge.b) || (other.a == edge.b && other.b == edge.a)
        });
        if duplicates {
            errors.push(invalid(
                &path,
                format!("{}-{}", edge.a, edge.b),
                "duplicate synergy edge",
            ));
        }
    }

    // ── Auxiliary tables ─────────────────────────────────────────────
    for module in table.base_priority.keys() {
        if !known.contains(&module.as_str()) {
            errors.push(invalid(
                "selection.base_priority",
                module,
                "references unknown module",
            ));
        }
    }
    for module in table.complexity_penalty.keys() {
        if !known.contains(&module.as_str()) {
            errors.push(invalid(
                "selection.complexity_penalty",
                module,
                "references unknown module",
            ));
        }
    }
    for module in &table.high_performance_modules {
        if !known.contains(&module.as_str()) {
            errors.push(invalid(
                "selection.high_performance_modules",
                module,
                "references unknown module",
            ));
        }
    }
    for (i, seed) in table.bootstrap_weights.iter().enumerate() {
        let path = format!("selection.bootstrap_weights[{i}]");
        if !known.contains(&seed.module.as_str()) {
            errors.push(invalid(&path, &seed.module, "references unknown module"));
        }
        if !(0.1..=1.0).contains(&seed.weight) {
            errors.push(invalid(
                format!("{path}.weight"),
                seed.weight,
                "must be between 0.1 and 1.0",
            ));
        }
    }

    // ── Engine section ───────────────────────────────────────────────
    if !known.contains(&config.engine.default_module.as_str()) {
        errors.push(invalid(
            "engine.default_module",
            &config.engine.default_module,
            "references unknown module",
        ));
    }

    // ── Resilience ───────────────────────────────────────────────────
    if config.resilience.retry_attempts == 0 {
        errors.push(invalid(
            "resilience.retry_attempts",
            "0",
            "must be at least 1",
        ));
    }
    if config.resilience.retry_base_ms > config.resilience.retry_max_ms {
        errors.push(invalid(
            "resilience.retry_base_ms",
            config.resilience.retry_base_ms,
            "must be \u{2264} retry_max_ms",
        ));
    }

    // ── Server ───────────────────────────────────────────────────────
    if config.server.max_request_size < 1024 {
        errors.push(invalid(
            "server.max_request_size",
            config.server.max_request_size,
            "must be at least 1024 bytes",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{BootstrapWeight, SynergyEdge};

    fn valid_config() -> EngineConfig {
        EngineConfig::default()
    }

    fn messages(errors: &[ConfigError]) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_rule_table_is_rejected() {
        let mut config = valid_config();
        config.selection.rules.clear();
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("at least one module rule"));
    }

    #[test]
    fn test_duplicate_module_name_is_rejected() {
        let mut config = valid_config();
        let dup = config.selection.rules[0].clone();
        config.selection.rules.push(dup);
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("duplicate module name"));
    }

    #[test]
    fn test_overlapping_synergy_sets_are_rejected() {
        let mut config = valid_config();
        // particles lists physics as a synergy; also listing it as an
        // anti-synergy violates the disjointness invariant.
        config.selection.rules[0]
            .anti_synergies
            .push("physics".to_string());
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("both synergies and anti_synergies"));
    }

    #[test]
    fn test_synergy_edge_to_unknown_module_is_rejected() {
        let mut config = valid_config();
        config.selection.synergies.edges.push(SynergyEdge {
            a: "particles".to_string(),
            b: "plasma".to_string(),
            strength: 0.5,
        });
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("unknown module"));
    }

    #[test]
    fn test_self_referencing_edge_is_rejected() {
        let mut config = valid_config();
        config.selection.synergies.edges.push(SynergyEdge {
            a: "particles".to_string(),
            b: "particles".to_string(),
            strength: 0.5,
        });
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("self-referencing"));
    }

    #[test]
    fn test_duplicate_edge_either_orientation_is_rejected() {
        let mut config = valid_config();
        config.selection.synergies.edges.push(SynergyEdge {
            a: "physics".to_string(),
            b: "particles".to_string(),
            strength: 0.4,
        });
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("duplicate synergy edge"));
    }

    #[test]
    fn test_out_of_range_strength_is_rejected() {
        let mut config = valid_config();
        config.selection.synergies.edges[0].strength = 1.4;
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("between 0.0 and 1.0"));
    }

    #[test]
    fn test_out_of_range_base_confidence_is_rejected() {
        let mut config = valid_config();
        config.selection.rules[0].base_confidence = -0.2;
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("base_confidence"));
    }

    #[test]
    fn test_unknown_default_module_is_rejected() {
        let mut config = valid_config();
        config.engine.default_module = "plasma".to_string();
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("engine.default_module"));
    }

    #[test]
    fn test_bootstrap_weight_out_of_range_is_rejected() {
        let mut config = valid_config();
        config.selection.bootstrap_weights.push(BootstrapWeight {
            module: "particles".to_string(),
            concept: "fire".to_string(),
            weight: 0.05,
        });
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("between 0.1 and 1.0"));
    }

    #[test]
    fn test_zero_retry_attempts_is_rejected() {
        let mut config = valid_config();
        config.resilience.retry_attempts = 0;
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("at least 1"));
    }

    #[test]
    fn test_retry_base_above_max_is_rejected() {
        let mut config = valid_config();
        config.resilience.retry_base_ms = 10_000;
        config.resilience.retry_max_ms = 100;
        let errors = validate(&config).unwrap_err();
        assert!(messages(&errors).contains("retry_base_ms"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut config = valid_config();
        config.engine.default_module = "plasma".to_string();
        config.resilience.retry_attempts = 0;
        config.selection.rules[0].base_confidence = 2.0;
        let errors = validate(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all violations, got {errors:?}");
    }
}
