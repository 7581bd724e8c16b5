//! # Stage: Declarative Engine Configuration
//!
//! ## Responsibility
//! Parse and validate TOML engine configuration. Every deployment knob —
//! the selection rule table, fallback module, generation defaults, retry
//! budget, server binding — lives here with a documented default, so an
//! empty file (or no file at all) yields a fully working engine.
//!
//! ## Guarantees
//! - Deterministic: same TOML input always produces the same `EngineConfig`
//! - Validated: all semantic constraints are checked before a config is
//!   accepted; configuration errors are fatal at startup, never per-call
//! - Type-safe: invalid field combinations are caught at parse time via serde
//! - Schema-exportable: JSON Schema output enables IDE autocomplete
//!
//! ## NOT Responsible For
//! - Building the runtime pipeline from config (that belongs to `pipeline`)
//! - Scoring semantics (that belongs to `selection`)

pub mod loader;
pub mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generate::{Platform, QualityTier};
use crate::selection::RuleTable;

// ── Default value functions ──────────────────────────────────────────────

/// Default engine name.
fn default_engine_name() -> String {
    "default".to_string()
}

/// Default config schema version.
fn default_version() -> String {
    "1.0".to_string()
}

/// Default fallback module used when selection returns nothing.
fn default_module() -> String {
    "particles".to_string()
}

/// Default retry attempts for generation calls.
fn default_retry_attempts() -> usize {
    3
}

/// Default retry base delay: 100ms.
fn default_retry_base_ms() -> u64 {
    100
}

/// Default retry maximum delay: 5000ms.
fn default_retry_max_ms() -> u64 {
    5000
}

/// Default bind host.
fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default bind port.
fn default_port() -> u16 {
    8080
}

/// Default maximum request body size: 1 MiB.
fn default_max_request_size() -> usize {
    1024 * 1024
}

/// Default log format.
fn default_log_format() -> String {
    "pretty".to_string()
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for an engine instance.
///
/// Deserialized from a TOML file and validated before use. Every field has
/// either a required value or a documented default.
///
/// # Example
///
/// ```toml
/// [engine]
/// name = "production"
/// default_module = "particles"
///
/// [server]
/// port = 9090
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EngineConfig {
    /// Engine identity and fallback policy.
    #[serde(default)]
    pub engine: EngineSection,
    /// The selection rule table; the built-in six-module table when absent.
    #[serde(default)]
    pub selection: RuleTable,
    /// Generation defaults.
    #[serde(default)]
    pub generation: GenerationSection,
    /// Retry settings for generation calls.
    #[serde(default)]
    pub resilience: ResilienceSection,
    /// HTTP server binding (used by the `web-api` feature).
    #[serde(default)]
    pub server: ServerSection,
    /// Logging output settings.
    #[serde(default)]
    pub observability: ObservabilitySection,
}

/// Engine identity and fallback policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EngineSection {
    /// Human-readable engine name (e.g., "production", "staging").
    #[serde(default = "default_engine_name")]
    pub name: String,
    /// Semantic version of this configuration.
    #[serde(default = "default_version")]
    pub version: String,
    /// Module generated when selection returns no decisions. Must name a
    /// rule-table module.
    #[serde(default = "default_module")]
    pub default_module: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            version: default_version(),
            default_module: default_module(),
        }
    }
}

/// Generation defaults applied when a request leaves them unspecified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GenerationSection {
    /// Default target platform.
    #[serde(default)]
    pub platform: Platform,
    /// Default quality tier.
    #[serde(default)]
    pub quality: QualityTier,
}

/// Retry settings for generation calls.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResilienceSection {
    /// Total attempts per generation call, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    /// Base delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    /// Cap on any single retry delay, in milliseconds.
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

impl Default for ResilienceSection {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ServerSection {
    /// IP address or hostname to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port the server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum allowed request body size in bytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_size: default_max_request_size(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObservabilitySection {
    /// Log output format: "json" for aggregators, "pretty" for terminals.
    /// The `LOG_FORMAT` environment variable overrides this value.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilitySection {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_builtin_table() {
        let config = EngineConfig::default();
        assert_eq!(config.selection, RuleTable::default());
        assert_eq!(config.engine.default_module, "particles");
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config: EngineConfig = toml::from_str(
            r#"
            [server]
            port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.engine.default_module, "particles");
    }

    #[test]
    fn test_generation_section_parses_enums() {
        let config: EngineConfig = toml::from_str(
            r#"
            [generation]
            platform = "webgl1"
            quality = "high"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.platform, Platform::Webgl1);
        assert_eq!(config.generation.quality, QualityTier::High);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
