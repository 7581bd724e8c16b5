//! Configuration file loading.
//!
//! ## Responsibility
//! Read a TOML file from disk, parse it into an [`EngineConfig`], and run
//! validation before returning. This is the primary entry point for loading
//! engine configuration at startup.
//!
//! ## Guarantees
//! - A successfully loaded config is always validated
//! - I/O errors and parse errors are distinguished in the error type
//! - File path is included in every error message
//!
//! ## NOT Responsible For
//! - Defining the config schema (that belongs to `mod.rs`)
//! - Semantic checks (that belongs to `validation`)

use std::path::Path;

use super::validation::{self, ConfigError};
use super::EngineConfig;

/// Load an [`EngineConfig`] from a TOML file.
///
/// Reads the file, parses it as TOML, and validates all semantic
/// constraints.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
///
/// # Panics
///
/// This function never panics.
pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    load_from_str(&content, &path.display().to_string())
}

/// Load an [`EngineConfig`] from a TOML string.
///
/// Useful for testing or embedding configs without file I/O.
///
/// # Errors
///
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
///
/// # Panics
///
/// This function never panics.
pub fn load_from_str(content: &str, source_name: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })?;

    validation::validate(&config).map_err(|errors| {
        ConfigError::Validation(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_empty_string_yields_defaults() {
        let config = load_from_str("", "test").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_malformed_toml_is_parse_error() {
        let result = load_from_str("[engine\nname = ", "broken.toml");
        match result {
            Err(ConfigError::Parse { file, .. }) => assert_eq!(file, "broken.toml"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_semantically_invalid_is_validation_error() {
        let toml = r#"
            [engine]
            default_module = "plasma"
        "#;
        let result = load_from_str(toml, "test");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9191").unwrap();
        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9191);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_from_file(Path::new("/nonexistent/engine.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
