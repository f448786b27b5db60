//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::StatsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and registration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Validation(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<StatsConfig, ConfigError> {
    let config: StatsConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StatsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config("[rolling]\nnum_buckets = 4\n").unwrap();
        assert_eq!(config.rolling.num_buckets, 4);
    }

    #[test]
    fn test_parse_rejects_invalid_window() {
        let err = parse_config("[rolling]\nbucket_duration_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert_eq!(
            err.to_string(),
            "Validation failed: rolling: bucket_duration_ms must be greater than 0"
        );
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("rolling = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does-not-exist-circuit-stats.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = "test_load_from_file_circuit_stats.toml";
        fs::write(path, "track_fallback = false\n").unwrap();

        let config = load_config(Path::new(path)).unwrap();
        assert!(!config.track_fallback);

        fs::remove_file(path).unwrap_or_default();
    }
}
