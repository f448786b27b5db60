//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate window shapes (non-zero bucket width and bucket count)
//! - Validate per-circuit overrides and the log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StatsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{RollingConfig, StatsConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Bucket width must be positive.
    #[error("{scope}: bucket_duration_ms must be greater than 0")]
    ZeroBucketDuration { scope: String },

    /// The ring needs at least one bucket.
    #[error("{scope}: num_buckets must be greater than 0")]
    ZeroBuckets { scope: String },

    /// Unknown log level.
    #[error("logging.level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

/// Validate a single window shape. `scope` names it in error messages.
pub fn validate_rolling(scope: &str, rolling: &RollingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if rolling.bucket_duration_ms == 0 {
        errors.push(ValidationError::ZeroBucketDuration { scope: scope.to_string() });
    }
    if rolling.num_buckets == 0 {
        errors.push(ValidationError::ZeroBuckets { scope: scope.to_string() });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &StatsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(mut e) = validate_rolling("rolling", &config.rolling) {
        errors.append(&mut e);
    }

    // Sorted so error order is stable across runs.
    let mut names: Vec<&String> = config.circuits.keys().collect();
    names.sort();
    for name in names {
        if let Some(rolling) = config.circuits[name].rolling.as_ref() {
            if let Err(mut e) = validate_rolling(&format!("circuits.{}.rolling", name), rolling) {
                errors.append(&mut e);
            }
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
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
    use crate::config::schema::CircuitOverride;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StatsConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = StatsConfig::default();
        config.rolling.num_buckets = 0;
        config.logging.level = "loud".into();
        config.circuits.insert(
            "db".into(),
            CircuitOverride {
                rolling: Some(RollingConfig { bucket_duration_ms: 0, num_buckets: 0 }),
                track_fallback: None,
            },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroBuckets { scope: "rolling".into() },
                ValidationError::ZeroBucketDuration { scope: "circuits.db.rolling".into() },
                ValidationError::ZeroBuckets { scope: "circuits.db.rolling".into() },
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let rolling = RollingConfig { bucket_duration_ms: 0, num_buckets: 3 };
        let errors = validate_rolling("rolling", &rolling).unwrap_err();
        assert_eq!(errors[0].to_string(), "rolling: bucket_duration_ms must be greater than 0");
    }
}
