//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the base path shape before it reaches route matching
//! - Catch empty environment keys that would be unreachable from code
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::AppConfig;

/// A single semantic violation found in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// base_path must be empty or start with '/'.
    BasePathNotRooted(String),
    /// base_path must not contain whitespace.
    BasePathWhitespace(String),
    /// Environment keys must be non-empty.
    EmptyEnvKey,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::BasePathNotRooted(path) => {
                write!(f, "base_path '{}' must start with '/'", path)
            }
            ValidationError::BasePathWhitespace(path) => {
                write!(f, "base_path '{}' must not contain whitespace", path)
            }
            ValidationError::EmptyEnvKey => write!(f, "env contains an empty key"),
        }
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.base_path.is_empty() && !config.base_path.starts_with('/') {
        errors.push(ValidationError::BasePathNotRooted(config.base_path.clone()));
    }
    if config.base_path.chars().any(char::is_whitespace) {
        errors.push(ValidationError::BasePathWhitespace(config.base_path.clone()));
    }
    if config.env.keys().any(|key| key.is_empty()) {
        errors.push(ValidationError::EmptyEnvKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
