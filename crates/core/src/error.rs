//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures that can be detected without
/// touching storage (field validation, malformed identifiers). Uniqueness and
/// referential checks belong to the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. missing required field, value too long).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Validate a required, length-bounded text field.
///
/// Blank (whitespace-only) values count as missing.
pub fn require_text(field: &str, value: &str, max_len: usize) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    check_max_len(field, value, max_len)
}

/// Validate an optional text field against a maximum length (in characters).
pub fn check_max_len(field: &str, value: &str, max_len: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters (got {len})"
        )));
    }
    Ok(())
}
