//! # Error Types
//!
//! Shared error types for the CFP portal. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! Lifecycle errors (paper, review, timeline) live next to their state
//! machines in `cfp-state`; this module holds what every crate needs.

use thiserror::Error;

/// Top-level error type for the CFP portal.
#[derive(Error, Debug)]
pub enum CfpError {
    /// A field failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A catalog lookup did not match any known entry.
    #[error("unknown {catalog} entry: {value:?}")]
    UnknownCatalogEntry {
        /// Name of the catalog (e.g. "paper type").
        catalog: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Field-level validation failure.
///
/// Each variant names the offending field so that callers can re-render
/// a form with the error attached to the right input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name.
        field: &'static str,
    },

    /// A field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum number of characters.
        max: usize,
    },

    /// An email address was malformed.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A field value is not allowed in combination with another.
    #[error("{field}: {reason}")]
    Inconsistent {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Validate that a trimmed string is non-empty and within `max` characters.
///
/// Returns the trimmed value on success.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("title", "  Hello ", 10).unwrap(), "Hello");
    }

    #[test]
    fn require_text_rejects_blank() {
        assert_eq!(
            require_text("title", "   ", 10),
            Err(ValidationError::Empty { field: "title" })
        );
    }

    #[test]
    fn require_text_counts_chars_not_bytes() {
        // Four two-byte characters fit into a limit of four.
        assert!(require_text("name", "éééé", 4).is_ok());
        assert_eq!(
            require_text("name", "ééééé", 4),
            Err(ValidationError::TooLong { field: "name", max: 4 })
        );
    }

    #[test]
    fn validation_error_converts_into_cfp_error() {
        let err: CfpError = ValidationError::InvalidEmail("x".into()).into();
        assert!(err.to_string().contains("invalid email"));
    }
}
