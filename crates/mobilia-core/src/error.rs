//! # Error Types
//!
//! Domain-specific error types for mobilia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mobilia-core errors (this file)                                       │
//! │  ├── CoreError        - Unknown operators / aggregate operations       │
//! │  └── ValidationError  - Input shape failures                           │
//! │                                                                         │
//! │  mobilia-store errors (separate crate)                                 │
//! │  └── StoreError       - NotFound, DuplicateId, persistence failures    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Degrading Errors
//! `InvalidOperator` and `InvalidAggregateOperation` are only returned by
//! the strict `FromStr` parsers. The store's lenient entry points turn
//! them into equality and `0` respectively.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core data-model errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filter operator name is not one of the supported operators.
    #[error("Unknown filter operator: '{0}'")]
    InvalidOperator(String),

    /// Aggregate operation name is not one of sum/avg/min/max/count.
    #[error("Unknown aggregate operation: '{0}'")]
    InvalidAggregateOperation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Only shapes are checked here (names, page numbers). Business rules
/// belong to the callers of the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. table name with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidOperator("between".to_string());
        assert_eq!(err.to_string(), "Unknown filter operator: 'between'");

        let err = CoreError::InvalidAggregateOperation("median".to_string());
        assert_eq!(err.to_string(), "Unknown aggregate operation: 'median'");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "table".to_string(),
        };
        assert_eq!(err.to_string(), "table is required");

        let err = ValidationError::MustBePositive {
            field: "limit".to_string(),
        };
        assert_eq!(err.to_string(), "limit must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "field".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
