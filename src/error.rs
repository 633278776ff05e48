//! Application error types.

use thiserror::Error;

use crate::graph::BuildError;
use crate::mapping::{MappingError, MetadataError};

/// Errors surfaced by repositories, the persistence manager and backends.
#[derive(Error, Debug)]
pub enum AppError {
    // Mapping errors
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    // Lookup outcomes
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Consistency error: expected {expected} record(s) but found {found}")]
    Consistency { expected: usize, found: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    // Query errors
    #[error("Query build error: {0}")]
    Build(#[from] BuildError),

    #[error("Query error: {message}")]
    Query { message: String, query: String },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Returns true when more rows came back than the lookup allows.
    pub fn is_consistency(&self) -> bool {
        matches!(self, AppError::Consistency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_consistency() {
        let not_found = AppError::NotFound("User".to_string());
        let consistency = AppError::Consistency {
            expected: 1,
            found: 2,
        };

        assert!(not_found.is_not_found());
        assert!(!not_found.is_consistency());
        assert!(consistency.is_consistency());
        assert!(!consistency.is_not_found());
    }

    #[test]
    fn test_consistency_message() {
        let err = AppError::Consistency {
            expected: 1,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Consistency error: expected 1 record(s) but found 3"
        );
    }
}
