//! Error types for tql-core.
//!
//! Minimal error types without table dependencies.

use thiserror::Error;

/// TQL error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TqlError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments: {0}")]
    ArityOrType(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type for TQL operations
pub type TqlResult<T> = Result<T, TqlError>;

impl serde::Serialize for TqlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
