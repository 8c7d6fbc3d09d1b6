//! Query error types
//!
//! Defines the error conditions raised while turning a raw `q` string into
//! a structured query.

use thiserror::Error;

/// Errors that can occur during query parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Query parsing failed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A quoted value was opened but never closed
    #[error("Unterminated quote at position {position}")]
    UnterminatedQuote { position: usize },
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
