//! Activity pipeline error types

use thiserror::Error;

/// Errors that can occur while serving an activity search
#[derive(Error, Debug)]
pub enum ActivityError {
    /// The raw query could not be parsed
    #[error("Query error: {0}")]
    Query(#[from] crate::query::QueryError),

    /// The search backend failed
    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),

    /// Hydrating annotations or groups failed
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for activity operations
pub type ActivityResult<T> = Result<T, ActivityError>;
