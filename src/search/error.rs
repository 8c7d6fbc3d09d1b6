//! Search error types

use thiserror::Error;

/// Errors raised by a search backend
#[derive(Error, Debug)]
pub enum SearchError {
    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

impl From<rusqlite::Error> for SearchError {
    fn from(err: rusqlite::Error) -> Self {
        SearchError::Storage(err.into())
    }
}
