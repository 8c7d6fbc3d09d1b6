//! Marginalia Record Store
//!
//! Read access to annotations, documents and groups for the activity
//! pipeline, plus the write helpers used by imports and tests.
//!
//! # Architecture
//!
//! ```text
//! annotation ids (from search)
//!        ↓
//! fetch_annotations: 1 query for rows + 1 batched query for documents
//!        ↓
//! bucketing
//!        ↓
//! fetch_groups: 1 query for every referenced group
//! ```

mod error;
pub mod sqlite;
mod types;

pub use error::{StorageError, StorageResult};
pub use sqlite::{Database, ImportStats};
pub use types::{username_from_userid, Annotation, Dataset, Document, Group};

/// Batched read access to annotation records
pub trait AnnotationStore: Send + Sync {
    /// Load the annotations with the given ids, documents included.
    ///
    /// Results are ordered most recently updated first. Unknown ids are
    /// skipped.
    fn fetch_annotations(&self, ids: &[String]) -> StorageResult<Vec<Annotation>>;

    /// Load the groups with the given public ids. Unknown ids are skipped.
    fn fetch_groups(&self, pubids: &[String]) -> StorageResult<Vec<Group>>;
}
