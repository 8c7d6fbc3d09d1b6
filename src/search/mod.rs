//! Search backend interface
//!
//! The activity pipeline treats full-text search as an opaque service. It
//! hands over a [`StructuredQuery`] together with a [`SearchRequest`]
//! describing filters, aggregations and page size, and gets back the total
//! hit count, aggregation buckets and an ordered page of annotation ids.
//!
//! - [`SearchBackend`]: the narrow trait every backend implements
//! - [`sqlite`]: a backend over the SQLite record store

mod error;
pub mod sqlite;

pub use error::SearchError;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::query::StructuredQuery;

/// Default number of annotation ids returned per search
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Result filters applied on top of the query terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Exclude replies, keeping only annotations without a parent
    TopLevelAnnotations,
}

/// Frequency aggregations computed over the full match set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Most used tags
    Tags { limit: usize },
    /// Most active users
    Users { limit: usize },
}

impl Aggregation {
    /// Name under which the result is reported
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Tags { .. } => "tags",
            Aggregation::Users { .. } => "users",
        }
    }

    /// Maximum number of buckets returned
    pub fn limit(&self) -> usize {
        match self {
            Aggregation::Tags { limit } | Aggregation::Users { limit } => *limit,
        }
    }
}

/// Everything a backend needs besides the query terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub filters: Vec<Filter>,
    pub aggregations: Vec<Aggregation>,
    /// Maximum number of ids to return
    pub limit: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            aggregations: Vec::new(),
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn append_aggregation(&mut self, aggregation: Aggregation) {
        self.aggregations.push(aggregation);
    }

    /// Builder method: set the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn has_filter(&self, filter: Filter) -> bool {
        self.filters.contains(&filter)
    }
}

/// One aggregation bucket: a tag or userid and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationBucket {
    pub key: String,
    pub count: u64,
}

impl AggregationBucket {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Aggregation buckets keyed by aggregation name
pub type Aggregations = BTreeMap<String, Vec<AggregationBucket>>;

/// What a backend returns for one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of matching annotations, not limited by page size
    pub total: u64,
    pub aggregations: Aggregations,
    /// Ids of the returned page, in backend order
    pub annotation_ids: Vec<String>,
}

/// A full-text search service
pub trait SearchBackend: Send + Sync {
    /// Run `query` with the filters and aggregations in `request`
    fn search(
        &self,
        query: &StructuredQuery,
        request: &SearchRequest,
    ) -> Result<SearchResult, SearchError>;
}
