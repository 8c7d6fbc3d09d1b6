//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::groups::Blacklist;
use crate::query::{QuerySyntax, TermSyntax};
use crate::search::DEFAULT_PAGE_SIZE;
use crate::storage::Database;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Annotation store and search backend
    pub db: Arc<Database>,
    /// Query language used to parse and re-serialize `q`
    pub syntax: Arc<dyn QuerySyntax>,
    /// Reserved group slugs
    pub blacklist: Arc<Blacklist>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Annotations loaded per activity search
    pub page_size: usize,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with the default query syntax and page size
    pub fn new(db: Arc<Database>, blacklist: Arc<Blacklist>, config: ApiConfig) -> Self {
        Self {
            db,
            syntax: Arc::new(TermSyntax),
            blacklist,
            config: Arc::new(config),
            page_size: DEFAULT_PAGE_SIZE,
            start_time: Instant::now(),
        }
    }

    /// Builder method: set the page size
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builder method: swap the query syntax
    pub fn syntax(mut self, syntax: Arc<dyn QuerySyntax>) -> Self {
        self.syntax = syntax;
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
