//! # Marginalia
//!
//! Activity search for a web annotation service: find annotations by tag,
//! user, group, document or text, and show them grouped by recency and
//! document.
//!
//! ## Modules
//!
//! - [`query`]: Search query language (`tag:foo user:jane free text`)
//! - [`activity`]: Query extraction, scoped-page redirects and result bucketing
//! - [`search`]: Search backend interface
//! - [`storage`]: SQLite annotation store, also used as search backend
//! - [`groups`]: Create-group form validation and slug blacklist
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marginalia::activity::{self, check_redirect, extract, ExecuteOptions, RouteContext};
//! use marginalia::query::TermSyntax;
//! use marginalia::storage::Database;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open_in_memory()?;
//!     let route = RouteContext::group("abc123");
//!
//!     let Some(mut query) = extract(Some("tag:rust"), &route, &TermSyntax)? else {
//!         return Ok(());
//!     };
//!
//!     if let Some(target) = check_redirect(&route, &mut query, &TermSyntax) {
//!         println!("Redirect to {}", target.location());
//!         return Ok(());
//!     }
//!
//!     let results = activity::execute(&db, &db, &query, &ExecuteOptions::default())?;
//!     println!("Found {} annotations", results.total);
//!
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod api;
pub mod config;
pub mod groups;
pub mod query;
pub mod search;
pub mod storage;

// Re-export top-level types for convenience
pub use activity::{ActivityError, ActivityResults, RouteContext};
pub use api::{build_router, serve, ApiError, AppState};
pub use config::{Config, ConfigError, LoggingConfig};
pub use query::{QueryError, StructuredQuery};
pub use search::{SearchBackend, SearchError};
pub use storage::{AnnotationStore, Database, StorageError, StorageResult};
