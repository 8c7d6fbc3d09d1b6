//! Marginalia Query Language
//!
//! Activity searches are written as whitespace-separated terms:
//!
//! - **StructuredQuery**: ordered multimap of term key → values
//! - **Parser**: parse query strings into a StructuredQuery and back
//!
//! # Query Language
//!
//! ```text
//! [field:]value [[field:]value ...]
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use marginalia::query::{QuerySyntax, TermSyntax};
//!
//! let query = TermSyntax.parse("group:abc123 tag:foo")?;
//! assert_eq!(query.get_all("tag"), vec!["foo"]);
//! assert_eq!(TermSyntax.unparse(&query), "group:abc123 tag:foo");
//! ```

mod error;
mod parser;
mod structured;

pub use error::{QueryError, QueryResult};
pub use parser::{parse_query, unparse_query, QuerySyntax, TermSyntax, NAMED_FIELDS};
pub use structured::{StructuredQuery, ANY_KEY, GROUP_KEY, USER_KEY};
