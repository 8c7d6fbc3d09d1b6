//! Activity search
//!
//! The activity pages show annotations matching a search, grouped by
//! recency and document. A request flows through three steps:
//!
//! - **extract**: parse `q` and force the scope term of group/user pages
//! - **check_redirect**: send single-group/single-user searches on the
//!   unscoped page to the scoped page
//! - **execute**: search, hydrate, bucket and present
//!
//! ```text
//! q + route → extract → check_redirect ─(redirect)→ 302
//!                              │
//!                              └→ execute → ActivityResults
//! ```

pub mod bucketing;
mod error;
mod execute;
mod extract;
pub mod presenter;
mod redirect;
mod route;

pub use bucketing::{DocumentBucket, Timeframe};
pub use error::{ActivityError, ActivityResult};
pub use execute::{
    aggregations_for, execute, search_request_for, ActivityEntry, ActivityResults,
    ExecuteOptions, GroupInfo, TAGS_AGGREGATION_LIMIT, USERS_AGGREGATION_LIMIT,
};
pub use extract::extract;
pub use presenter::PresentedAnnotation;
pub use redirect::{check_redirect, RedirectScope, RedirectTarget, REDIRECT_ORDER};
pub use route::{group_search_path, user_search_path, RouteContext};
