//! Canonical redirects for single-scope queries
//!
//! A search on the unscoped page that names exactly one group (or user) is
//! sent to that group's (or user's) own page with the term removed:
//!
//! ```text
//! /search?q=group:abc123+tag:foo  →  /groups/abc123/search?q=tag:foo
//! ```
//!
//! Scoped pages never redirect. Queries with zero or several values for a
//! scope key are left alone for that key.

use serde::Serialize;

use crate::activity::route::{group_search_path, user_search_path, RouteContext};
use crate::query::{QuerySyntax, StructuredQuery, GROUP_KEY, USER_KEY};

/// A scope dimension that can trigger a redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectScope {
    Group,
    User,
}

impl RedirectScope {
    /// Query key holding the scope value
    pub fn key(&self) -> &'static str {
        match self {
            RedirectScope::Group => GROUP_KEY,
            RedirectScope::User => USER_KEY,
        }
    }

    fn path(&self, value: &str) -> String {
        match self {
            RedirectScope::Group => group_search_path(value),
            RedirectScope::User => user_search_path(value),
        }
    }
}

/// Order in which scope checks run.
///
/// Every check runs; each one that fires pops its term and replaces the
/// redirect computed so far. A query with a single `group` and a single
/// `user` therefore lands on the user page, with both terms removed.
pub const REDIRECT_ORDER: [RedirectScope; 2] = [RedirectScope::Group, RedirectScope::User];

/// Where to send the client, and with which remaining query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    /// Path of the scoped page
    pub path: String,
    /// Remaining query text for the `q` parameter
    pub q: String,
}

impl RedirectTarget {
    /// Value for the `Location` header
    pub fn location(&self) -> String {
        format!("{}?q={}", self.path, urlencoding::encode(&self.q))
    }
}

/// Compute the canonical redirect for `query`, if any.
///
/// Only the unscoped page redirects. Scope terms that trigger a redirect are
/// removed from `query`.
pub fn check_redirect<S>(
    route: &RouteContext,
    query: &mut StructuredQuery,
    syntax: &S,
) -> Option<RedirectTarget>
where
    S: QuerySyntax + ?Sized,
{
    match route {
        RouteContext::Search => {}
        RouteContext::GroupSearch { .. } | RouteContext::UserSearch { .. } => return None,
    }

    let mut redirect = None;

    for scope in REDIRECT_ORDER {
        if let Some(value) = query.pop_single(scope.key()) {
            redirect = Some(RedirectTarget {
                path: scope.path(&value),
                q: syntax.unparse(query),
            });
        }
    }

    if let Some(target) = &redirect {
        tracing::debug!(location = %target.location(), "Redirecting to scoped search");
    }

    redirect
}
