//! Activity page routes
//!
//! The activity search is served from three pages. Which one matched decides
//! whether a scope term is forced into the query and whether redirects are
//! considered.

use serde::Serialize;

/// The activity page a request was routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteContext {
    /// `/search`
    Search,
    /// `/groups/{pubid}/search`
    GroupSearch { pubid: String },
    /// `/users/{username}/search`
    UserSearch { username: String },
}

impl RouteContext {
    pub fn group(pubid: impl Into<String>) -> Self {
        RouteContext::GroupSearch {
            pubid: pubid.into(),
        }
    }

    pub fn user(username: impl Into<String>) -> Self {
        RouteContext::UserSearch {
            username: username.into(),
        }
    }

    /// Path of this page, without query string
    pub fn path(&self) -> String {
        match self {
            RouteContext::Search => "/search".to_string(),
            RouteContext::GroupSearch { pubid } => group_search_path(pubid),
            RouteContext::UserSearch { username } => user_search_path(username),
        }
    }

    /// True for pages already restricted to one group or user
    pub fn is_scoped(&self) -> bool {
        !matches!(self, RouteContext::Search)
    }
}

/// Path of the group-scoped search page
pub fn group_search_path(pubid: &str) -> String {
    format!("/groups/{}/search", urlencoding::encode(pubid))
}

/// Path of the user-scoped search page
pub fn user_search_path(username: &str) -> String {
    format!("/users/{}/search", urlencoding::encode(username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(RouteContext::Search.path(), "/search");
        assert_eq!(RouteContext::group("abc123").path(), "/groups/abc123/search");
        assert_eq!(RouteContext::user("jane").path(), "/users/jane/search");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(user_search_path("a b/c"), "/users/a%20b%2Fc/search");
    }

    #[test]
    fn test_is_scoped() {
        assert!(!RouteContext::Search.is_scoped());
        assert!(RouteContext::group("x").is_scoped());
        assert!(RouteContext::user("x").is_scoped());
    }
}
