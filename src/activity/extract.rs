//! Query extraction
//!
//! Turns the raw `q` parameter into a structured query and forces the scope
//! term of group and user pages.

use crate::activity::route::RouteContext;
use crate::query::{QueryResult, QuerySyntax, StructuredQuery, GROUP_KEY, USER_KEY};

/// Parse `raw` and add the term implied by `route`.
///
/// Returns `Ok(None)` when no `q` parameter was submitted at all; an empty
/// string yields an empty query. On a scoped page any `group`/`user` term
/// typed by the user is replaced: showing the union of two scopes would be
/// wrong, and their intersection is always empty.
pub fn extract<S>(
    raw: Option<&str>,
    route: &RouteContext,
    syntax: &S,
) -> QueryResult<Option<StructuredQuery>>
where
    S: QuerySyntax + ?Sized,
{
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut query = syntax.parse(raw)?;

    match route {
        RouteContext::Search => {}
        RouteContext::GroupSearch { pubid } => query.set(GROUP_KEY, pubid.as_str()),
        RouteContext::UserSearch { username } => query.set(USER_KEY, username.as_str()),
    }

    Ok(Some(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryError, TermSyntax};

    #[test]
    fn test_absent_query_is_none() {
        let result = extract(None, &RouteContext::Search, &TermSyntax).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_query_is_some() {
        let result = extract(Some(""), &RouteContext::Search, &TermSyntax).unwrap();
        assert_eq!(result, Some(StructuredQuery::new()));
    }

    #[test]
    fn test_unscoped_route_leaves_query_alone() {
        let q = extract(Some("group:abc123 tag:foo"), &RouteContext::Search, &TermSyntax)
            .unwrap()
            .unwrap();
        assert_eq!(q.get_all("group"), vec!["abc123"]);
        assert_eq!(q.get_all("tag"), vec!["foo"]);
    }

    #[test]
    fn test_group_route_forces_group() {
        let route = RouteContext::group("abc123");
        let inputs = ["tag:foo", "group:other", "group:a group:b user:jane", ""];

        for input in inputs {
            let q = extract(Some(input), &route, &TermSyntax).unwrap().unwrap();
            assert_eq!(q.get_all("group"), vec!["abc123"], "input: {}", input);
        }
    }

    #[test]
    fn test_group_route_keeps_user_terms() {
        let route = RouteContext::group("abc123");
        let q = extract(Some("user:jane"), &route, &TermSyntax).unwrap().unwrap();
        assert_eq!(q.get_all("user"), vec!["jane"]);
    }

    #[test]
    fn test_user_route_forces_user() {
        let route = RouteContext::user("jane");
        let q = extract(Some("user:bob user:carol tag:x"), &route, &TermSyntax)
            .unwrap()
            .unwrap();
        assert_eq!(q.get_all("user"), vec!["jane"]);
        assert_eq!(q.get_all("tag"), vec!["x"]);
        assert_eq!(q.count_of("group"), 0);
    }

    #[test]
    fn test_parse_errors_propagate() {
        let err = extract(Some("tag:\"open"), &RouteContext::Search, &TermSyntax).unwrap_err();
        assert!(matches!(err, QueryError::UnterminatedQuote { .. }));
    }
}
