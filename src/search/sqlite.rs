//! SQLite search backend
//!
//! Translates structured query terms into SQL conditions over the record
//! store. Every term narrows the result set, so repeated keys intersect.
//!
//! | key            | matches                                     |
//! |----------------|---------------------------------------------|
//! | `group`        | group pubid                                 |
//! | `user`         | full userid or its username, any case      |
//! | `tag`          | exact tag, any case                         |
//! | `uri` / `url`  | document URI                                |
//! | `quote`/`text` | substring of the annotation body            |
//! | `any`          | body substring or tag                       |
//!
//! Only shared annotations are searchable.

use rusqlite::params_from_iter;

use crate::query::StructuredQuery;
use crate::search::{
    Aggregation, AggregationBucket, Aggregations, Filter, SearchBackend, SearchError,
    SearchRequest, SearchResult,
};
use crate::storage::Database;

const TAG_MATCH: &str =
    "EXISTS (SELECT 1 FROM json_each(a.tags) t WHERE lower(t.value) = lower(?))";

/// SQL conditions plus their positional parameters
#[derive(Debug, Default)]
struct WhereClause {
    conditions: Vec<String>,
    params: Vec<String>,
}

impl WhereClause {
    fn push(&mut self, condition: &str, value: &str, times: usize) {
        self.conditions.push(condition.to_string());
        for _ in 0..times {
            self.params.push(value.to_string());
        }
    }

    fn sql(&self) -> String {
        if self.conditions.is_empty() {
            "1 = 1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }
}

fn build_where(query: &StructuredQuery, request: &SearchRequest) -> WhereClause {
    let mut clause = WhereClause::default();
    clause.conditions.push("a.shared = 1".to_string());

    for filter in &request.filters {
        match filter {
            Filter::TopLevelAnnotations => {
                clause.conditions.push("a.parent_id IS NULL".to_string());
            }
        }
    }

    for (key, value) in query.iter() {
        match key {
            "group" => clause.push("a.groupid = ?", value, 1),
            "user" => clause.push(
                "(lower(a.userid) = lower(?) OR (a.userid LIKE 'acct:%@%' \
                 AND lower(substr(a.userid, 6, instr(a.userid, '@') - 6)) = lower(?)))",
                value,
                2,
            ),
            "tag" => clause.push(TAG_MATCH, value, 1),
            "uri" | "url" => clause.push(
                "EXISTS (SELECT 1 FROM documents d WHERE d.id = a.document_id AND d.uri = ?)",
                value,
                1,
            ),
            "quote" | "text" => clause.push("instr(lower(a.text), lower(?)) > 0", value, 1),
            "any" => clause.push(
                &format!("(instr(lower(a.text), lower(?)) > 0 OR {})", TAG_MATCH),
                value,
                2,
            ),
            other => {
                tracing::warn!(key = %other, "Ignoring unsupported search term");
            }
        }
    }

    clause
}

impl SearchBackend for Database {
    fn search(
        &self,
        query: &StructuredQuery,
        request: &SearchRequest,
    ) -> Result<SearchResult, SearchError> {
        let clause = build_where(query, request);
        let where_sql = clause.sql();
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM annotations a WHERE {}", where_sql),
            params_from_iter(clause.params.iter()),
            |row| row.get(0),
        )?;

        let mut aggregations = Aggregations::new();
        for aggregation in &request.aggregations {
            let sql = match aggregation {
                Aggregation::Tags { limit } => format!(
                    "SELECT t.value, COUNT(*) AS n
                     FROM annotations a, json_each(a.tags) t
                     WHERE {}
                     GROUP BY t.value
                     ORDER BY n DESC, t.value ASC
                     LIMIT {}",
                    where_sql, limit
                ),
                Aggregation::Users { limit } => format!(
                    "SELECT a.userid, COUNT(*) AS n
                     FROM annotations a
                     WHERE {}
                     GROUP BY a.userid
                     ORDER BY n DESC, a.userid ASC
                     LIMIT {}",
                    where_sql, limit
                ),
            };

            let mut stmt = conn.prepare(&sql)?;
            let buckets = stmt
                .query_map(params_from_iter(clause.params.iter()), |row| {
                    Ok(AggregationBucket {
                        key: row.get(0)?,
                        count: row.get::<_, i64>(1)? as u64,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            aggregations.insert(aggregation.name().to_string(), buckets);
        }

        let annotation_ids = {
            let sql = format!(
                "SELECT a.id FROM annotations a
                 WHERE {}
                 ORDER BY a.updated DESC, a.id ASC
                 LIMIT {}",
                where_sql, request.limit
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(clause.params.iter()), |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            ids
        };

        tracing::debug!(
            total,
            returned = annotation_ids.len(),
            aggregations = request.aggregations.len(),
            "Search executed"
        );

        Ok(SearchResult {
            total: total as u64,
            aggregations,
            annotation_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Annotation, Document};
    use chrono::{Duration, TimeZone, Utc};

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        db.insert_document(&Document::new("d1", "https://example.com/a")).unwrap();
        db.insert_document(&Document::new("d2", "https://example.com/b")).unwrap();

        let rows = [
            Annotation::new("a1", "acct:jane@example.com", "abc123", "d1")
                .text("Deep learning notes")
                .tag("foo")
                .tag("ml")
                .at(t0),
            Annotation::new("a2", "acct:jane@example.com", "abc123", "d2")
                .tag("foo")
                .at(t0 + Duration::hours(1)),
            Annotation::new("a3", "acct:bob_s@example.com", "xyz789", "d1")
                .tag("Foo")
                .at(t0 + Duration::hours(2)),
            Annotation::new("r1", "acct:bob_s@example.com", "abc123", "d1")
                .tag("foo")
                .reply_to("a1")
                .at(t0 + Duration::hours(3)),
            Annotation::new("p1", "acct:jane@example.com", "abc123", "d1")
                .tag("foo")
                .shared(false)
                .at(t0 + Duration::hours(4)),
        ];
        for row in &rows {
            db.insert_annotation(row).unwrap();
        }
        db
    }

    fn top_level() -> SearchRequest {
        let mut request = SearchRequest::new();
        request.append_filter(Filter::TopLevelAnnotations);
        request
    }

    #[test]
    fn test_tag_search_is_case_insensitive() {
        let db = seeded();
        let query = StructuredQuery::new().with("tag", "foo");

        let result = db.search(&query, &top_level()).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.annotation_ids, vec!["a3", "a2", "a1"]);
    }

    #[test]
    fn test_replies_only_without_top_level_filter() {
        let db = seeded();
        let query = StructuredQuery::new().with("tag", "foo");

        let result = db.search(&query, &SearchRequest::new()).unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.annotation_ids[0], "r1");
    }

    #[test]
    fn test_private_annotations_never_match() {
        let db = seeded();
        let result = db.search(&StructuredQuery::new(), &SearchRequest::new()).unwrap();
        assert!(!result.annotation_ids.contains(&"p1".to_string()));
    }

    #[test]
    fn test_user_matches_username_or_userid() {
        let db = seeded();
        let request = top_level();

        let by_name = StructuredQuery::new().with("user", "BOB_S");
        assert_eq!(db.search(&by_name, &request).unwrap().annotation_ids, vec!["a3"]);

        let by_id = StructuredQuery::new().with("user", "acct:jane@example.com");
        assert_eq!(db.search(&by_id, &request).unwrap().total, 2);

        // `_` is not a wildcard
        let near_miss = StructuredQuery::new().with("user", "bobxs");
        assert_eq!(db.search(&near_miss, &request).unwrap().total, 0);
    }

    #[test]
    fn test_repeated_groups_intersect() {
        let db = seeded();
        let query = StructuredQuery::new().with("group", "abc123").with("group", "xyz789");
        assert_eq!(db.search(&query, &top_level()).unwrap().total, 0);
    }

    #[test]
    fn test_uri_and_text_terms() {
        let db = seeded();
        let request = top_level();

        let by_uri = StructuredQuery::new().with("uri", "https://example.com/b");
        assert_eq!(db.search(&by_uri, &request).unwrap().annotation_ids, vec!["a2"]);

        let by_text = StructuredQuery::new().with("any", "LEARNING");
        assert_eq!(db.search(&by_text, &request).unwrap().annotation_ids, vec!["a1"]);

        let by_any_tag = StructuredQuery::new().with("any", "ml");
        assert_eq!(db.search(&by_any_tag, &request).unwrap().annotation_ids, vec!["a1"]);
    }

    #[test]
    fn test_aggregations() {
        let db = seeded();
        let mut request = top_level();
        request.append_aggregation(Aggregation::Tags { limit: 10 });
        request.append_aggregation(Aggregation::Users { limit: 1 });

        let result = db.search(&StructuredQuery::new(), &request).unwrap();

        let tags = &result.aggregations["tags"];
        assert_eq!(tags[0], AggregationBucket::new("foo", 2));
        assert!(tags.contains(&AggregationBucket::new("Foo", 1)));
        assert!(tags.contains(&AggregationBucket::new("ml", 1)));

        let users = &result.aggregations["users"];
        assert_eq!(users, &vec![AggregationBucket::new("acct:jane@example.com", 2)]);
    }

    #[test]
    fn test_limit_does_not_change_total() {
        let db = seeded();
        let request = top_level().limit(1);
        let result = db.search(&StructuredQuery::new(), &request).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.annotation_ids, vec!["a3"]);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let db = seeded();
        let query = StructuredQuery::new().with("colour", "red");
        assert_eq!(db.search(&query, &top_level()).unwrap().total, 3);
    }
}
