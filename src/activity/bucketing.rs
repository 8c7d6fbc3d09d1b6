//! Timeframe and document bucketing
//!
//! Annotations arrive most recently updated first. They are split into
//! timeframes by recency, and inside each timeframe grouped by document:
//!
//! ```text
//! Last 7 days
//!   ├── https://example.com/a   [a9, a7]
//!   └── https://example.com/b   [a8]
//! Feb 2024
//!   └── https://example.com/a   [a3, a1]
//! ```
//!
//! The first timeframe covers the last seven days. Anything older falls
//! into calendar-month timeframes labelled like `Jan 2017`. Annotation order
//! inside a document bucket is the input order.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::storage::{Annotation, Document};

/// Label of the most recent timeframe
pub const LAST_7_DAYS: &str = "Last 7 days";

/// Title used when a document has neither title nor URI
pub const UNTITLED_DOCUMENT: &str = "Untitled document";

/// Domain shown for `file:` URIs
pub const LOCAL_FILE: &str = "Local file";

/// Annotations on one document within one timeframe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentBucket<T> {
    pub document_id: String,
    pub title: String,
    pub uri: String,
    pub domain: String,
    /// Union of the annotations' tags
    pub tags: BTreeSet<String>,
    /// Usernames of the annotations' authors
    pub users: BTreeSet<String>,
    pub annotations: Vec<T>,
}

impl DocumentBucket<Annotation> {
    fn new(document_id: &str, document: Option<&Document>) -> Self {
        let uri = document.map(|d| d.uri.clone()).unwrap_or_default();
        let title = document
            .and_then(Document::first_title)
            .map(str::to_string)
            .or_else(|| (!uri.is_empty()).then(|| uri.clone()))
            .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string());

        Self {
            document_id: document_id.to_string(),
            title,
            domain: domain_of(&uri),
            uri,
            tags: BTreeSet::new(),
            users: BTreeSet::new(),
            annotations: Vec::new(),
        }
    }

    fn append(&mut self, annotation: Annotation) {
        self.tags.extend(annotation.tags.iter().cloned());
        self.users.insert(annotation.username().to_string());
        self.annotations.push(annotation);
    }
}

impl<T> DocumentBucket<T> {
    /// Convert every annotation, keeping bucket metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> DocumentBucket<U> {
        DocumentBucket {
            document_id: self.document_id,
            title: self.title,
            uri: self.uri,
            domain: self.domain,
            tags: self.tags,
            users: self.users,
            annotations: self.annotations.into_iter().map(f).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// A recency bucket holding document buckets in first-seen order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeframe<T> {
    pub label: String,
    /// Oldest update time that still belongs to this timeframe
    pub cutoff: DateTime<Utc>,
    pub document_buckets: Vec<DocumentBucket<T>>,
}

impl<T> Timeframe<T> {
    fn new(label: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            cutoff,
            document_buckets: Vec::new(),
        }
    }

    /// Bucket for `document_id`, if present
    pub fn get(&self, document_id: &str) -> Option<&DocumentBucket<T>> {
        self.document_buckets
            .iter()
            .find(|b| b.document_id == document_id)
    }

    /// Document ids in bucket order
    pub fn document_ids(&self) -> Vec<&str> {
        self.document_buckets
            .iter()
            .map(|b| b.document_id.as_str())
            .collect()
    }

    /// Every annotation in this timeframe, bucket by bucket
    pub fn annotations(&self) -> impl Iterator<Item = &T> {
        self.document_buckets.iter().flat_map(|b| b.annotations.iter())
    }

    /// Convert every annotation, keeping the bucket structure
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Timeframe<U> {
        Timeframe {
            label: self.label,
            cutoff: self.cutoff,
            document_buckets: self
                .document_buckets
                .into_iter()
                .map(|b| b.map(&mut f))
                .collect(),
        }
    }
}

impl Timeframe<Annotation> {
    fn within_cutoff(&self, annotation: &Annotation) -> bool {
        annotation.updated >= self.cutoff
    }

    fn append(&mut self, annotation: Annotation) {
        let idx = match self
            .document_buckets
            .iter()
            .position(|b| b.document_id == annotation.document_id)
        {
            Some(idx) => idx,
            None => {
                self.document_buckets.push(DocumentBucket::new(
                    &annotation.document_id,
                    annotation.document.as_ref(),
                ));
                self.document_buckets.len() - 1
            }
        };
        self.document_buckets[idx].append(annotation);
    }
}

/// Produces the timeframe an annotation should open
struct TimeframeGenerator {
    recent_cutoff: DateTime<Utc>,
}

impl TimeframeGenerator {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            recent_cutoff: now - Duration::days(7),
        }
    }

    fn next(&self, annotation: &Annotation) -> Timeframe<Annotation> {
        if annotation.updated >= self.recent_cutoff {
            return Timeframe::new(LAST_7_DAYS, self.recent_cutoff);
        }

        let updated = annotation.updated;
        let cutoff = Utc
            .with_ymd_and_hms(updated.year(), updated.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(updated);
        Timeframe::new(updated.format("%b %Y").to_string(), cutoff)
    }
}

/// Split annotations, newest first, into timeframes and document buckets
pub fn bucket(annotations: Vec<Annotation>, now: DateTime<Utc>) -> Vec<Timeframe<Annotation>> {
    let generator = TimeframeGenerator::new(now);
    let mut timeframes: Vec<Timeframe<Annotation>> = Vec::new();

    for annotation in annotations {
        match timeframes.last_mut() {
            Some(current) if current.within_cutoff(&annotation) => current.append(annotation),
            _ => {
                let mut timeframe = generator.next(&annotation);
                timeframe.append(annotation);
                timeframes.push(timeframe);
            }
        }
    }

    timeframes
}

/// Host part of a URI, or `Local file` for `file:` URIs
pub fn domain_of(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return String::new();
    };
    if scheme.eq_ignore_ascii_case("file") {
        return LOCAL_FILE.to_string();
    }
    let Some(rest) = rest.strip_prefix("//") else {
        return String::new();
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    host.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn ann(id: &str, doc: &str, updated: DateTime<Utc>) -> Annotation {
        Annotation::new(id, "acct:jane@example.com", "__world__", doc)
            .at(updated)
            .document(Document::new(doc, format!("https://example.com/{}", doc)).with_title(doc))
    }

    #[test]
    fn test_empty_input() {
        assert!(bucket(Vec::new(), now()).is_empty());
    }

    #[test]
    fn test_recent_annotations_share_one_timeframe() {
        let anns = vec![
            ann("a3", "d1", now() - Duration::hours(1)),
            ann("a2", "d2", now() - Duration::days(2)),
            ann("a1", "d1", now() - Duration::days(6)),
        ];

        let timeframes = bucket(anns, now());
        assert_eq!(timeframes.len(), 1);
        assert_eq!(timeframes[0].label, LAST_7_DAYS);
        assert_eq!(timeframes[0].document_ids(), vec!["d1", "d2"]);

        let d1: Vec<&str> = timeframes[0]
            .get("d1")
            .unwrap()
            .annotations
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(d1, vec!["a3", "a1"]);
    }

    #[test]
    fn test_older_annotations_bucket_by_month() {
        let anns = vec![
            ann("a4", "d1", now() - Duration::days(1)),
            ann("a3", "d1", Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
            ann("a2", "d2", Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap()),
            ann("a1", "d2", Utc.with_ymd_and_hms(2023, 11, 5, 9, 0, 0).unwrap()),
        ];

        let timeframes = bucket(anns, now());
        let labels: Vec<&str> = timeframes.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec![LAST_7_DAYS, "Mar 2024", "Feb 2024", "Nov 2023"]);
        assert_eq!(
            timeframes[1].cutoff,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_only_old_annotations() {
        let anns = vec![ann("a1", "d1", Utc.with_ymd_and_hms(2020, 1, 31, 23, 0, 0).unwrap())];
        let timeframes = bucket(anns, now());
        assert_eq!(timeframes.len(), 1);
        assert_eq!(timeframes[0].label, "Jan 2020");
    }

    #[test]
    fn test_bucket_metadata() {
        let anns = vec![
            ann("a2", "d1", now()).tag("foo"),
            Annotation::new("a1", "acct:bob@example.com", "__world__", "d1")
                .tag("bar")
                .tag("foo")
                .at(now() - Duration::hours(2)),
        ];

        let timeframes = bucket(anns, now());
        let b = timeframes[0].get("d1").unwrap();
        assert_eq!(b.title, "d1");
        assert_eq!(b.domain, "example.com");
        assert_eq!(b.tags.iter().collect::<Vec<_>>(), vec!["bar", "foo"]);
        assert_eq!(b.users.iter().collect::<Vec<_>>(), vec!["bob", "jane"]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_title_fallbacks() {
        let no_title = Annotation::new("a1", "acct:x@y", "g", "d1")
            .document(Document::new("d1", "https://example.com/page"));
        let no_doc = Annotation::new("a2", "acct:x@y", "g", "d2");

        let timeframes = bucket(vec![no_title, no_doc], Utc::now());
        assert_eq!(timeframes[0].get("d1").unwrap().title, "https://example.com/page");
        assert_eq!(timeframes[0].get("d2").unwrap().title, UNTITLED_DOCUMENT);
        assert_eq!(timeframes[0].get("d2").unwrap().domain, "");
    }

    #[test]
    fn test_map_preserves_structure() {
        let anns = vec![ann("a2", "d1", now()), ann("a1", "d2", now())];
        let timeframes: Vec<Timeframe<String>> = bucket(anns, now())
            .into_iter()
            .map(|t| t.map(|a| a.id))
            .collect();

        assert_eq!(timeframes[0].document_ids(), vec!["d1", "d2"]);
        let ids: Vec<&String> = timeframes[0].annotations().collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://Example.com/a?b#c"), "example.com");
        assert_eq!(domain_of("http://user@host:8080/x"), "host:8080");
        assert_eq!(domain_of("file:///home/me/paper.pdf"), LOCAL_FILE);
        assert_eq!(domain_of("urn:x-pdf:abc"), "");
        assert_eq!(domain_of(""), "");
    }
}
