//! Core record types for the annotation store
//!
//! This module defines the rows the activity pipeline reads:
//! - `Annotation`: a single annotation, optionally a reply to another
//! - `Document`: the annotated page, with its known titles
//! - `Group`: the group an annotation was posted in
//! - `Dataset`: a bundle of all three, used for bulk imports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An annotated document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    /// Canonical URI of the document
    pub uri: String,
    /// Titles found in the document metadata, most authoritative first
    #[serde(default)]
    pub titles: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            titles: Vec::new(),
        }
    }

    /// Builder method: add a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(title.into());
        self
    }

    /// First non-blank title, if any
    pub fn first_title(&self) -> Option<&str> {
        self.titles
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }
}

/// A single annotation
///
/// `document` is only populated by batched hydration; search results carry
/// ids alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: String,
    /// Owner, formatted as `acct:<username>@<authority>`
    pub userid: String,
    /// Public id of the owning group
    pub groupid: String,
    pub document_id: String,
    /// Set for replies; top-level annotations have no parent
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_shared")]
    pub shared: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

fn default_shared() -> bool {
    true
}

impl Annotation {
    /// Create a new top-level annotation stamped with the current time
    pub fn new(
        id: impl Into<String>,
        userid: impl Into<String>,
        groupid: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            userid: userid.into(),
            groupid: groupid.into(),
            document_id: document_id.into(),
            parent_id: None,
            text: String::new(),
            tags: Vec::new(),
            shared: true,
            created: now,
            updated: now,
            document: None,
        }
    }

    /// Builder method: set the body text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder method: add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder method: set both created and updated timestamps
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created = timestamp;
        self.updated = timestamp;
        self
    }

    /// Builder method: set the updated timestamp
    pub fn updated(mut self, timestamp: DateTime<Utc>) -> Self {
        self.updated = timestamp;
        self
    }

    /// Builder method: mark as a reply
    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder method: set sharing
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Builder method: attach the hydrated document
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// True when this annotation is not a reply
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Username part of the userid
    pub fn username(&self) -> &str {
        username_from_userid(&self.userid)
    }
}

/// Extract `jane` from `acct:jane@example.com`.
///
/// Values that are not account ids are returned unchanged.
pub fn username_from_userid(userid: &str) -> &str {
    match userid.strip_prefix("acct:") {
        Some(rest) => rest.split('@').next().unwrap_or(rest),
        None => userid,
    }
}

/// A discussion group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    /// Public identifier used in URLs and `group:` terms
    pub pubid: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Group {
    pub fn new(pubid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pubid: pubid.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Builder method: set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Bulk import bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_from_userid() {
        assert_eq!(username_from_userid("acct:jane@example.com"), "jane");
        assert_eq!(username_from_userid("acct:bob"), "bob");
        assert_eq!(username_from_userid("jane"), "jane");
    }

    #[test]
    fn test_annotation_builder() {
        let ann = Annotation::new("a1", "acct:jane@example.com", "abc123", "d1")
            .text("hello")
            .tag("foo")
            .tag("bar")
            .reply_to("a0");

        assert_eq!(ann.username(), "jane");
        assert_eq!(ann.tags, vec!["foo", "bar"]);
        assert!(!ann.is_top_level());
        assert!(ann.document.is_none());
    }

    #[test]
    fn test_document_first_title_skips_blank() {
        let doc = Document::new("d1", "https://example.com")
            .with_title("  ")
            .with_title("Example");
        assert_eq!(doc.first_title(), Some("Example"));
        assert_eq!(Document::new("d2", "x").first_title(), None);
    }

    #[test]
    fn test_dataset_deserialize_defaults() {
        let json = r#"{
            "annotations": [{
                "id": "a1",
                "userid": "acct:jane@example.com",
                "groupid": "__world__",
                "document_id": "d1",
                "created": "2024-01-15T10:30:00Z",
                "updated": "2024-01-15T10:30:00Z"
            }]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(dataset.groups.is_empty());
        let ann = &dataset.annotations[0];
        assert!(ann.shared);
        assert!(ann.is_top_level());
        assert!(ann.tags.is_empty());
    }
}
