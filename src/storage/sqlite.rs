//! SQLite record store
//!
//! Holds groups, documents and annotations in a single SQLite file. Tags and
//! document titles are stored as JSON arrays so one row carries the whole
//! record and hydration never needs a query per annotation.
//!
//! # Hydration
//! - `fetch_annotations`: one query for the annotations, one batched query
//!   for all of their documents
//! - `fetch_groups`: one query for every requested pubid

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{Annotation, Dataset, Document, Group};
use crate::storage::AnnotationStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS groups (
        pubid TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        uri TEXT NOT NULL,
        titles TEXT NOT NULL DEFAULT '[]'
    );

    CREATE TABLE IF NOT EXISTS annotations (
        id TEXT PRIMARY KEY,
        userid TEXT NOT NULL,
        groupid TEXT NOT NULL,
        document_id TEXT NOT NULL,
        parent_id TEXT,
        text TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        shared INTEGER NOT NULL DEFAULT 1,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_annotations_updated ON annotations(updated);
    CREATE INDEX IF NOT EXISTS idx_annotations_groupid ON annotations(groupid);
    CREATE INDEX IF NOT EXISTS idx_annotations_userid ON annotations(userid);
    CREATE INDEX IF NOT EXISTS idx_documents_uri ON documents(uri);
";

/// Counts reported by a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub groups: usize,
    pub documents: usize,
    pub annotations: usize,
}

/// SQLite-backed store for annotations, documents and groups
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Create or open a database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Self::with_connection(conn, Some(path.to_path_buf()))?;
        tracing::info!("Opened annotation database at {:?}", path);
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Cheap liveness check used by readiness probes
    pub fn ping(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Total number of stored annotations
    pub fn annotation_count(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Insert or replace a group
    pub fn insert_group(&self, group: &Group) -> StorageResult<()> {
        let conn = self.conn()?;
        insert_group(&conn, group)
    }

    /// Insert or replace a document
    pub fn insert_document(&self, document: &Document) -> StorageResult<()> {
        let conn = self.conn()?;
        insert_document(&conn, document)
    }

    /// Insert or replace an annotation.
    ///
    /// An attached `document` is stored as well.
    pub fn insert_annotation(&self, annotation: &Annotation) -> StorageResult<()> {
        let conn = self.conn()?;
        if let Some(document) = &annotation.document {
            insert_document(&conn, document)?;
        }
        insert_annotation(&conn, annotation)
    }

    /// Import a dataset in a single transaction
    pub fn import(&self, dataset: &Dataset) -> StorageResult<ImportStats> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for group in &dataset.groups {
            insert_group(&tx, group)?;
        }
        for document in &dataset.documents {
            insert_document(&tx, document)?;
        }
        for annotation in &dataset.annotations {
            if let Some(document) = &annotation.document {
                insert_document(&tx, document)?;
            }
            insert_annotation(&tx, annotation)?;
        }

        tx.commit()?;

        let stats = ImportStats {
            groups: dataset.groups.len(),
            documents: dataset.documents.len(),
            annotations: dataset.annotations.len(),
        };
        tracing::info!(
            groups = stats.groups,
            documents = stats.documents,
            annotations = stats.annotations,
            "Imported dataset"
        );
        Ok(stats)
    }

    /// Load documents by id with a single query
    fn fetch_documents(
        conn: &Connection,
        ids: &BTreeSet<&str>,
    ) -> StorageResult<HashMap<String, Document>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, uri, titles FROM documents WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut documents = HashMap::with_capacity(rows.len());
        for (id, uri, titles) in rows {
            let titles: Vec<String> = serde_json::from_str(&titles)?;
            documents.insert(id.clone(), Document { id, uri, titles });
        }
        Ok(documents)
    }
}

impl AnnotationStore for Database {
    fn fetch_annotations(&self, ids: &[String]) -> StorageResult<Vec<Annotation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT id, userid, groupid, document_id, parent_id, text, tags, shared, created, updated
             FROM annotations
             WHERE id IN ({})
             ORDER BY updated DESC, id ASC",
            placeholders(ids.len())
        );

        let rows = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(ids.iter()), |row| {
                    Ok(AnnotationRow {
                        id: row.get(0)?,
                        userid: row.get(1)?,
                        groupid: row.get(2)?,
                        document_id: row.get(3)?,
                        parent_id: row.get(4)?,
                        text: row.get(5)?,
                        tags: row.get(6)?,
                        shared: row.get(7)?,
                        created: row.get(8)?,
                        updated: row.get(9)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let document_ids: BTreeSet<&str> = rows.iter().map(|r| r.document_id.as_str()).collect();
        let documents = Self::fetch_documents(&conn, &document_ids)?;

        let mut annotations = Vec::with_capacity(rows.len());
        for row in rows {
            let document = documents.get(&row.document_id).cloned();
            if document.is_none() {
                tracing::warn!(
                    annotation = %row.id,
                    document = %row.document_id,
                    "Annotation references a missing document"
                );
            }
            let mut annotation = row.into_annotation()?;
            annotation.document = document;
            annotations.push(annotation);
        }

        tracing::debug!(
            requested = ids.len(),
            found = annotations.len(),
            "Hydrated annotations"
        );
        Ok(annotations)
    }

    fn fetch_groups(&self, pubids: &[String]) -> StorageResult<Vec<Group>> {
        if pubids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT pubid, name, description FROM groups WHERE pubid IN ({})",
            placeholders(pubids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let groups = stmt
            .query_map(params_from_iter(pubids.iter()), |row| {
                Ok(Group {
                    pubid: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }
}

/// Raw annotation columns before JSON and timestamp decoding
struct AnnotationRow {
    id: String,
    userid: String,
    groupid: String,
    document_id: String,
    parent_id: Option<String>,
    text: String,
    tags: String,
    shared: bool,
    created: i64,
    updated: i64,
}

impl AnnotationRow {
    fn into_annotation(self) -> StorageResult<Annotation> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)?;
        let created = from_millis(&self.id, self.created)?;
        let updated = from_millis(&self.id, self.updated)?;

        Ok(Annotation {
            id: self.id,
            userid: self.userid,
            groupid: self.groupid,
            document_id: self.document_id,
            parent_id: self.parent_id,
            text: self.text,
            tags,
            shared: self.shared,
            created,
            updated,
            document: None,
        })
    }
}

fn from_millis(id: &str, millis: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StorageError::Corruption {
        id: id.to_string(),
        reason: format!("timestamp out of range: {}", millis),
    })
}

/// `?, ?, ?` for an IN list of `n` values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn insert_group(conn: &Connection, group: &Group) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO groups (pubid, name, description) VALUES (?, ?, ?)",
        params![group.pubid, group.name, group.description],
    )?;
    Ok(())
}

fn insert_document(conn: &Connection, document: &Document) -> StorageResult<()> {
    let titles = serde_json::to_string(&document.titles)?;
    conn.execute(
        "INSERT OR REPLACE INTO documents (id, uri, titles) VALUES (?, ?, ?)",
        params![document.id, document.uri, titles],
    )?;
    Ok(())
}

fn insert_annotation(conn: &Connection, annotation: &Annotation) -> StorageResult<()> {
    let tags = serde_json::to_string(&annotation.tags)?;
    conn.execute(
        "INSERT OR REPLACE INTO annotations
             (id, userid, groupid, document_id, parent_id, text, tags, shared, created, updated)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            annotation.id,
            annotation.userid,
            annotation.groupid,
            annotation.document_id,
            annotation.parent_id,
            annotation.text,
            tags,
            annotation.shared,
            annotation.created.timestamp_millis(),
            annotation.updated.timestamp_millis(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_group(&Group::new("abc123", "Readers")).unwrap();
        db.insert_document(&Document::new("d1", "https://example.com/a").with_title("Page A"))
            .unwrap();
        db.insert_document(&Document::new("d2", "https://example.com/b")).unwrap();

        db.insert_annotation(
            &Annotation::new("a1", "acct:jane@example.com", "abc123", "d1")
                .tag("foo")
                .at(base_time()),
        )
        .unwrap();
        db.insert_annotation(
            &Annotation::new("a2", "acct:bob@example.com", "abc123", "d2")
                .at(base_time() + Duration::hours(1)),
        )
        .unwrap();
        db.insert_annotation(
            &Annotation::new("a3", "acct:bob@example.com", "abc123", "d1")
                .at(base_time() - Duration::hours(1)),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("marginalia.db");
        let db = Database::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(db.annotation_count().unwrap(), 0);
        db.ping().unwrap();
    }

    #[test]
    fn test_fetch_annotations_orders_by_updated_desc() {
        let db = seeded();
        let ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];

        let annotations = db.fetch_annotations(&ids).unwrap();
        let order: Vec<&str> = annotations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["a2", "a1", "a3"]);
    }

    #[test]
    fn test_fetch_annotations_eager_loads_documents() {
        let db = seeded();
        let annotations = db.fetch_annotations(&["a1".to_string()]).unwrap();

        let doc = annotations[0].document.as_ref().unwrap();
        assert_eq!(doc.uri, "https://example.com/a");
        assert_eq!(doc.first_title(), Some("Page A"));
        assert_eq!(annotations[0].tags, vec!["foo"]);
        assert_eq!(annotations[0].updated, base_time());
    }

    #[test]
    fn test_fetch_missing_ids() {
        let db = seeded();
        assert!(db.fetch_annotations(&[]).unwrap().is_empty());
        assert!(db.fetch_annotations(&["nope".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_groups() {
        let db = seeded();
        let groups = db
            .fetch_groups(&["abc123".to_string(), "deleted".to_string()])
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Readers");
    }

    #[test]
    fn test_import_dataset() {
        let db = Database::open_in_memory().unwrap();
        let dataset = Dataset {
            groups: vec![Group::new("g1", "One")],
            documents: vec![],
            annotations: vec![Annotation::new("a1", "acct:jane@example.com", "g1", "d1")
                .document(Document::new("d1", "https://example.com"))],
        };

        let stats = db.import(&dataset).unwrap();
        assert_eq!(stats.annotations, 1);
        assert_eq!(db.annotation_count().unwrap(), 1);

        let fetched = db.fetch_annotations(&["a1".to_string()]).unwrap();
        assert!(fetched[0].document.is_some());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
