//! Group slug blacklist
//!
//! A process-wide set of slugs that group names may not use. The list is
//! read from a text file (one slug per line) once, either at startup via
//! [`init`] or lazily on first [`global`] access, and is read-only after
//! that. [`reload`] and [`install`] replace it explicitly.
//!
//! A missing or unreadable file is logged and treated as an empty list, so
//! a broken deployment never blocks group creation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Blacklist location used when nothing was configured
pub const DEFAULT_BLACKLIST_PATH: &str = "groups/blacklist";

static SLUG_BLACKLIST: RwLock<Option<Arc<Blacklist>>> = RwLock::new(None);

/// Set of reserved slugs, stored trimmed and lowercased
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    slugs: HashSet<String>,
}

impl Blacklist {
    /// Build from raw entries; blank entries are skipped
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slugs = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { slugs }
    }

    /// Read a blacklist file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(content.lines()))
    }

    /// Read a blacklist file, falling back to an empty list on failure
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(blacklist) => {
                tracing::info!(
                    entries = blacklist.len(),
                    "Loaded group slug blacklist from {:?}",
                    path
                );
                blacklist
            }
            Err(e) => {
                tracing::error!("Unable to load group slug blacklist from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// True if `slug` is reserved
    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.contains(&slug.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

/// The process-wide blacklist, loading the default file on first use
pub fn global() -> Arc<Blacklist> {
    if let Some(blacklist) = SLUG_BLACKLIST
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(blacklist);
    }
    init(Path::new(DEFAULT_BLACKLIST_PATH))
}

/// Load the blacklist from `path` unless one is already in place
pub fn init(path: &Path) -> Arc<Blacklist> {
    let mut slot = SLUG_BLACKLIST
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    match slot.as_ref() {
        Some(blacklist) => Arc::clone(blacklist),
        None => {
            let blacklist = Arc::new(Blacklist::load_or_empty(path));
            *slot = Some(Arc::clone(&blacklist));
            blacklist
        }
    }
}

/// Replace the process-wide blacklist with the contents of `path`
pub fn reload(path: &Path) -> Arc<Blacklist> {
    install(Blacklist::load_or_empty(path))
}

/// Replace the process-wide blacklist
pub fn install(blacklist: Blacklist) -> Arc<Blacklist> {
    let blacklist = Arc::new(blacklist);
    *SLUG_BLACKLIST
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&blacklist));
    blacklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_new_normalizes_entries() {
        let blacklist = Blacklist::new(["  Admin ", "", "support\r", "   "]);
        assert_eq!(blacklist.len(), 2);
        assert!(blacklist.contains("admin"));
        assert!(blacklist.contains("SUPPORT"));
        assert!(!blacklist.contains("readers"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blacklist");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "admin\nstaff\n\nhelp").unwrap();

        let blacklist = Blacklist::load(&path).unwrap();
        assert_eq!(blacklist.len(), 3);
        assert!(blacklist.contains("staff"));
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let blacklist = Blacklist::load_or_empty(&dir.path().join("missing"));
        assert!(blacklist.is_empty());
    }

    #[test]
    fn test_invalid_utf8_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blacklist");
        std::fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
        assert!(Blacklist::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_global_lifecycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blacklist");
        std::fs::write(&path, "admin\n").unwrap();

        install(Blacklist::new(["first"]));
        assert!(global().contains("first"));

        // init does not replace an installed list
        init(&path);
        assert!(global().contains("first"));

        reload(&path);
        assert!(global().contains("admin"));
        assert!(!global().contains("first"));
    }
}
