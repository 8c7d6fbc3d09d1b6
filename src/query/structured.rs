//! Structured query representation
//!
//! A parsed search query is an ordered multimap: each term key (`tag`,
//! `group`, `user`, `any`, ...) may appear zero, one or many times, and the
//! relative order of all `(key, value)` entries is kept so that serializing
//! the query back to text reproduces the user's term order.

use serde::{Deserialize, Serialize};

/// Term key that forces a single group scope
pub const GROUP_KEY: &str = "group";

/// Term key that forces a single user scope
pub const USER_KEY: &str = "user";

/// Term key used for free-text terms without a recognized field
pub const ANY_KEY: &str = "any";

/// Ordered multimap from term key to values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    entries: Vec<(String, String)>,
}

impl StructuredQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: append a term
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Append a value for `key`, keeping any existing values
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Replace every value for `key` with a single `value`.
    ///
    /// Existing entries are removed and the new entry goes to the end.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.entries.push((key, value.into()));
    }

    /// All values for `key`, in query order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of values for `key`
    pub fn count_of(&self, key: &str) -> usize {
        self.entries.iter().filter(|(k, _)| k == key).count()
    }

    /// True when `key` has exactly one value
    pub fn is_single_entry(&self, key: &str) -> bool {
        self.count_of(key) == 1
    }

    /// Remove and return the value for `key` if it is a single entry.
    ///
    /// Leaves the query untouched when `key` has zero or several values.
    pub fn pop_single(&mut self, key: &str) -> Option<String> {
        if !self.is_single_entry(key) {
            return None;
        }
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Remove every value for `key`, returning how many were removed
    pub fn remove(&mut self, key: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        before - self.entries.len()
    }

    /// Iterate over `(key, value)` entries in query order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct keys in first-appearance order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.entries {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the query has no terms
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for StructuredQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_all_preserves_order() {
        let q = StructuredQuery::new()
            .with("tag", "a")
            .with("user", "jane")
            .with("tag", "b");

        assert_eq!(q.get_all("tag"), vec!["a", "b"]);
        assert_eq!(q.count_of("tag"), 2);
        assert_eq!(q.count_of("group"), 0);
        assert_eq!(q.get("user"), Some("jane"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let q = StructuredQuery::new().with("Group", "abc");
        assert_eq!(q.count_of("group"), 0);
        assert_eq!(q.count_of("Group"), 1);
    }

    #[test]
    fn test_set_replaces_all_values() {
        let mut q = StructuredQuery::new()
            .with("group", "one")
            .with("tag", "foo")
            .with("group", "two");

        q.set("group", "three");

        assert_eq!(q.get_all("group"), vec!["three"]);
        let entries: Vec<_> = q.iter().collect();
        assert_eq!(entries, vec![("tag", "foo"), ("group", "three")]);
    }

    #[test]
    fn test_pop_single() {
        let mut q = StructuredQuery::new().with("group", "abc").with("tag", "foo");
        assert_eq!(q.pop_single("group"), Some("abc".to_string()));
        assert_eq!(q.count_of("group"), 0);
        assert_eq!(q.len(), 1);

        assert_eq!(q.pop_single("group"), None);
    }

    #[test]
    fn test_pop_single_ignores_multiple_values() {
        let mut q = StructuredQuery::new().with("user", "a").with("user", "b");
        assert_eq!(q.pop_single("user"), None);
        assert_eq!(q.count_of("user"), 2);
    }

    #[test]
    fn test_remove_and_keys() {
        let mut q: StructuredQuery = vec![("tag", "a"), ("any", "x"), ("tag", "b")]
            .into_iter()
            .collect();
        assert_eq!(q.keys(), vec!["tag", "any"]);
        assert_eq!(q.remove("tag"), 2);
        assert_eq!(q.keys(), vec!["any"]);
        assert!(!q.is_empty());
    }
}
