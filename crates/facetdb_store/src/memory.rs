//! In-memory store for testing and ephemeral data.

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value store.
///
/// Keys are held in a sorted map, so `scan` order matches what a
/// persistent store would produce. Suitable for:
/// - Unit and integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn memory_put_then_get() {
        let store = MemoryStore::new();
        store.put("alpha", b"one").unwrap();

        assert_eq!(store.get("alpha").unwrap(), b"one");
    }

    #[test]
    fn memory_put_overwrites() {
        let store = MemoryStore::new();
        store.put("alpha", b"one").unwrap();
        store.put("alpha", b"two").unwrap();

        assert_eq!(store.get("alpha").unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_get_missing_fails() {
        let store = MemoryStore::new();
        let result = store.get("missing");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn memory_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("alpha", b"one").unwrap();

        store.delete("alpha").unwrap();
        store.delete("alpha").unwrap();

        assert!(store.get("alpha").is_err());
    }

    #[test]
    fn memory_scan_is_ascending() {
        let store = MemoryStore::new();
        store.put("charlie", b"3").unwrap();
        store.put("alpha", b"1").unwrap();
        store.put("bravo", b"2").unwrap();

        let keys: Vec<String> = store.scan().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn memory_scan_is_a_snapshot() {
        let store = MemoryStore::new();
        store.put("alpha", b"1").unwrap();

        let snapshot = store.scan().unwrap();
        store.put("bravo", b"2").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.scan().unwrap().len(), 2);
    }
}
