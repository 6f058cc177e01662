//! Key-value store trait definition.

use crate::error::StoreResult;

/// An ordered key-value store consumed by the facetdb engine.
///
/// Stores are **opaque byte maps** keyed by strings. They provide atomic
/// single-key operations and a whole-namespace snapshot scan. The engine
/// owns all value interpretation and all key-namespace conventions —
/// stores do not understand records, postings, or index registrations.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last `put` under that key
/// - `delete` is idempotent: deleting an absent key succeeds
/// - `scan` returns a consistent snapshot, ascending by key, covering the
///   whole namespace; iterating it never observes a concurrent write
/// - Stores must be `Send + Sync`; all methods take `&self` and
///   synchronize internally
///
/// # Implementors
///
/// - [`super::MemoryStore`] - for testing and ephemeral data
/// - [`super::FileStore`] - log-backed persistent storage
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent, or an I/O error from the
    /// backing medium.
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes `key` if present. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be made durable.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns a snapshot of every entry, ascending by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>>;
}
