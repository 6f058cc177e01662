//! Test fixtures and database helpers.

use facetdb_core::{Database, Fields, Value};
use std::sync::Arc;

/// Opens a fresh in-memory database.
pub fn memory_db() -> Database {
    Database::open_in_memory().expect("failed to open in-memory database")
}

/// Opens a database alongside a handle to its raw store, so tests can
/// inspect or seed the underlying entries.
pub fn memory_db_with_store() -> (Database, Arc<facetdb_store::MemoryStore>) {
    let store = Arc::new(facetdb_store::MemoryStore::new());
    let db = Database::open_with_store(store.clone())
        .expect("failed to open database over memory store");
    (db, store)
}

/// Runs a test against a temporary file-backed database.
///
/// The directory is removed when the closure returns.
pub fn with_temp_db<F: FnOnce(&Database)>(f: F) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db = Database::open(&dir.path().join("db")).expect("failed to open temp database");
    f(&db);
}

/// Builds a record from field-name/value pairs.
pub fn record(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

/// Builds a record of integer fields, the shape most tests use.
pub fn int_record(pairs: &[(&str, i64)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), Value::from(*value)))
        .collect()
}

/// A small fixed dataset: four records sharing a `common` field, each
/// with a distinct `diff` value and one unique extra field.
pub fn sample_records() -> Vec<(String, Fields)> {
    vec![
        (
            "key1".to_string(),
            int_record(&[("diff", 1), ("foo", 2), ("common", 0)]),
        ),
        (
            "key2".to_string(),
            int_record(&[("diff", 2), ("bar", 4), ("common", 0)]),
        ),
        (
            "key3".to_string(),
            int_record(&[("diff", 3), ("baz", 6), ("common", 0)]),
        ),
        (
            "key4".to_string(),
            int_record(&[("diff", 4), ("qux", 8), ("common", 0)]),
        ),
    ]
}

/// Writes the sample dataset into a database.
pub fn seed_sample_records(db: &Database) {
    for (key, fields) in sample_records() {
        db.put(&key, &fields).expect("failed to seed record");
    }
}
