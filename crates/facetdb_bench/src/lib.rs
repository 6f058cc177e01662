//! Benchmark utilities for facetdb.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use facetdb_core::{Database, Fields, IndexOptions, Value};

/// Builds a record with a distinct `diff` value, a shared `common` value,
/// and a fixed-size payload field.
pub fn bench_record(diff: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("diff".to_string(), Value::from(diff));
    fields.insert("common".to_string(), Value::from(0));
    fields.insert("payload".to_string(), Value::from("x".repeat(64)));
    fields
}

/// Opens an in-memory database seeded with `records` entries, optionally
/// with `diff` and `common` indexes registered up front.
pub fn seeded_db(records: i64, indexed: bool) -> Database {
    let db = Database::open_in_memory().unwrap();
    if indexed {
        db.create_index("diff", IndexOptions::new()).unwrap();
        db.create_index("common", IndexOptions::new()).unwrap();
    }
    for i in 0..records {
        db.put(&format!("key{i}"), &bench_record(i)).unwrap();
    }
    db
}
