//! # facetdb core
//!
//! Secondary-indexing engine over an ordered key-value store.
//!
//! The engine lets callers register indexes over record fields, query
//! records by exact field-value combinations without a full scan, and
//! rebuild indexes from scratch when data or definitions change.
//!
//! Internally it is a handful of small components over one
//! [`facetdb_store::KvStore`]:
//!
//! - **keys**: the reserved-key encoding that makes index names and
//!   postings keys deterministic
//! - **registry**: which indexes exist, persisted as reserved entries
//! - **indexer**: postings maintenance on every write, with all-or-nothing
//!   unique enforcement
//! - **query**: postings lookup and record hydration
//! - **lifecycle**: index creation with backfill, removal, reindexing
//!
//! [`Database`] wires them together behind a single handle.
//!
//! ## Example
//!
//! ```
//! use facetdb_core::{Database, Fields, IndexOptions, Value};
//!
//! let db = Database::open_in_memory().unwrap();
//!
//! let mut record = Fields::new();
//! record.insert("city".to_string(), Value::from("Dodoma"));
//! record.insert("name".to_string(), Value::from("Asha"));
//! db.put("person:1", &record).unwrap();
//!
//! db.create_index("city", IndexOptions::new()).unwrap();
//!
//! let mut query = Fields::new();
//! query.insert("city".to_string(), Value::from("Dodoma"));
//! let matches = db.find(&query).unwrap();
//! assert!(matches.contains_key("person:1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod config;
mod database;
mod descriptor;
mod error;
mod indexer;
mod keys;
mod lifecycle;
mod query;
mod registry;

pub use cancel::CancelToken;
pub use config::Config;
pub use database::Database;
pub use descriptor::{IndexDescriptor, IndexMeta, IndexSpec, RegisteredIndex};
pub use error::{EngineError, EngineResult};
pub use keys::{
    descriptor_from_registration_key, is_reserved, postings_key, postings_prefix,
    registration_key, RESERVED_PREFIX,
};
pub use lifecycle::IndexOptions;

// Re-exported so callers can build records without importing the codec
// crate directly.
pub use facetdb_codec::{Fields, Value};
