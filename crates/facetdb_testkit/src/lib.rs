//! # facetdb testkit
//!
//! Test utilities for facetdb.
//!
//! This crate provides:
//! - Database fixtures and sample datasets
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use facetdb_testkit::prelude::*;
//! use facetdb_core::IndexOptions;
//!
//! let db = memory_db();
//! seed_sample_records(&db);
//! db.create_index("common", IndexOptions::new()).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
