//! Reserved-key encoding for index metadata and postings.
//!
//! Everything the engine persists besides records lives under a reserved
//! namespace so a full-store scan can tell records and metadata apart:
//!
//! ```text
//! ~index~["common","diff"]        registration (value: IndexMeta)
//! ~value~["common","diff"]~[0,1]  postings entry (value: Vec<record key>)
//! ~trace~key1                     per-record trace (value: registration -> postings key)
//! ```
//!
//! Field lists and value tuples are rendered with the codec's canonical
//! text form, so equal descriptors and equal tuples always produce equal
//! keys.

use crate::descriptor::IndexDescriptor;
use crate::error::{EngineError, EngineResult};
use facetdb_codec::{to_canonical_text, Value};

/// Leading marker of the reserved namespace. User record keys must not
/// start with it.
pub const RESERVED_PREFIX: &str = "~";

const INDEX_NS: &str = "~index~";
const VALUE_NS: &str = "~value~";
const TRACE_NS: &str = "~trace~";

/// Returns true if the key belongs to the reserved metadata namespace.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// The prefix shared by all registration keys.
pub(crate) fn registration_prefix() -> &'static str {
    INDEX_NS
}

/// The registration key for a descriptor.
pub fn registration_key(descriptor: &IndexDescriptor) -> EngineResult<String> {
    Ok(format!("{INDEX_NS}{}", to_canonical_text(&descriptor.fields())?))
}

/// The key prefix under which all of a descriptor's postings entries live.
///
/// The trailing separator keeps one index's range disjoint from every
/// other's, which is what makes prefix-ranged deletion safe.
pub fn postings_prefix(descriptor: &IndexDescriptor) -> EngineResult<String> {
    Ok(format!(
        "{VALUE_NS}{}~",
        to_canonical_text(&descriptor.fields())?
    ))
}

/// The postings key for a concrete value tuple under a descriptor.
///
/// `tuple` must be in descriptor field order; [`IndexDescriptor::tuple`]
/// produces it.
pub fn postings_key(descriptor: &IndexDescriptor, tuple: &[Value]) -> EngineResult<String> {
    Ok(format!(
        "{}{}",
        postings_prefix(descriptor)?,
        to_canonical_text(&tuple)?
    ))
}

/// The trace key for a record.
pub(crate) fn trace_key(record_key: &str) -> String {
    format!("{TRACE_NS}{record_key}")
}

/// If `key` is a trace key, returns the record key it belongs to.
pub(crate) fn trace_record_key(key: &str) -> Option<&str> {
    key.strip_prefix(TRACE_NS)
}

/// Recovers the descriptor from a registration key.
///
/// # Errors
///
/// Returns `InvalidIndexSpec` if the key is not a well-formed registration
/// key.
pub fn descriptor_from_registration_key(key: &str) -> EngineResult<IndexDescriptor> {
    let Some(fields_text) = key.strip_prefix(INDEX_NS) else {
        return Err(EngineError::invalid_index_spec(format!(
            "not a registration key: {key}"
        )));
    };
    let fields: Vec<String> = serde_json::from_str(fields_text).map_err(|e| {
        EngineError::invalid_index_spec(format!("unreadable registration key {key}: {e}"))
    })?;
    IndexDescriptor::canonicalize(fields)
}
