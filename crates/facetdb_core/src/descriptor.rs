//! Index descriptors and the index-spec input type.

use crate::error::{EngineError, EngineResult};
use facetdb_codec::{Fields, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How callers name an index at the API boundary.
///
/// Accepts a single field, a field list, or an example value map whose
/// keys are the field set. A spec is resolved exactly once, into an
/// [`IndexDescriptor`]; everything past the boundary works on the
/// canonical form only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// A single field name.
    Field(String),
    /// An explicit list of field names, in any order, duplicates allowed.
    Fields(Vec<String>),
    /// A value map whose keys are taken as the field set.
    Example(Fields),
}

impl From<&str> for IndexSpec {
    fn from(field: &str) -> Self {
        IndexSpec::Field(field.to_string())
    }
}

impl From<String> for IndexSpec {
    fn from(field: String) -> Self {
        IndexSpec::Field(field)
    }
}

impl From<Vec<String>> for IndexSpec {
    fn from(fields: Vec<String>) -> Self {
        IndexSpec::Fields(fields)
    }
}

impl From<Vec<&str>> for IndexSpec {
    fn from(fields: Vec<&str>) -> Self {
        IndexSpec::Fields(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for IndexSpec {
    fn from(fields: &[&str]) -> Self {
        IndexSpec::Fields(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

impl From<&Fields> for IndexSpec {
    fn from(example: &Fields) -> Self {
        IndexSpec::Fields(example.keys().cloned().collect())
    }
}

impl From<Fields> for IndexSpec {
    fn from(example: Fields) -> Self {
        IndexSpec::Example(example)
    }
}

/// The canonical identity of one logical index: a deduplicated,
/// lexicographically sorted, non-empty list of field names.
///
/// Two descriptors are the same index iff their field lists are equal, so
/// the same logical index always encodes to the same registration key no
/// matter how its fields were supplied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexDescriptor {
    fields: Vec<String>,
}

impl IndexDescriptor {
    /// Resolves a spec into its canonical descriptor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndexSpec` if the field set is empty or contains an
    /// empty field name.
    pub fn canonicalize(spec: impl Into<IndexSpec>) -> EngineResult<Self> {
        let mut fields = match spec.into() {
            IndexSpec::Field(field) => vec![field],
            IndexSpec::Fields(fields) => fields,
            IndexSpec::Example(example) => example.keys().cloned().collect(),
        };
        fields.sort();
        fields.dedup();

        if fields.is_empty() {
            return Err(EngineError::invalid_index_spec("field set is empty"));
        }
        if fields.iter().any(String::is_empty) {
            return Err(EngineError::invalid_index_spec(
                "field names must be non-empty",
            ));
        }

        Ok(Self { fields })
    }

    /// The sorted field names.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns true if every indexed field is present in the record.
    #[must_use]
    pub fn matches(&self, record: &Fields) -> bool {
        self.fields.iter().all(|field| record.contains_key(field))
    }

    /// Extracts the record's value tuple in descriptor field order, or
    /// `None` if the record is missing any indexed field.
    #[must_use]
    pub fn tuple(&self, record: &Fields) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| record.get(field).cloned())
            .collect()
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(", "))
    }
}

/// Persisted metadata for one registered index.
///
/// The field list is recoverable from the registration key, so only the
/// uniqueness flag needs storing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Whether the index constrains each value tuple to one record.
    pub unique: bool,
}

/// A registered index as seen through the registry: canonical descriptor
/// plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredIndex {
    /// The canonical descriptor.
    pub descriptor: IndexDescriptor,
    /// Whether the index is unique.
    pub unique: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_sorts_and_dedups() {
        let descriptor =
            IndexDescriptor::canonicalize(vec!["diff", "common", "diff"]).unwrap();
        assert_eq!(descriptor.fields(), ["common", "diff"]);
    }

    #[test]
    fn single_field_and_list_agree() {
        let from_str = IndexDescriptor::canonicalize("diff").unwrap();
        let from_list = IndexDescriptor::canonicalize(vec!["diff"]).unwrap();
        assert_eq!(from_str, from_list);
    }

    #[test]
    fn example_map_uses_its_keys() {
        let mut example = Fields::new();
        example.insert("diff".to_string(), Value::from(1));
        example.insert("common".to_string(), Value::from(0));

        let from_borrowed = IndexDescriptor::canonicalize(&example).unwrap();
        let from_owned =
            IndexDescriptor::canonicalize(IndexSpec::Example(example)).unwrap();
        let from_list = IndexDescriptor::canonicalize(vec!["common", "diff"]).unwrap();
        assert_eq!(from_borrowed, from_list);
        assert_eq!(from_owned, from_list);
    }

    #[test]
    fn empty_spec_is_rejected() {
        let result = IndexDescriptor::canonicalize(Vec::<String>::new());
        assert!(matches!(
            result,
            Err(EngineError::InvalidIndexSpec { .. })
        ));
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let result = IndexDescriptor::canonicalize(vec![""]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidIndexSpec { .. })
        ));
    }

    #[test]
    fn tuple_follows_descriptor_order() {
        let descriptor = IndexDescriptor::canonicalize(vec!["diff", "common"]).unwrap();

        let mut record = Fields::new();
        record.insert("diff".to_string(), Value::from(1));
        record.insert("common".to_string(), Value::from(0));
        record.insert("extra".to_string(), Value::from(9));

        assert!(descriptor.matches(&record));
        // fields sort to [common, diff]
        assert_eq!(
            descriptor.tuple(&record).unwrap(),
            vec![Value::from(0), Value::from(1)]
        );
    }

    #[test]
    fn tuple_is_none_when_a_field_is_missing() {
        let descriptor = IndexDescriptor::canonicalize(vec!["diff", "common"]).unwrap();

        let mut record = Fields::new();
        record.insert("diff".to_string(), Value::from(1));

        assert!(!descriptor.matches(&record));
        assert!(descriptor.tuple(&record).is_none());
    }
}
