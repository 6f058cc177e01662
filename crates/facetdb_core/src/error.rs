//! Error types for the indexing engine.

use facetdb_codec::CodecError;
use facetdb_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in engine operations.
///
/// The engine performs no retries: store and codec failures propagate
/// unchanged. Absence is an ordinary outcome callers branch on, so
/// [`EngineError::is_not_found`] exists to keep those branches short.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The index spec could not be canonicalized.
    #[error("invalid index spec: {message}")]
    InvalidIndexSpec {
        /// Description of what was wrong with the spec.
        message: String,
    },

    /// An index over the same canonical field set is already registered.
    #[error("index on {fields:?} already exists")]
    IndexAlreadyExists {
        /// The canonical field set.
        fields: Vec<String>,
    },

    /// Missing record, missing postings entry, or a query against an
    /// unregistered index — the engine does not distinguish these.
    #[error("not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// A write would duplicate a value tuple under a unique index.
    /// The write was rejected and nothing was persisted.
    #[error("unique index violation on {fields:?}")]
    UniqueIndexViolation {
        /// The field set of the violated index.
        fields: Vec<String>,
    },

    /// A unique index cannot be created because existing records already
    /// share a value tuple. The registry is unchanged.
    #[error("cannot create unique index on {fields:?}: duplicate values exist")]
    NotUniqueIndexKey {
        /// The field set of the rejected index.
        fields: Vec<String>,
    },

    /// A user write targeted the reserved metadata namespace.
    #[error("key {key:?} is in the reserved metadata namespace")]
    ReservedKey {
        /// The offending key.
        key: String,
    },

    /// A long-running scan was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Creates an invalid index spec error.
    pub fn invalid_index_spec(message: impl Into<String>) -> Self {
        Self::InvalidIndexSpec {
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates an already-exists error for the given field set.
    pub fn index_already_exists(fields: &[String]) -> Self {
        Self::IndexAlreadyExists {
            fields: fields.to_vec(),
        }
    }

    /// Creates a unique violation error for the given field set.
    pub fn unique_index_violation(fields: &[String]) -> Self {
        Self::UniqueIndexViolation {
            fields: fields.to_vec(),
        }
    }

    /// Creates a not-unique error for the given field set.
    pub fn not_unique_index_key(fields: &[String]) -> Self {
        Self::NotUniqueIndexKey {
            fields: fields.to_vec(),
        }
    }

    /// Creates a reserved-key error.
    pub fn reserved_key(key: impl Into<String>) -> Self {
        Self::ReservedKey { key: key.into() }
    }

    /// Returns true if this error means "the thing you asked for is absent".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_branch_helper() {
        assert!(EngineError::not_found("key1").is_not_found());
        assert!(!EngineError::Cancelled.is_not_found());
    }

    #[test]
    fn messages_name_the_field_set() {
        let fields = vec!["diff".to_string()];
        let message = EngineError::unique_index_violation(&fields).to_string();
        assert!(message.contains("diff"));

        let message = EngineError::not_unique_index_key(&fields).to_string();
        assert!(message.contains("diff"));
    }
}
