//! Query resolution: field-value lookups through postings entries.

use crate::descriptor::IndexDescriptor;
use crate::error::{EngineError, EngineResult};
use crate::keys;
use facetdb_codec::Fields;
use facetdb_store::KvStore;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) struct QueryResolver {
    store: Arc<dyn KvStore>,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Fetches one record by key.
    ///
    /// Reserved keys are metadata, not records, so they come back as
    /// `NotFound` like any other absent key.
    pub fn get(&self, key: &str) -> EngineResult<Fields> {
        if keys::is_reserved(key) {
            return Err(EngineError::not_found(key));
        }
        match self.store.get(key) {
            Ok(bytes) => Ok(facetdb_codec::from_bytes(&bytes)?),
            Err(e) if e.is_not_found() => Err(EngineError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves an exact-match query into the records exhibiting the
    /// queried value combination.
    ///
    /// The query's field names select the index; its values form the
    /// lookup tuple. A missing postings entry fails `NotFound` — whether
    /// because nothing matches, no such index was ever registered, or the
    /// index was removed. The resolver cannot tell these apart and does
    /// not try.
    pub fn find(&self, query: &Fields) -> EngineResult<BTreeMap<String, Fields>> {
        let descriptor = IndexDescriptor::canonicalize(query)?;
        let tuple = descriptor.tuple(query).ok_or_else(|| {
            EngineError::invalid_index_spec("query must supply a value for every field")
        })?;
        let postings_key = keys::postings_key(&descriptor, &tuple)?;

        let members: Vec<String> = match self.store.get(&postings_key) {
            Ok(bytes) => facetdb_codec::from_bytes(&bytes)?,
            Err(e) if e.is_not_found() => return Err(EngineError::not_found(&postings_key)),
            Err(e) => return Err(e.into()),
        };

        let mut results = BTreeMap::new();
        for member in members {
            let record = self.get(&member)?;
            results.insert(member, record);
        }
        Ok(results)
    }
}
