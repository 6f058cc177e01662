//! Index lifecycle: creation with backfill, removal, reindexing.
//!
//! Every operation here scans the full store, so they all run under the
//! database's exclusive latch and accept a [`CancelToken`]. Cancellation
//! is honored between scanned records while an operation is still
//! validating or clearing; once `create_index` has persisted its
//! registration it runs to completion, so no half-registered index is ever
//! left behind.

use crate::cancel::CancelToken;
use crate::descriptor::{IndexDescriptor, RegisteredIndex};
use crate::error::{EngineError, EngineResult};
use crate::indexer::{Trace, WriteIndexer};
use crate::keys;
use crate::registry::IndexRegistry;
use facetdb_codec::Fields;
use facetdb_store::KvStore;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::info;

/// Options for creating an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Whether the index constrains each value tuple to one record.
    pub unique: bool,
}

impl IndexOptions {
    /// Creates default options (non-unique).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

pub(crate) struct LifecycleManager {
    store: Arc<dyn KvStore>,
    registry: Arc<IndexRegistry>,
    indexer: WriteIndexer,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn KvStore>,
        registry: Arc<IndexRegistry>,
        indexer: WriteIndexer,
    ) -> Self {
        Self {
            store,
            registry,
            indexer,
        }
    }

    /// Registers a new index and backfills it from existing records.
    ///
    /// For a unique index the whole snapshot is validated first; a
    /// duplicate tuple fails `NotUniqueIndexKey` with the registry
    /// untouched, so a later attempt with the same fields starts clean.
    pub fn create_index(
        &self,
        descriptor: &IndexDescriptor,
        options: IndexOptions,
        cancel: &CancelToken,
    ) -> EngineResult<()> {
        if self.registry.is_registered(descriptor)? {
            return Err(EngineError::index_already_exists(descriptor.fields()));
        }

        let records = self.scan_records()?;

        if options.unique {
            let mut seen = HashSet::new();
            for (_key, record) in &records {
                cancel.check()?;
                let Some(tuple) = descriptor.tuple(record) else {
                    continue;
                };
                let postings_key = keys::postings_key(descriptor, &tuple)?;
                if !seen.insert(postings_key) {
                    return Err(EngineError::not_unique_index_key(descriptor.fields()));
                }
            }
        } else {
            cancel.check()?;
        }

        self.registry.register(descriptor, options.unique)?;

        let index = RegisteredIndex {
            descriptor: descriptor.clone(),
            unique: options.unique,
        };
        let mut built = 0;
        for (key, record) in &records {
            built += self
                .indexer
                .backfill_record(std::slice::from_ref(&index), key, record)?;
        }

        info!(index = %descriptor, unique = options.unique, records = built, "index created");
        Ok(())
    }

    /// Unregisters an index and drops its postings range and trace
    /// references. Returns whether a registration existed.
    ///
    /// Postings are dropped even when the registration was already gone,
    /// so a half-removed index can be cleaned up by removing it again.
    pub fn remove_index(&self, descriptor: &IndexDescriptor) -> EngineResult<bool> {
        let existed = self.registry.unregister(descriptor)?;

        let registration = keys::registration_key(descriptor)?;
        let prefix = keys::postings_prefix(descriptor)?;
        let mut dropped = 0;

        for (key, value) in self.store.scan()? {
            if key.starts_with(&prefix) {
                self.store.delete(&key)?;
                dropped += 1;
            } else if keys::trace_record_key(&key).is_some() {
                self.prune_trace(&key, &value, |reg| reg == registration)?;
            }
        }

        info!(index = %descriptor, postings = dropped, "index removed");
        Ok(existed)
    }

    /// Rebuilds one index's postings from scratch.
    pub fn reindex(&self, descriptor: &IndexDescriptor, cancel: &CancelToken) -> EngineResult<usize> {
        let Some(index) = self.registry.get(descriptor)? else {
            return Err(EngineError::not_found(keys::registration_key(descriptor)?));
        };
        self.rebuild(&[index], cancel)
    }

    /// Rebuilds every registered index's postings in one pass.
    pub fn reindex_all(&self, cancel: &CancelToken) -> EngineResult<usize> {
        let targets = self.registry.list();
        if targets.is_empty() {
            return Ok(0);
        }
        self.rebuild(&targets, cancel)
    }

    /// Clears the targets' postings ranges and trace references, then
    /// refiles every record. A cancelled rebuild leaves postings partially
    /// cleared but never partially registered; rerunning it repairs the
    /// index.
    fn rebuild(&self, targets: &[RegisteredIndex], cancel: &CancelToken) -> EngineResult<usize> {
        let mut registrations = BTreeSet::new();
        let mut prefixes = Vec::with_capacity(targets.len());
        for target in targets {
            registrations.insert(keys::registration_key(&target.descriptor)?);
            prefixes.push(keys::postings_prefix(&target.descriptor)?);
        }

        for (key, value) in self.store.scan()? {
            cancel.check()?;
            if prefixes.iter().any(|prefix| key.starts_with(prefix)) {
                self.store.delete(&key)?;
            } else if keys::trace_record_key(&key).is_some() {
                self.prune_trace(&key, &value, |reg| registrations.contains(reg))?;
            }
        }

        let mut refiled = 0;
        for (key, value) in self.store.scan()? {
            cancel.check()?;
            if keys::is_reserved(&key) {
                continue;
            }
            let record: Fields = facetdb_codec::from_bytes(&value)?;
            refiled += self.indexer.backfill_record(targets, &key, &record)?;
        }

        info!(indexes = targets.len(), records = refiled, "reindex complete");
        Ok(refiled)
    }

    /// Drops matching registrations from one trace entry, deleting the
    /// entry when it empties.
    fn prune_trace(
        &self,
        trace_key: &str,
        value: &[u8],
        matches: impl Fn(&str) -> bool,
    ) -> EngineResult<()> {
        let mut trace: Trace = facetdb_codec::from_bytes(value)?;
        let before = trace.len();
        trace.retain(|registration, _| !matches(registration));
        if trace.len() == before {
            return Ok(());
        }
        if trace.is_empty() {
            self.store.delete(trace_key)?;
        } else {
            self.store.put(trace_key, &facetdb_codec::to_bytes(&trace)?)?;
        }
        Ok(())
    }

    fn scan_records(&self) -> EngineResult<Vec<(String, Fields)>> {
        let mut records = Vec::new();
        for (key, value) in self.store.scan()? {
            if keys::is_reserved(&key) {
                continue;
            }
            records.push((key, facetdb_codec::from_bytes(&value)?));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryResolver;
    use facetdb_codec::Value;
    use facetdb_store::MemoryStore;

    struct Harness {
        store: Arc<MemoryStore>,
        indexer: WriteIndexer,
        resolver: QueryResolver,
        lifecycle: LifecycleManager,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let kv: Arc<dyn KvStore> = Arc::clone(&store) as Arc<dyn KvStore>;
        let registry = Arc::new(IndexRegistry::new(Arc::clone(&kv)));
        let indexer = WriteIndexer::new(Arc::clone(&kv), Arc::clone(&registry));
        let resolver = QueryResolver::new(Arc::clone(&kv));
        let lifecycle = LifecycleManager::new(
            Arc::clone(&kv),
            Arc::clone(&registry),
            WriteIndexer::new(kv, registry),
        );
        Harness {
            store,
            indexer,
            resolver,
            lifecycle,
        }
    }

    fn descriptor(fields: &[&str]) -> IndexDescriptor {
        IndexDescriptor::canonicalize(fields.to_vec()).unwrap()
    }

    fn record(pairs: &[(&str, i64)]) -> Fields {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), Value::from(*value)))
            .collect()
    }

    fn none() -> CancelToken {
        CancelToken::new()
    }

    #[test]
    fn create_index_backfills_existing_records() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("diff", 1)])).unwrap();
        h.indexer.apply("key2", &record(&[("diff", 2)])).unwrap();

        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();

        let results = h.resolver.find(&record(&[("diff", 1)])).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("key1"));
    }

    #[test]
    fn duplicate_creation_fails() {
        let h = harness();
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();

        let result =
            h.lifecycle
                .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none());
        assert!(matches!(
            result,
            Err(EngineError::IndexAlreadyExists { .. })
        ));
    }

    #[test]
    fn unique_creation_over_duplicates_fails_and_registers_nothing() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("diff", 1)])).unwrap();
        h.indexer.apply("key2", &record(&[("diff", 1)])).unwrap();

        let result = h.lifecycle.create_index(
            &descriptor(&["diff"]),
            IndexOptions::new().unique(),
            &none(),
        );
        assert!(matches!(result, Err(EngineError::NotUniqueIndexKey { .. })));

        // nothing half-created: the same fields can be indexed non-unique
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();
    }

    #[test]
    fn unique_creation_validates_composite_tuples() {
        let h = harness();
        h.indexer
            .apply("key1", &record(&[("a", 1), ("b", 1)]))
            .unwrap();
        h.indexer
            .apply("key2", &record(&[("a", 1), ("b", 2)]))
            .unwrap();

        // tuples differ on b, so a unique composite index is fine
        h.lifecycle
            .create_index(
                &descriptor(&["a", "b"]),
                IndexOptions::new().unique(),
                &none(),
            )
            .unwrap();
    }

    #[test]
    fn remove_index_drops_postings() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("common", 0)])).unwrap();
        h.lifecycle
            .create_index(&descriptor(&["common"]), IndexOptions::new(), &none())
            .unwrap();

        assert!(h.lifecycle.remove_index(&descriptor(&["common"])).unwrap());

        let result = h.resolver.find(&record(&[("common", 0)]));
        assert!(result.as_ref().is_err_and(|e| e.is_not_found()));

        // no postings or stale trace references left behind
        for (key, _) in h.store.scan().unwrap() {
            assert!(!key.starts_with("~value~"), "leftover postings: {key}");
        }
    }

    #[test]
    fn remove_unknown_index_is_a_noop() {
        let h = harness();
        assert!(!h.lifecycle.remove_index(&descriptor(&["ghost"])).unwrap());
    }

    #[test]
    fn reindex_unknown_index_fails_not_found() {
        let h = harness();
        let result = h.lifecycle.reindex(&descriptor(&["ghost"]), &none());
        assert!(result.as_ref().is_err_and(|e| e.is_not_found()));
    }

    #[test]
    fn reindex_repairs_externally_seeded_records() {
        let h = harness();
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();

        // seed a record behind the engine's back
        let bytes = facetdb_codec::to_bytes(&record(&[("diff", 7)])).unwrap();
        h.store.put("rogue", &bytes).unwrap();

        assert!(h.resolver.find(&record(&[("diff", 7)])).is_err());

        h.lifecycle.reindex(&descriptor(&["diff"]), &none()).unwrap();

        let results = h.resolver.find(&record(&[("diff", 7)])).unwrap();
        assert!(results.contains_key("rogue"));
    }

    #[test]
    fn reindex_all_is_idempotent() {
        let h = harness();
        h.indexer
            .apply("key1", &record(&[("diff", 1), ("common", 0)]))
            .unwrap();
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();
        h.lifecycle
            .create_index(&descriptor(&["common"]), IndexOptions::new(), &none())
            .unwrap();

        h.lifecycle.reindex_all(&none()).unwrap();
        let first = h.store.scan().unwrap();

        h.lifecycle.reindex_all(&none()).unwrap();
        let second = h.store.scan().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn reindex_all_without_indexes_is_a_noop() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("diff", 1)])).unwrap();
        assert_eq!(h.lifecycle.reindex_all(&none()).unwrap(), 0);
    }

    #[test]
    fn cancelled_token_aborts_rebuild() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("diff", 1)])).unwrap();
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();

        let result = h.lifecycle.reindex_all(&cancel);
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[test]
    fn cancelled_unique_validation_registers_nothing() {
        let h = harness();
        h.indexer.apply("key1", &record(&[("diff", 1)])).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();

        let result = h.lifecycle.create_index(
            &descriptor(&["diff"]),
            IndexOptions::new().unique(),
            &cancel,
        );
        assert!(matches!(result, Err(EngineError::Cancelled)));

        // no registration was written
        h.lifecycle
            .create_index(&descriptor(&["diff"]), IndexOptions::new(), &none())
            .unwrap();
    }
}
