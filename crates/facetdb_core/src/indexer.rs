//! Write-path indexer: postings maintenance on every record write.
//!
//! `apply` is stage-then-commit. Every check — uniqueness above all — runs
//! against staged data before the first byte is written, which is what
//! makes a rejected `put` leave the store exactly as it was.
//!
//! Each record carries a trace entry mapping every index it is filed under
//! to the postings key last written for it. Diffing the trace on the next
//! write is how a re-put with changed values gets purged from its old
//! tuple's postings without a scan.

use crate::descriptor::RegisteredIndex;
use crate::error::{EngineError, EngineResult};
use crate::keys;
use crate::registry::IndexRegistry;
use facetdb_codec::Fields;
use facetdb_store::KvStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Registration key -> postings key last written for one record.
pub(crate) type Trace = BTreeMap<String, String>;

/// Staged change to one postings entry: new member list, or removal.
enum PostingsChange {
    Write(Vec<String>),
    Remove,
}

pub(crate) struct WriteIndexer {
    store: Arc<dyn KvStore>,
    registry: Arc<IndexRegistry>,
}

impl WriteIndexer {
    pub fn new(store: Arc<dyn KvStore>, registry: Arc<IndexRegistry>) -> Self {
        Self { store, registry }
    }

    /// Writes a record and updates every applicable index.
    ///
    /// All-or-nothing per record: a reserved-key rejection or unique-index
    /// violation happens before anything is persisted.
    pub fn apply(&self, key: &str, record: &Fields) -> EngineResult<()> {
        if keys::is_reserved(key) {
            return Err(EngineError::reserved_key(key));
        }

        let record_bytes = facetdb_codec::to_bytes(record)?;
        let previous = self.load_trace(key)?;

        // Stage phase: compute every postings change, checking uniqueness
        // as we go. Nothing is written yet.
        let mut staged: Vec<(String, PostingsChange)> = Vec::new();
        let mut trace = Trace::new();

        for index in self.registry.list() {
            let Some(tuple) = index.descriptor.tuple(record) else {
                continue;
            };
            let postings_key = keys::postings_key(&index.descriptor, &tuple)?;
            let mut members = self.load_postings(&postings_key)?;

            if index.unique && members.iter().any(|member| member != key) {
                return Err(EngineError::unique_index_violation(
                    index.descriptor.fields(),
                ));
            }

            members.retain(|member| member != key);
            members.push(key.to_string());
            members.sort();
            members.dedup();

            trace.insert(keys::registration_key(&index.descriptor)?, postings_key.clone());
            staged.push((postings_key, PostingsChange::Write(members)));
        }

        // Stale purge: postings keys the record was filed under last time
        // but no longer belongs to. Entries for since-dropped indexes are
        // pruned the same way.
        for (registration, old_postings_key) in &previous {
            if trace.get(registration) == Some(old_postings_key) {
                continue;
            }
            let mut members = self.load_postings(old_postings_key)?;
            let before = members.len();
            members.retain(|member| member != key);
            if members.len() == before {
                continue;
            }
            let change = if members.is_empty() {
                PostingsChange::Remove
            } else {
                PostingsChange::Write(members)
            };
            staged.push((old_postings_key.clone(), change));
        }

        // Commit phase.
        self.store.put(key, &record_bytes)?;
        for (postings_key, change) in &staged {
            match change {
                PostingsChange::Write(members) => {
                    self.store
                        .put(postings_key, &facetdb_codec::to_bytes(members)?)?;
                }
                PostingsChange::Remove => self.store.delete(postings_key)?,
            }
        }
        self.store_trace(key, &trace)?;

        debug!(key, indexes = trace.len(), "record indexed");
        Ok(())
    }

    /// Deletes a record and purges it from every postings entry it was
    /// filed under.
    pub fn unapply(&self, key: &str) -> EngineResult<()> {
        if keys::is_reserved(key) {
            return Err(EngineError::reserved_key(key));
        }
        match self.store.get(key) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Err(EngineError::not_found(key)),
            Err(e) => return Err(e.into()),
        }

        let previous = self.load_trace(key)?;
        for postings_key in previous.values() {
            let mut members = self.load_postings(postings_key)?;
            let before = members.len();
            members.retain(|member| member != key);
            if members.len() == before {
                continue;
            }
            if members.is_empty() {
                self.store.delete(postings_key)?;
            } else {
                self.store
                    .put(postings_key, &facetdb_codec::to_bytes(&members)?)?;
            }
        }

        self.store.delete(&keys::trace_key(key))?;
        self.store.delete(key)?;

        debug!(key, postings = previous.len(), "record removed");
        Ok(())
    }

    /// Files one already-stored record under the given indexes, updating
    /// its trace entry. Used by backfill and reindex; uniqueness has been
    /// validated by the caller beforehand. Returns how many of the indexes
    /// matched the record.
    pub fn backfill_record(
        &self,
        indexes: &[RegisteredIndex],
        key: &str,
        record: &Fields,
    ) -> EngineResult<usize> {
        let mut trace = self.load_trace(key)?;
        let mut matched = 0;

        for index in indexes {
            let Some(tuple) = index.descriptor.tuple(record) else {
                continue;
            };
            let postings_key = keys::postings_key(&index.descriptor, &tuple)?;

            let mut members = self.load_postings(&postings_key)?;
            members.retain(|member| member != key);
            members.push(key.to_string());
            members.sort();
            members.dedup();
            self.store
                .put(&postings_key, &facetdb_codec::to_bytes(&members)?)?;

            trace.insert(keys::registration_key(&index.descriptor)?, postings_key);
            matched += 1;
        }

        if matched > 0 {
            self.store_trace(key, &trace)?;
        }
        Ok(matched)
    }

    /// Loads a postings entry, treating absence as empty.
    pub fn load_postings(&self, postings_key: &str) -> EngineResult<Vec<String>> {
        match self.store.get(postings_key) {
            Ok(bytes) => Ok(facetdb_codec::from_bytes(&bytes)?),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_trace(&self, key: &str) -> EngineResult<Trace> {
        match self.store.get(&keys::trace_key(key)) {
            Ok(bytes) => Ok(facetdb_codec::from_bytes(&bytes)?),
            Err(e) if e.is_not_found() => Ok(Trace::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store_trace(&self, key: &str, trace: &Trace) -> EngineResult<()> {
        let trace_key = keys::trace_key(key);
        if trace.is_empty() {
            self.store.delete(&trace_key)?;
        } else {
            self.store.put(&trace_key, &facetdb_codec::to_bytes(trace)?)?;
        }
        Ok(())
    }
}
