//! Index registry: which indexes exist, their field sets, and uniqueness.
//!
//! The store is the source of truth — registrations are reserved entries
//! under the `~index~` prefix. The registry keeps a derived in-memory view
//! of them with an explicit lifecycle: constructed empty, populated by
//! [`IndexRegistry::load`], kept in step by `register`/`unregister`.

use crate::descriptor::{IndexDescriptor, IndexMeta, RegisteredIndex};
use crate::error::{EngineError, EngineResult};
use crate::keys;
use facetdb_store::KvStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tracks registered indexes, persisting them as reserved store entries.
pub(crate) struct IndexRegistry {
    store: Arc<dyn KvStore>,
    /// Derived view keyed by registration key; rebuildable from the store.
    cache: RwLock<BTreeMap<String, RegisteredIndex>>,
}

impl IndexRegistry {
    /// Creates a registry over the given store with an empty cache.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuilds the cache from a store scan. Returns the number of
    /// registrations found.
    pub fn load(&self) -> EngineResult<usize> {
        let mut cache = BTreeMap::new();
        for (key, value) in self.store.scan()? {
            if !key.starts_with(keys::registration_prefix()) {
                continue;
            }
            let descriptor = keys::descriptor_from_registration_key(&key)?;
            let meta: IndexMeta = facetdb_codec::from_bytes(&value)?;
            cache.insert(
                key,
                RegisteredIndex {
                    descriptor,
                    unique: meta.unique,
                },
            );
        }

        let count = cache.len();
        *self.cache.write() = cache;
        Ok(count)
    }

    /// Registers an index, persisting its metadata.
    ///
    /// The check consults both the cache and the store, so a registration
    /// written by an earlier session (or dropped from the cache) cannot be
    /// silently resurrected with different metadata.
    pub fn register(&self, descriptor: &IndexDescriptor, unique: bool) -> EngineResult<()> {
        let key = keys::registration_key(descriptor)?;

        if self.is_registered(descriptor)? {
            return Err(EngineError::index_already_exists(descriptor.fields()));
        }

        let bytes = facetdb_codec::to_bytes(&IndexMeta { unique })?;
        self.store.put(&key, &bytes)?;
        self.cache.write().insert(
            key,
            RegisteredIndex {
                descriptor: descriptor.clone(),
                unique,
            },
        );
        Ok(())
    }

    /// Removes an index registration. Idempotent: returns whether anything
    /// was actually removed.
    pub fn unregister(&self, descriptor: &IndexDescriptor) -> EngineResult<bool> {
        let key = keys::registration_key(descriptor)?;

        let cached = self.cache.write().remove(&key).is_some();
        let durable = match self.store.get(&key) {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e.into()),
        };
        if durable {
            self.store.delete(&key)?;
        }

        Ok(cached || durable)
    }

    /// Snapshot of every registered index.
    pub fn list(&self) -> Vec<RegisteredIndex> {
        self.cache.read().values().cloned().collect()
    }

    /// Looks up one registered index.
    pub fn get(&self, descriptor: &IndexDescriptor) -> EngineResult<Option<RegisteredIndex>> {
        let key = keys::registration_key(descriptor)?;
        Ok(self.cache.read().get(&key).cloned())
    }

    /// Whether the index is registered, in the cache or durably.
    pub fn is_registered(&self, descriptor: &IndexDescriptor) -> EngineResult<bool> {
        let key = keys::registration_key(descriptor)?;
        if self.cache.read().contains_key(&key) {
            return Ok(true);
        }
        match self.store.get(&key) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the index is unique; `None` if it isn't registered.
    pub fn is_unique(&self, descriptor: &IndexDescriptor) -> EngineResult<Option<bool>> {
        Ok(self.get(descriptor)?.map(|index| index.unique))
    }
}
