//! Database facade wiring the engine components together.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::descriptor::{IndexDescriptor, IndexSpec, RegisteredIndex};
use crate::error::EngineResult;
use crate::indexer::WriteIndexer;
use crate::lifecycle::{IndexOptions, LifecycleManager};
use crate::query::QueryResolver;
use crate::registry::IndexRegistry;
use facetdb_codec::Fields;
use facetdb_store::{FileStore, FileStoreOptions, KvStore, MemoryStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// The main database handle: an indexed view over a key-value store.
///
/// `Database` is the entry point for every operation:
/// - `put` / `get` / `remove` for records
/// - `find` for exact-match queries over registered indexes
/// - `create_index` / `remove_index` / `reindex` for index lifecycle
///
/// # Opening a Database
///
/// ```rust,ignore
/// use facetdb_core::{Database, IndexOptions};
/// use facetdb_codec::{Fields, Value};
/// use std::path::Path;
///
/// let db = Database::open(Path::new("my_database"))?;
///
/// let mut record = Fields::new();
/// record.insert("city".to_string(), Value::from("Dodoma"));
/// db.put("person:1", &record)?;
///
/// db.create_index("city", IndexOptions::new())?;
/// let matches = db.find(&record)?;
/// ```
///
/// # In-Memory Databases
///
/// For testing, use [`Database::open_in_memory`].
///
/// # Concurrency
///
/// A single engine-wide latch serializes writes: `put`, `remove`, and
/// every lifecycle operation hold it exclusively, so postings
/// read-modify-writes never interleave and a backfill never races a
/// concurrent write. `get` and `find` share it, so readers proceed
/// concurrently but never observe a half-built index.
pub struct Database {
    registry: Arc<IndexRegistry>,
    indexer: WriteIndexer,
    resolver: QueryResolver,
    lifecycle: LifecycleManager,
    latch: RwLock<()>,
}

impl Database {
    /// Opens a file-backed database at the given directory.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be opened (locked, corrupted, I/O) or if
    /// existing index registrations cannot be read back.
    pub fn open(path: &Path) -> EngineResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed database with custom configuration.
    ///
    /// # Errors
    ///
    /// As [`Database::open`].
    pub fn open_with_config(path: &Path, config: Config) -> EngineResult<Self> {
        let options = FileStoreOptions {
            create_if_missing: config.create_if_missing,
            sync_on_write: config.sync_on_write,
        };
        let store = FileStore::open_with_options(path, &options)?;
        Self::open_with_store(Arc::new(store))
    }

    /// Opens a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh memory store in practice; the signature
    /// matches the other constructors.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::open_with_store(Arc::new(MemoryStore::new()))
    }

    /// Opens a database over an injected store.
    ///
    /// This is the seam for custom store implementations. The registry
    /// cache is loaded from the store before the handle is returned.
    ///
    /// # Errors
    ///
    /// Fails if existing index registrations cannot be read back.
    pub fn open_with_store(store: Arc<dyn KvStore>) -> EngineResult<Self> {
        let registry = Arc::new(IndexRegistry::new(Arc::clone(&store)));
        registry.load()?;

        let indexer = WriteIndexer::new(Arc::clone(&store), Arc::clone(&registry));
        let resolver = QueryResolver::new(Arc::clone(&store));
        let lifecycle = LifecycleManager::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            WriteIndexer::new(store, Arc::clone(&registry)),
        );

        Ok(Self {
            registry,
            indexer,
            resolver,
            lifecycle,
            latch: RwLock::new(()),
        })
    }

    /// Writes a record, updating every applicable index.
    ///
    /// # Errors
    ///
    /// Fails with `ReservedKey` for keys in the metadata namespace and
    /// `UniqueIndexViolation` when the write would duplicate a value under
    /// a unique index; in both cases nothing is persisted.
    pub fn put(&self, key: &str, record: &Fields) -> EngineResult<()> {
        let _guard = self.latch.write();
        self.indexer.apply(key, record)
    }

    /// Fetches a record by key.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> EngineResult<Fields> {
        let _guard = self.latch.read();
        self.resolver.get(key)
    }

    /// Deletes a record, purging it from every index.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if the record does not exist.
    pub fn remove(&self, key: &str) -> EngineResult<()> {
        let _guard = self.latch.write();
        self.indexer.unapply(key)
    }

    /// Finds all records exhibiting the queried field-value combination.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when no postings entry exists for the queried
    /// tuple — including when no index covers that field combination.
    pub fn find(&self, query: &Fields) -> EngineResult<BTreeMap<String, Fields>> {
        let _guard = self.latch.read();
        self.resolver.find(query)
    }

    /// Creates an index over the given fields and backfills it from
    /// existing records.
    ///
    /// # Errors
    ///
    /// Fails with `IndexAlreadyExists` for a duplicate canonical field
    /// set, or `NotUniqueIndexKey` when a unique index is requested over
    /// data with duplicate tuples.
    pub fn create_index(
        &self,
        spec: impl Into<IndexSpec>,
        options: IndexOptions,
    ) -> EngineResult<()> {
        self.create_index_cancellable(spec, options, &CancelToken::new())
    }

    /// As [`Database::create_index`], abortable between scanned records
    /// during validation.
    ///
    /// # Errors
    ///
    /// Additionally fails with `Cancelled` if the token trips before
    /// registration is persisted.
    pub fn create_index_cancellable(
        &self,
        spec: impl Into<IndexSpec>,
        options: IndexOptions,
        cancel: &CancelToken,
    ) -> EngineResult<()> {
        let descriptor = IndexDescriptor::canonicalize(spec)?;
        let _guard = self.latch.write();
        self.lifecycle.create_index(&descriptor, options, cancel)
    }

    /// Removes an index and drops all of its postings. Returns whether the
    /// index was registered.
    ///
    /// # Errors
    ///
    /// Fails only on store or codec errors; removing an unknown index is a
    /// no-op.
    pub fn remove_index(&self, spec: impl Into<IndexSpec>) -> EngineResult<bool> {
        let descriptor = IndexDescriptor::canonicalize(spec)?;
        let _guard = self.latch.write();
        self.lifecycle.remove_index(&descriptor)
    }

    /// Rebuilds one index's postings from the current records. Returns the
    /// number of records refiled.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if the index is not registered.
    pub fn reindex(&self, spec: impl Into<IndexSpec>) -> EngineResult<usize> {
        self.reindex_cancellable(spec, &CancelToken::new())
    }

    /// As [`Database::reindex`], abortable between scanned records.
    ///
    /// # Errors
    ///
    /// Additionally fails with `Cancelled`; a cancelled rebuild is
    /// repaired by running it again.
    pub fn reindex_cancellable(
        &self,
        spec: impl Into<IndexSpec>,
        cancel: &CancelToken,
    ) -> EngineResult<usize> {
        let descriptor = IndexDescriptor::canonicalize(spec)?;
        let _guard = self.latch.write();
        self.lifecycle.reindex(&descriptor, cancel)
    }

    /// Rebuilds every registered index in one pass over the records.
    /// Returns the number of (record, index) pairs refiled.
    ///
    /// # Errors
    ///
    /// Fails only on store or codec errors.
    pub fn reindex_all(&self) -> EngineResult<usize> {
        self.reindex_all_cancellable(&CancelToken::new())
    }

    /// As [`Database::reindex_all`], abortable between scanned records.
    ///
    /// # Errors
    ///
    /// Additionally fails with `Cancelled`.
    pub fn reindex_all_cancellable(&self, cancel: &CancelToken) -> EngineResult<usize> {
        let _guard = self.latch.write();
        self.lifecycle.reindex_all(cancel)
    }

    /// Snapshot of every registered index.
    #[must_use]
    pub fn indexes(&self) -> Vec<RegisteredIndex> {
        let _guard = self.latch.read();
        self.registry.list()
    }

    /// Whether an index over the given fields is unique; `None` if no such
    /// index is registered.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidIndexSpec` for an uncanonicalizable spec.
    pub fn is_unique_index(&self, spec: impl Into<IndexSpec>) -> EngineResult<Option<bool>> {
        let descriptor = IndexDescriptor::canonicalize(spec)?;
        let _guard = self.latch.read();
        self.registry.is_unique(&descriptor)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("indexes", &self.indexes().len())
            .finish_non_exhaustive()
    }
}
