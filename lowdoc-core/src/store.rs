//! Main document store interface.
//!
//! [`DocumentStore`] owns the mapping from collection name to [`RawCollection`]
//! and the commit protocol to its [`StorageAdapter`]. The mapping is loaded once
//! at construction; afterwards the store is the single source of truth and the
//! adapter only ever receives complete snapshots.
//!
//! Two commit granularities are offered:
//!
//! - the store's `*_in_collection` methods mutate memory only, and
//!   [`DocumentStore::save_changes`] persists everything in one write;
//! - [`TypedCollection`] mutations commit immediately.
//!
//! # Example
//!
//! ```ignore
//! use lowdoc::store::DocumentStore;
//! use lowdoc::memory::MemoryAdapter;
//!
//! let store = DocumentStore::new(MemoryAdapter::new());
//!
//! store.add_to_collection("users", User { id: 1, name: "Ada".into() })?;
//! store.add_to_collection("users", User { id: 2, name: "Brian".into() })?;
//! store.save_changes()?;
//!
//! let users = store.get_collection::<User>("users")?;
//! assert_eq!(users.count(), 2);
//! ```

use parking_lot::{Mutex, RwLock};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::HashMap, sync::Arc};

use crate::{
    adapter::StorageAdapter,
    codec::{DocumentCodec, JsonCodec, StoreMap},
    collection::TypedCollection,
    document::{Document, RawCollection},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A document store over a boxed adapter, chosen at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn StorageAdapter>>;

/// What to do when the persisted payload cannot be read or decoded at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Log a warning, start with an empty store, and report
    /// [`LoadOutcome::Recovered`]. The next commit overwrites the old payload.
    #[default]
    Discard,
    /// Refuse to build the store with [`DocumentStoreError::CorruptPayload`].
    Fail,
}

/// How the store's initial state was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The adapter held no payload.
    Empty,
    /// The payload decoded into this many collections.
    Loaded { collections: usize },
    /// The payload was corrupt and was discarded.
    Recovered { error: String },
}

/// The persisted name-to-collection mapping and its load/save lifecycle.
///
/// # Concurrency
///
/// All methods take `&self` and the store is `Sync`. The mapping sits behind a
/// read-write lock, each collection name has one mutation lock shared by every
/// view over that name, and commits are serialized so a later commit never
/// writes an older snapshot.
#[derive(Debug)]
pub struct DocumentStore<A: StorageAdapter> {
    adapter: A,
    codec: Box<dyn DocumentCodec>,
    collections: RwLock<StoreMap>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    commit: Mutex<()>,
    outcome: LoadOutcome,
}

impl<A: StorageAdapter> DocumentStore<A> {
    /// Creates a store over `adapter` with the JSON codec, loading its payload.
    ///
    /// A corrupt payload is discarded; see [`CorruptPolicy::Discard`].
    pub fn new(adapter: A) -> Self {
        let codec: Box<dyn DocumentCodec> = Box::new(JsonCodec::new());
        let (collections, outcome) = load(&adapter, codec.as_ref());

        Self::from_parts(adapter, codec, collections, outcome)
    }

    /// Creates a builder for a store with a custom codec or load policy.
    pub fn builder(adapter: A) -> DocumentStoreBuilder<A> {
        DocumentStoreBuilder::new(adapter)
    }

    fn from_parts(adapter: A, codec: Box<dyn DocumentCodec>, collections: StoreMap, outcome: LoadOutcome) -> Self {
        Self {
            adapter,
            codec,
            collections: RwLock::new(collections),
            locks: Mutex::new(HashMap::new()),
            commit: Mutex::new(()),
            outcome,
        }
    }

    /// Returns how the initial state was loaded.
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Returns the underlying storage adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Whether commits currently reach durable storage.
    pub fn is_durable(&self) -> bool {
        self.adapter.is_durable()
    }

    /// Gets a typed view over the collection `name`.
    ///
    /// An absent collection is created empty (in memory only). A present one is
    /// decoded once as `T` to make sure the view is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TypeMismatch`] if the stored records do not
    /// decode as `T`.
    pub fn get_collection<T>(&self, name: &str) -> DocumentStoreResult<TypedCollection<'_, A, T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let exists = match self.collections.read().get(name) {
            Some(raw) => {
                raw.decode::<T>(name)?;
                true
            }
            None => false,
        };

        if !exists {
            tracing::debug!("Creating collection '{}'", name);
            self.collections
                .write()
                .entry(name.to_string())
                .or_default();
        }

        Ok(TypedCollection::new(name.to_string(), self, self.collection_lock(name)))
    }

    /// Gets a typed view over the collection named by `D::collection_name()`.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::get_collection`].
    pub fn typed_collection<D: Document>(&self) -> DocumentStoreResult<TypedCollection<'_, A, D>> {
        self.get_collection::<D>(D::collection_name())
    }

    /// Appends `item` to the collection `name` without committing.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TypeMismatch`] if the collection holds
    /// records of another shape, or a serialization error.
    pub fn add_to_collection<T>(&self, name: &str, item: T) -> DocumentStoreResult<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.mutate_records(name, |records: &mut Vec<T>| records.push(item))
    }

    /// Replaces the first record matching `predicate` with `new_item`, without
    /// committing.
    ///
    /// Returns `false` and leaves the collection untouched if nothing matched.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::add_to_collection`].
    pub fn update_in_collection<T, P>(&self, name: &str, predicate: P, new_item: T) -> DocumentStoreResult<bool>
    where
        T: Serialize + DeserializeOwned,
        P: Fn(&T) -> bool,
    {
        let lock = self.collection_lock(name);
        let _guard = lock.lock();

        let mut records = self.read_records::<T>(name)?;

        match records.iter().position(|record| predicate(record)) {
            Some(index) => {
                records[index] = new_item;
                self.replace_records(name, &records)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every record matching `predicate`, without committing.
    ///
    /// Returns the number of removed records.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::add_to_collection`].
    pub fn remove_from_collection<T, P>(&self, name: &str, predicate: P) -> DocumentStoreResult<usize>
    where
        T: Serialize + DeserializeOwned,
        P: Fn(&T) -> bool,
    {
        self.mutate_records(name, |records: &mut Vec<T>| {
            let before = records.len();
            records.retain(|record| !predicate(record));
            before - records.len()
        })
    }

    /// Serializes every collection and writes the payload through the adapter.
    ///
    /// # Errors
    ///
    /// Returns a serialization error, or the adapter's write error.
    pub fn save_changes(&self) -> DocumentStoreResult<()> {
        let _guard = self.commit.lock();

        let (payload, count) = {
            let collections = self.collections.read();
            (self.codec.encode(&collections)?, collections.len())
        };

        self.adapter.write(&payload)?;

        tracing::debug!("Committed {} collections ({} bytes)", count, payload.len());
        Ok(())
    }

    /// Lists the names of all collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Whether a collection named `name` exists.
    pub fn contains_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Removes the collection `name` without committing.
    ///
    /// Returns whether it existed.
    pub fn drop_collection(&self, name: &str) -> bool {
        let lock = self.collection_lock(name);
        let removed = {
            let _guard = lock.lock();
            self.collections.write().remove(name).is_some()
        };

        // A lock still held by a live view stays, so later views share it.
        // Clones are only made under the table mutex.
        let mut locks = self.locks.lock();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(name);
        }

        removed
    }

    pub(crate) fn collection_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Decodes the current records of `name`; an absent collection is empty.
    pub(crate) fn read_records<T: DeserializeOwned>(&self, name: &str) -> DocumentStoreResult<Vec<T>> {
        let raw = self.collections.read().get(name).cloned();

        match raw {
            Some(raw) => raw.decode(name),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn record_count(&self, name: &str) -> usize {
        self.collections
            .read()
            .get(name)
            .map(RawCollection::len)
            .unwrap_or(0)
    }

    /// Encodes `records` and swaps them in as the whole contents of `name`.
    fn replace_records<T: Serialize>(&self, name: &str, records: &[T]) -> DocumentStoreResult<()> {
        let raw = RawCollection::from_records(records)?;
        self.collections.write().insert(name.to_string(), raw);

        Ok(())
    }

    /// Swaps in `records` as the contents of `name` and commits the store.
    ///
    /// If the commit fails, the previous entry is put back so the failed
    /// mutation leaves no trace in memory.
    pub(crate) fn commit_records<T: Serialize>(&self, name: &str, records: &[T]) -> DocumentStoreResult<()> {
        let raw = RawCollection::from_records(records)?;
        let previous = self.collections.write().insert(name.to_string(), raw);

        if let Err(err) = self.save_changes() {
            let mut collections = self.collections.write();
            match previous {
                Some(previous) => {
                    collections.insert(name.to_string(), previous);
                }
                None => {
                    collections.remove(name);
                }
            }

            return Err(err);
        }

        Ok(())
    }

    fn mutate_records<T, R>(&self, name: &str, apply: impl FnOnce(&mut Vec<T>) -> R) -> DocumentStoreResult<R>
    where
        T: Serialize + DeserializeOwned,
    {
        let lock = self.collection_lock(name);
        let _guard = lock.lock();

        let mut records = self.read_records::<T>(name)?;
        let result = apply(&mut records);
        self.replace_records(name, &records)?;

        Ok(result)
    }
}

fn load<A: StorageAdapter>(adapter: &A, codec: &dyn DocumentCodec) -> (StoreMap, LoadOutcome) {
    let payload = match adapter.try_read() {
        Ok(Some(payload)) if !payload.trim().is_empty() => payload,
        Ok(_) => {
            tracing::debug!("Storage is empty, starting with no collections");
            return (StoreMap::new(), LoadOutcome::Empty);
        }
        Err(err) => {
            tracing::warn!("Stored payload is unreadable: {}", err);
            return (StoreMap::new(), LoadOutcome::Recovered { error: err.to_string() });
        }
    };

    match codec.decode(&payload) {
        Ok(collections) => {
            tracing::info!("Loaded {} collections ({} bytes)", collections.len(), payload.len());
            let count = collections.len();
            (collections, LoadOutcome::Loaded { collections: count })
        }
        Err(err) => {
            tracing::warn!("Stored payload is corrupt ({} bytes): {}", payload.len(), err);
            (StoreMap::new(), LoadOutcome::Recovered { error: err.to_string() })
        }
    }
}

/// Builder for [`DocumentStore`] instances with a custom codec or load policy.
///
/// # Example
///
/// ```ignore
/// use lowdoc::store::{CorruptPolicy, DocumentStore};
/// use lowdoc::codec::JsonCodec;
///
/// let store = DocumentStore::builder(adapter)
///     .codec(JsonCodec::pretty())
///     .on_corrupt(CorruptPolicy::Fail)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct DocumentStoreBuilder<A: StorageAdapter> {
    adapter: A,
    codec: Box<dyn DocumentCodec>,
    on_corrupt: CorruptPolicy,
}

impl<A: StorageAdapter> DocumentStoreBuilder<A> {
    fn new(adapter: A) -> Self {
        Self {
            adapter,
            codec: Box::new(JsonCodec::new()),
            on_corrupt: CorruptPolicy::default(),
        }
    }

    /// Sets the codec used for the persisted payload.
    pub fn codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Sets what happens when the persisted payload is corrupt.
    pub fn on_corrupt(mut self, policy: CorruptPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    /// Loads the adapter's payload and builds the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CorruptPayload`] if the payload is corrupt
    /// or unreadable and the policy is [`CorruptPolicy::Fail`].
    pub fn build(self) -> DocumentStoreResult<DocumentStore<A>> {
        let (collections, outcome) = load(&self.adapter, self.codec.as_ref());

        if let (CorruptPolicy::Fail, LoadOutcome::Recovered { error }) = (self.on_corrupt, &outcome) {
            return Err(DocumentStoreError::CorruptPayload(error.clone()));
        }

        Ok(DocumentStore::from_parts(self.adapter, self.codec, collections, outcome))
    }
}
