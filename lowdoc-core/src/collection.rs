//! Typed collection views over a document store.
//!
//! A [`TypedCollection`] is a strongly-typed CRUD and query view over one named
//! collection. It holds no records of its own: every read decodes the store's
//! current entry afresh, and every mutation re-encodes the entry and commits the
//! whole store before returning.
//!
//! # Example
//!
//! ```ignore
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: u64,
//!     pub name: String,
//! }
//!
//! let users = store.get_collection::<User>("users")?;
//! users.insert(User { id: 1, name: "Alice".to_string() })?;
//!
//! let alice = users.first_or_default(|u| u.name == "Alice")?;
//! let by_name = users.order_by(|u| u.name.clone())?;
//! ```

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use std::{cmp::Ordering, marker::PhantomData, sync::Arc};

use crate::{
    adapter::StorageAdapter,
    document::Document,
    error::DocumentStoreResult,
    store::DocumentStore,
};

/// A type-safe view over one named collection of a [`DocumentStore`].
///
/// Mutations on views over the same name are serialized by a lock shared
/// through the store, so each commit reflects a complete mutation.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the store reference
/// * `A` - The storage adapter type
/// * `T` - The record type
#[derive(Debug)]
pub struct TypedCollection<'a, A: StorageAdapter, T> {
    name: String,
    store: &'a DocumentStore<A>,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, A, T> TypedCollection<'a, A, T>
where
    A: StorageAdapter,
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(name: String, store: &'a DocumentStore<A>, lock: Arc<Mutex<()>>) -> Self {
        Self {
            name,
            store,
            lock,
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every record, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TypeMismatch`](crate::error::DocumentStoreError::TypeMismatch)
    /// if the stored records no longer decode as `T`.
    pub fn all(&self) -> DocumentStoreResult<Vec<T>> {
        self.store.read_records(&self.name)
    }

    /// Returns the number of stored records without decoding them.
    pub fn count(&self) -> usize {
        self.store.record_count(&self.name)
    }

    /// Returns the records matching `predicate`, in stored order.
    ///
    /// The iterator filters lazily over a snapshot taken by this call; call
    /// `find` again to observe later mutations.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn find<P>(&self, predicate: P) -> DocumentStoreResult<impl Iterator<Item = T> + use<A, T, P>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.all()?.into_iter().filter(move |item| predicate(item)))
    }

    /// Returns the first record matching `predicate`, if any.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn first_or_default<P>(&self, predicate: P) -> DocumentStoreResult<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.all()?.into_iter().find(|item| predicate(item)))
    }

    /// Returns at most the first `count` records.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn take(&self, count: usize) -> DocumentStoreResult<Vec<T>> {
        Ok(self.all()?.into_iter().take(count).collect())
    }

    /// Returns all records sorted ascending by `key`.
    ///
    /// The sort is stable: records with equal keys keep their stored order.
    /// Keys that do not compare (such as `NaN`) are treated as equal.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn order_by<K, F>(&self, key: F) -> DocumentStoreResult<Vec<T>>
    where
        K: PartialOrd,
        F: Fn(&T) -> K,
    {
        let mut items = self.all()?;
        items.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));

        Ok(items)
    }

    /// Returns all records sorted descending by `key`.
    ///
    /// Stable like [`TypedCollection::order_by`].
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn order_by_descending<K, F>(&self, key: F) -> DocumentStoreResult<Vec<T>>
    where
        K: PartialOrd,
        F: Fn(&T) -> K,
    {
        let mut items = self.all()?;
        items.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));

        Ok(items)
    }

    /// Appends `item` and commits the store.
    ///
    /// # Errors
    ///
    /// Returns a decode, serialization, or adapter error.
    pub fn insert(&self, item: T) -> DocumentStoreResult<()> {
        self.mutate(|items| items.push(item))
    }

    /// Replaces every record matching `predicate` with `new_item` and commits
    /// the store.
    ///
    /// The store is committed even when nothing matched. Returns the number of
    /// replaced records.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::insert`].
    pub fn update<P>(&self, predicate: P, new_item: T) -> DocumentStoreResult<usize>
    where
        T: Clone,
        P: Fn(&T) -> bool,
    {
        self.mutate(|items| {
            let mut replaced = 0;

            for item in items.iter_mut().filter(|item| predicate(item)) {
                *item = new_item.clone();
                replaced += 1;
            }

            replaced
        })
    }

    /// Removes every record matching `predicate` and commits the store.
    ///
    /// Returns the number of removed records.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::insert`].
    pub fn remove<P>(&self, predicate: P) -> DocumentStoreResult<usize>
    where
        P: Fn(&T) -> bool,
    {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        })
    }

    /// Runs read-modify-commit under this collection's lock. A failed commit
    /// leaves the collection as it was.
    fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> DocumentStoreResult<R> {
        let _guard = self.lock.lock();

        let mut items = self.all()?;
        let result = apply(&mut items);
        self.store.commit_records(&self.name, &items)?;

        Ok(result)
    }
}

impl<'a, A, D> TypedCollection<'a, A, D>
where
    A: StorageAdapter,
    D: Document,
{
    /// Returns the first document whose id equals `id`.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::all`].
    pub fn find_by_id(&self, id: &D::Id) -> DocumentStoreResult<Option<D>> {
        self.first_or_default(|doc| doc.id() == id)
    }

    /// Replaces every document sharing `document`'s id and commits the store.
    ///
    /// Returns whether any document was replaced.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::insert`].
    pub fn update_by_id(&self, document: D) -> DocumentStoreResult<bool> {
        let replaced = self.mutate(|items| {
            let mut replaced = 0;

            for item in items.iter_mut().filter(|item| item.id() == document.id()) {
                *item = document.clone();
                replaced += 1;
            }

            replaced
        })?;

        Ok(replaced > 0)
    }

    /// Removes every document whose id equals `id` and commits the store.
    ///
    /// Returns whether any document was removed.
    ///
    /// # Errors
    ///
    /// See [`TypedCollection::insert`].
    pub fn remove_by_id(&self, id: &D::Id) -> DocumentStoreResult<bool> {
        Ok(self.remove(|doc| doc.id() == id)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentStoreError;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Debug, Default)]
    struct Counting {
        payload: Mutex<Option<String>>,
        writes: AtomicUsize,
        broken: AtomicBool,
    }

    impl StorageAdapter for Counting {
        fn read(&self) -> Option<String> {
            self.payload.lock().clone()
        }

        fn write(&self, payload: &str) -> DocumentStoreResult<()> {
            if self.broken.load(AtomicOrdering::SeqCst) {
                return Err(DocumentStoreError::AdapterUnavailable("broken".into()));
            }

            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
            *self.payload.lock() = Some(payload.to_string());
            Ok(())
        }
    }

    impl Counting {
        fn writes(&self) -> usize {
            self.writes.load(AtomicOrdering::SeqCst)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Project {
        id: u32,
        name: String,
        budget: f64,
    }

    impl Document for Project {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn collection_name() -> &'static str {
            "projects"
        }
    }

    fn project(id: u32, name: &str, budget: f64) -> Project {
        Project { id, name: name.to_string(), budget }
    }

    fn seeded() -> DocumentStore<Counting> {
        let store = DocumentStore::new(Counting::default());
        {
            let projects = store.typed_collection::<Project>().unwrap();
            projects.insert(project(1, "apollo", 250_000.0)).unwrap();
            projects.insert(project(2, "gemini", 80_000.0)).unwrap();
            projects.insert(project(3, "mercury", 120_000.0)).unwrap();
        }
        store
    }

    fn ids(projects: &[Project]) -> Vec<u32> {
        projects.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_each_mutation_commits() {
        let store = seeded();

        assert_eq!(store.adapter().writes(), 3);

        let projects = store.typed_collection::<Project>().unwrap();
        projects.remove(|p| p.id == 2).unwrap();

        assert_eq!(store.adapter().writes(), 4);
    }

    #[test]
    fn test_reads_never_commit() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        projects.find(|_| true).unwrap().for_each(drop);
        projects.first_or_default(|p| p.id == 1).unwrap();
        projects.take(2).unwrap();
        projects.order_by(|p| p.budget).unwrap();
        projects.order_by_descending(|p| p.budget).unwrap();

        assert_eq!(store.adapter().writes(), 3);
    }

    #[test]
    fn test_find_sees_later_mutations() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        assert_eq!(projects.find(|p| p.budget > 100_000.0).unwrap().count(), 2);

        projects.insert(project(4, "artemis", 900_000.0)).unwrap();

        assert_eq!(projects.find(|p| p.budget > 100_000.0).unwrap().count(), 3);
    }

    #[test]
    fn test_update_replaces_every_match() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();
        let frozen = project(0, "frozen", 0.0);

        let replaced = projects.update(|p| p.budget > 100_000.0, frozen.clone()).unwrap();

        assert_eq!(replaced, 2);
        assert_eq!(ids(&projects.all().unwrap()), vec![0, 2, 0]);
        assert!(projects.find(|p| p.budget > 100_000.0).unwrap().next().is_none());
    }

    #[test]
    fn test_update_without_match_still_commits() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        let replaced = projects.update(|p| p.id == 42, project(42, "x", 1.0)).unwrap();

        assert_eq!(replaced, 0);
        assert_eq!(store.adapter().writes(), 4);
        assert_eq!(projects.count(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        assert_eq!(projects.remove(|p| p.name.starts_with('g')).unwrap(), 1);
        let once = projects.all().unwrap();
        assert_eq!(projects.remove(|p| p.name.starts_with('g')).unwrap(), 0);

        assert_eq!(projects.all().unwrap(), once);
    }

    #[test]
    fn test_ordering_is_reversible_without_ties() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        let ascending = projects.order_by(|p| p.budget).unwrap();
        let mut descending = projects.order_by_descending(|p| p.budget).unwrap();
        descending.reverse();

        assert_eq!(ids(&ascending), vec![2, 3, 1]);
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_ordering_is_stable_for_ties() {
        let store = DocumentStore::new(Counting::default());
        let projects = store.get_collection::<Project>("tied").unwrap();
        for (id, budget) in [(1, 5.0), (2, 1.0), (3, 5.0), (4, 1.0)] {
            projects.insert(project(id, "p", budget)).unwrap();
        }

        assert_eq!(ids(&projects.order_by(|p| p.budget).unwrap()), vec![2, 4, 1, 3]);
        assert_eq!(ids(&projects.order_by_descending(|p| p.budget).unwrap()), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_take_and_first_or_default() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        assert_eq!(ids(&projects.take(2).unwrap()), vec![1, 2]);
        assert_eq!(projects.take(10).unwrap().len(), 3);
        assert_eq!(projects.first_or_default(|p| p.id == 3).unwrap().map(|p| p.id), Some(3));
        assert_eq!(projects.first_or_default(|p| p.id == 9).unwrap(), None);
    }

    #[test]
    fn test_id_helpers() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        assert_eq!(projects.find_by_id(&2).unwrap().map(|p| p.name), Some("gemini".to_string()));
        assert!(projects.update_by_id(project(2, "gemini ii", 95_000.0)).unwrap());
        assert!(!projects.update_by_id(project(7, "vostok", 1.0)).unwrap());
        assert_eq!(projects.find_by_id(&2).unwrap().map(|p| p.name), Some("gemini ii".to_string()));
        assert!(projects.remove_by_id(&2).unwrap());
        assert!(!projects.remove_by_id(&2).unwrap());
        assert_eq!(projects.find_by_id(&2).unwrap(), None);
    }

    #[test]
    fn test_views_over_same_name_share_state() {
        let store = seeded();
        let first = store.typed_collection::<Project>().unwrap();
        let second = store.get_collection::<Project>("projects").unwrap();

        first.insert(project(4, "artemis", 1.0)).unwrap();

        assert_eq!(second.count(), 4);
    }

    #[test]
    fn test_panicking_predicate_leaves_collection_intact() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            projects.remove(|p| if p.id == 2 { panic!("predicate failed") } else { true })
        }));

        assert!(outcome.is_err());
        assert_eq!(ids(&projects.all().unwrap()), vec![1, 2, 3]);
        assert_eq!(store.adapter().writes(), 3);
    }

    #[test]
    fn test_failed_commit_leaves_collection_unchanged() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();
        store.adapter().broken.store(true, AtomicOrdering::SeqCst);

        assert!(matches!(
            projects.insert(project(4, "artemis", 1.0)),
            Err(DocumentStoreError::AdapterUnavailable(_))
        ));
        assert!(projects.remove(|p| p.id == 1).is_err());
        assert!(projects.update(|p| p.id == 2, project(2, "renamed", 0.0)).is_err());
        assert_eq!(ids(&projects.all().unwrap()), vec![1, 2, 3]);

        // Retrying once storage recovers applies the insert exactly once.
        store.adapter().broken.store(false, AtomicOrdering::SeqCst);
        projects.insert(project(4, "artemis", 1.0)).unwrap();

        let persisted = store.adapter().payload.lock().clone().unwrap();
        let reloaded = DocumentStore::new(Counting {
            payload: Mutex::new(Some(persisted)),
            ..Counting::default()
        });
        let projects = reloaded.typed_collection::<Project>().unwrap();
        assert_eq!(ids(&projects.all().unwrap()), vec![1, 2, 3, 4]);
        assert_eq!(projects.find_by_id(&2).unwrap().map(|p| p.name), Some("gemini".to_string()));
    }

    #[test]
    fn test_failed_commit_after_drop_leaves_name_absent() {
        let store = seeded();
        let projects = store.typed_collection::<Project>().unwrap();
        store.drop_collection("projects");
        store.adapter().broken.store(true, AtomicOrdering::SeqCst);

        assert!(projects.insert(project(4, "artemis", 1.0)).is_err());
        assert!(!store.contains_collection("projects"));
    }

    #[test]
    fn test_wrong_type_after_creation_surfaces_on_read() {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        struct Label(String);

        let store = seeded();
        let labels = store.get_collection::<Label>("labels").unwrap();
        store.add_to_collection("labels", project(1, "not a label", 0.0)).unwrap();

        assert!(matches!(labels.all(), Err(DocumentStoreError::TypeMismatch { .. })));
    }
}
