//! Path-based construction with a volatile fallback.

use std::path::Path;

use lowdoc_core::{
    adapter::{FallbackAdapter, StorageAdapter, StorageAdapterBuilder},
    store::{DocumentStore, DocumentStoreBuilder, DynDocumentStore},
};
use lowdoc_fs::FileAdapter;
use lowdoc_memory::MemoryAdapter;

/// Opens a store persisted to the file at `path`.
///
/// This never fails. If the file's location cannot be used, a warning is logged
/// and the store lives in memory for the rest of the process. If the file later
/// stops accepting writes, the store switches to memory at that point.
///
/// # Example
///
/// ```ignore
/// let store = lowdoc::open("app.json");
/// if !store.is_durable() {
///     eprintln!("changes will not be saved");
/// }
/// ```
pub fn open(path: impl AsRef<Path>) -> DynDocumentStore {
    DocumentStore::new(open_adapter(path))
}

/// Like [`open`], but returns a builder to customize the codec or load policy.
pub fn builder(path: impl AsRef<Path>) -> DocumentStoreBuilder<Box<dyn StorageAdapter>> {
    DocumentStore::builder(open_adapter(path))
}

/// Builds the adapter used by [`open`]: the file at `path` backed by memory,
/// or memory alone when the file cannot be used.
pub fn open_adapter(path: impl AsRef<Path>) -> Box<dyn StorageAdapter> {
    let path = path.as_ref();

    match FileAdapter::builder().path(path).build() {
        Ok(file) => Box::new(FallbackAdapter::new(file, MemoryAdapter::new())),
        Err(err) => {
            tracing::warn!(
                "Failed to use file storage {}: {}. Falling back to in-memory storage",
                path.display(),
                err
            );
            Box::new(MemoryAdapter::new())
        }
    }
}
