//! Convenient re-exports of commonly used types from lowdoc.
//!
//! ```ignore
//! use lowdoc::prelude::*;
//! ```

pub use lowdoc_core::{
    adapter::{FallbackAdapter, StorageAdapter, StorageAdapterBuilder},
    codec::{DocumentCodec, JsonCodec},
    collection::TypedCollection,
    document::{Document, RawCollection},
    error::{DocumentStoreError, DocumentStoreResult},
    store::{CorruptPolicy, DocumentStore, DocumentStoreBuilder, DynDocumentStore, LoadOutcome},
};
pub use lowdoc_fs::FileAdapter;
pub use lowdoc_macros::Document;
pub use lowdoc_memory::MemoryAdapter;
