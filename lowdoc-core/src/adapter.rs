//! Storage adapter abstraction for the document store.
//!
//! A [`StorageAdapter`] persists one opaque text payload, the whole serialized
//! store, independent of how the store is laid out. Implementations live in
//! sibling crates (`lowdoc-memory`, `lowdoc-fs`); this module also provides
//! [`FallbackAdapter`], which keeps a store usable after its durable medium fails.
//!
//! # Examples
//!
//! ```ignore
//! use lowdoc::adapter::StorageAdapter;
//!
//! let adapter = MyAdapter::new();
//! assert_eq!(adapter.read(), None);
//!
//! adapter.write(r#"{"users":[]}"#)?;
//! assert_eq!(adapter.read().as_deref(), Some(r#"{"users":[]}"#));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::error::DocumentStoreResult;

/// Abstract interface for the medium holding the serialized store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The document store serializes its own
/// writes, but an adapter may still be shared between stores.
pub trait StorageAdapter: Send + Sync + Debug {
    /// Returns the last successfully written payload.
    ///
    /// Returns `None` when nothing has been written yet. This never fails: a
    /// missing or unreadable resource is reported as `None` so that first-time
    /// use is not an error.
    fn read(&self) -> Option<String>;

    /// Like [`read`](StorageAdapter::read), but reports a payload that exists
    /// and cannot be read instead of treating it as absent.
    ///
    /// The store loads through this method, so such a payload counts as corrupt
    /// and is never silently overwritten under [`CorruptPolicy::Fail`](crate::store::CorruptPolicy::Fail).
    /// The default defers to `read` and never fails.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CorruptPayload`](crate::error::DocumentStoreError::CorruptPayload)
    /// or [`DocumentStoreError::AdapterUnavailable`](crate::error::DocumentStoreError::AdapterUnavailable)
    /// if a payload is present but unreadable.
    fn try_read(&self) -> DocumentStoreResult<Option<String>> {
        Ok(self.read())
    }

    /// Replaces the entire persisted payload.
    ///
    /// Readers must observe either the old or the new payload, never a mix or a
    /// truncated file, even if the process dies mid-write.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::AdapterUnavailable`](crate::error::DocumentStoreError::AdapterUnavailable)
    /// if the medium cannot be written.
    fn write(&self, payload: &str) -> DocumentStoreResult<()>;

    /// Whether written payloads outlive the process.
    fn is_durable(&self) -> bool {
        false
    }
}

/// Factory trait for adapters that need configuration before use.
pub trait StorageAdapterBuilder {
    /// The adapter type produced by this builder.
    type Adapter: StorageAdapter;

    /// Builds the adapter, validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the medium is unusable.
    fn build(self) -> DocumentStoreResult<Self::Adapter>;
}

impl<A: StorageAdapter + ?Sized> StorageAdapter for Box<A> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn try_read(&self) -> DocumentStoreResult<Option<String>> {
        (**self).try_read()
    }

    fn write(&self, payload: &str) -> DocumentStoreResult<()> {
        (**self).write(payload)
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }
}

impl<A: StorageAdapter + ?Sized> StorageAdapter for Arc<A> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn try_read(&self) -> DocumentStoreResult<Option<String>> {
        (**self).try_read()
    }

    fn write(&self, payload: &str) -> DocumentStoreResult<()> {
        (**self).write(payload)
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }
}

/// Serves a primary adapter until it fails a write, then a secondary one.
///
/// Once degraded, the adapter stays on the secondary for the rest of the
/// process: the payload that failed is written there, and every later read and
/// write goes there too.
#[derive(Debug)]
pub struct FallbackAdapter<P: StorageAdapter, S: StorageAdapter> {
    primary: P,
    secondary: S,
    degraded: AtomicBool,
}

impl<P: StorageAdapter, S: StorageAdapter> FallbackAdapter<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the primary adapter has been abandoned.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }
}

impl<P: StorageAdapter, S: StorageAdapter> StorageAdapter for FallbackAdapter<P, S> {
    fn read(&self) -> Option<String> {
        if self.is_degraded() {
            self.secondary.read()
        } else {
            self.primary.read()
        }
    }

    fn try_read(&self) -> DocumentStoreResult<Option<String>> {
        if self.is_degraded() {
            self.secondary.try_read()
        } else {
            self.primary.try_read()
        }
    }

    fn write(&self, payload: &str) -> DocumentStoreResult<()> {
        if !self.is_degraded() {
            match self.primary.write(payload) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!("Primary storage failed, falling back to volatile storage: {}", err);
                    self.degraded.store(true, Ordering::Release);
                }
            }
        }

        self.secondary.write(payload)
    }

    fn is_durable(&self) -> bool {
        !self.is_degraded() && self.primary.is_durable()
    }
}
