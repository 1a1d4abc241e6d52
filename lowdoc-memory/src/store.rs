//! In-memory storage adapter.
//!
//! Holds the last written payload behind a read-write lock.

use parking_lot::RwLock;
use std::sync::Arc;

use lowdoc_core::{
    adapter::{StorageAdapter, StorageAdapterBuilder},
    error::DocumentStoreResult,
};

/// Thread-safe volatile storage adapter.
///
/// `MemoryAdapter` is cloneable and uses an `Arc`-wrapped payload, so clones
/// share the same contents. This lets a test hand one clone to a store and keep
/// another to inspect or reload from.
///
/// # Example
///
/// ```ignore
/// use lowdoc_memory::MemoryAdapter;
/// use lowdoc::adapter::StorageAdapter;
///
/// let adapter = MemoryAdapter::new();
/// assert_eq!(adapter.read(), None);
///
/// adapter.write("{}")?;
/// assert_eq!(adapter.read().as_deref(), Some("{}"));
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryAdapter {
    payload: Arc<RwLock<Option<String>>>,
}

impl MemoryAdapter {
    /// Creates an adapter holding no payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for an adapter with initial contents.
    pub fn builder() -> MemoryAdapterBuilder {
        MemoryAdapterBuilder::default()
    }
}

impl StorageAdapter for MemoryAdapter {
    fn read(&self) -> Option<String> {
        self.payload.read().clone()
    }

    fn write(&self, payload: &str) -> DocumentStoreResult<()> {
        *self.payload.write() = Some(payload.to_string());

        Ok(())
    }
}

/// Builder for constructing [`MemoryAdapter`] instances.
///
/// # Example
///
/// ```ignore
/// use lowdoc_memory::MemoryAdapter;
/// use lowdoc::adapter::StorageAdapterBuilder;
///
/// let adapter = MemoryAdapter::builder()
///     .initial(r#"{"users":[]}"#)
///     .build()?;
/// ```
#[derive(Default, Debug)]
pub struct MemoryAdapterBuilder {
    initial: Option<String>,
}

impl MemoryAdapterBuilder {
    /// Seeds the adapter with a payload, as if it had been written before.
    pub fn initial(mut self, payload: impl Into<String>) -> Self {
        self.initial = Some(payload.into());
        self
    }
}

impl StorageAdapterBuilder for MemoryAdapterBuilder {
    type Adapter = MemoryAdapter;

    /// Builds the adapter. This always succeeds.
    fn build(self) -> DocumentStoreResult<Self::Adapter> {
        Ok(MemoryAdapter {
            payload: Arc::new(RwLock::new(self.initial)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(MemoryAdapter::new().read(), None);
    }

    #[test]
    fn test_write_replaces_payload() {
        let adapter = MemoryAdapter::new();

        adapter.write("first").unwrap();
        adapter.write("second").unwrap();

        assert_eq!(adapter.read().as_deref(), Some("second"));
        assert!(!adapter.is_durable());
    }

    #[test]
    fn test_clones_share_payload() {
        let adapter = MemoryAdapter::new();
        let other = adapter.clone();

        adapter.write("shared").unwrap();

        assert_eq!(other.read().as_deref(), Some("shared"));
    }

    #[test]
    fn test_builder_seeds_payload() {
        let adapter = MemoryAdapter::builder().initial("{}").build().unwrap();

        assert_eq!(adapter.read().as_deref(), Some("{}"));
    }
}
