//! Volatile storage adapter for lowdoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StorageAdapter` trait. Payloads live only as long as the process. It is what
//! the store falls back to when durable storage is unavailable, and it is handy
//! for tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use lowdoc::{store::DocumentStore, memory::MemoryAdapter};
//!
//! let store = DocumentStore::new(MemoryAdapter::new());
//! let users = store.get_collection::<User>("users")?;
//!
//! users.insert(User { id: 1, name: "Alice".into() })?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as lowdoc_memory;

pub mod store;

pub use store::{MemoryAdapter, MemoryAdapterBuilder};
