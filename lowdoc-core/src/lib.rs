//! An embedded, file-backed JSON document store.
//!
//! This crate is the core of the lowdoc project and provides:
//!
//! - **Document types** ([`document`]) - The [`Document`](document::Document) trait and the untyped [`RawCollection`](document::RawCollection)
//! - **Storage adapter abstraction** ([`adapter`]) - The pluggable medium holding the serialized store
//! - **Codec** ([`codec`]) - Text encoding of the whole store
//! - **Document store** ([`store`]) - The name-to-collection registry and its commit protocol
//! - **Typed collections** ([`collection`]) - Type-safe CRUD and query views over one collection
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use lowdoc::{store::DocumentStore, memory::MemoryAdapter};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: u64,
//!     pub name: String,
//! }
//!
//! let store = DocumentStore::new(MemoryAdapter::new());
//! let users = store.get_collection::<User>("users")?;
//!
//! users.insert(User { id: 1, name: "Alice".into() })?;
//! assert_eq!(users.find(|u| u.id == 1)?.count(), 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as lowdoc_core;

pub mod adapter;
pub mod codec;
pub mod collection;
pub mod document;
pub mod error;
pub mod store;

mod fold;
