//! Main lowdoc crate: an embedded, file-backed JSON document store.
//!
//! This crate is the primary entry point for users of lowdoc. It re-exports the
//! core types from the sub-crates and provides [`open`], which binds a store to a
//! file and keeps working in memory if that file cannot be used.
//!
//! # Features
//!
//! - **Single-file persistence** - The whole store is one JSON object of named record lists
//! - **Atomic commits** - Each commit replaces the file through a temporary file and a rename
//! - **Typed collections** - Serde types in, serde types out, with predicates for queries
//! - **Always usable** - Missing, unwritable, or corrupt storage degrades to an in-memory store
//!
//! # Quick Start
//!
//! ```ignore
//! use lowdoc::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! #[document(collection = "users")]
//! pub struct User {
//!     pub id: u64,
//!     pub name: String,
//! }
//!
//! fn main() -> DocumentStoreResult<()> {
//!     let store = lowdoc::open("app.json");
//!     let users = store.typed_collection::<User>()?;
//!
//!     // Every collection mutation is committed to app.json before it returns
//!     users.insert(User { id: 1, name: "Alice".to_string() })?;
//!     users.insert(User { id: 2, name: "Bob".to_string() })?;
//!
//!     let names: Vec<String> = users.find(|u| u.id > 1)?.map(|u| u.name).collect();
//!     println!("Found users: {:?}", names);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Batched Writes
//!
//! The store-level helpers change memory only, so several edits can share one
//! durable write:
//!
//! ```ignore
//! let store = lowdoc::open("app.json");
//!
//! store.add_to_collection("users", User { id: 3, name: "Carol".into() })?;
//! store.remove_from_collection("users", |u: &User| u.id == 1)?;
//! store.save_changes()?;
//! ```
//!
//! # Adapters
//!
//! - [`memory`] - Volatile storage for tests and as a fallback
//! - [`fs`] - Durable single-file storage

#[allow(unused_extern_crates)]
extern crate self as lowdoc;

mod open;
pub mod prelude;

pub use lowdoc_core::{adapter, codec, collection, document, error, store};
pub use lowdoc_macros::Document;
pub use open::{builder, open, open_adapter};

/// Volatile storage adapter implementations.
pub mod memory {
    pub use lowdoc_memory::{MemoryAdapter, MemoryAdapterBuilder};
}

/// Durable file storage adapter implementations.
pub mod fs {
    pub use lowdoc_fs::{FileAdapter, FileAdapterBuilder};
}
