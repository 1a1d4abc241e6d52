//! Durable file storage adapter for lowdoc.
//!
//! This crate provides [`FileAdapter`], which keeps the whole serialized store
//! in one file and replaces it atomically on every commit by writing a
//! temporary file and renaming it over the target.
//!
//! # Quick Start
//!
//! ```ignore
//! use lowdoc::{store::DocumentStore, fs::FileAdapter, adapter::StorageAdapterBuilder};
//!
//! let adapter = FileAdapter::builder()
//!     .path("app.json")
//!     .build()?;
//! let store = DocumentStore::new(adapter);
//!
//! let users = store.get_collection::<User>("users")?;
//! users.insert(User { id: 1, name: "Alice".into() })?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as lowdoc_fs;

pub mod store;

pub use store::{FileAdapter, FileAdapterBuilder};
