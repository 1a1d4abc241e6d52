//! Error types and result types for document store operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.
//! Only [`DocumentStoreError::TypeMismatch`] is expected to reach callers of a
//! store opened through the convenience constructor; adapter and payload
//! failures are recovered by the store itself unless configured otherwise.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Encoding a record or the whole store to JSON failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A builder was missing required configuration.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The durable storage medium could not be opened or written.
    #[error("Storage adapter unavailable: {0}")]
    AdapterUnavailable(String),
    /// The persisted payload could not be decoded as a mapping of collections.
    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),
    /// A stored collection could not be decoded as the requested record type.
    /// `collection` names the entry that failed to decode.
    #[error("Collection {collection} does not match the requested type: {reason}")]
    TypeMismatch { collection: String, reason: String },
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl DocumentStoreError {
    pub(crate) fn type_mismatch(collection: &str, err: impl ToString) -> Self {
        DocumentStoreError::TypeMismatch {
            collection: collection.to_string(),
            reason: err.to_string(),
        }
    }
}
