//! Core traits and types for document representation.
//!
//! Records are any serde-compatible type. The store keeps each collection as a
//! [`RawCollection`], an ordered list of untyped JSON values, and only gives it a
//! Rust type when a caller asks for one. Types that carry a stable identity can
//! implement [`Document`] (or derive it) to unlock id-based helpers.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    fold::CaseFolded,
};

/// Trait for records with a stable identity and a home collection.
///
/// # Example
///
/// ```ignore
/// use lowdoc::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: u64,
///     pub name: String,
/// }
///
/// impl Document for User {
///     type Id = u64;
///
///     fn id(&self) -> &u64 {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// The identity type used as the equality anchor for id-based operations.
    type Id: PartialEq + Debug;

    /// Returns a reference to this document's identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// The decoded but untyped contents of one collection.
///
/// Entries are replaced wholesale by mutations and never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCollection(Vec<Value>);

impl RawCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Encodes typed records into an untyped collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if a record fails to encode.
    pub fn from_records<T: Serialize>(records: &[T]) -> DocumentStoreResult<Self> {
        records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(DocumentStoreError::from)
    }

    /// Decodes every record as `T`, matching field names case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TypeMismatch`] naming `collection` and the
    /// offending record if any record does not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self, collection: &str) -> DocumentStoreResult<Vec<T>> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, value)| {
                T::deserialize(CaseFolded(value.clone())).map_err(|err| {
                    DocumentStoreError::type_mismatch(collection, format!("record {index}: {err}"))
                })
            })
            .collect()
    }

    /// Returns the untyped records.
    pub fn records(&self) -> &[Value] {
        &self.0
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for RawCollection {
    fn from(records: Vec<Value>) -> Self {
        Self(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_from_records_keeps_order() {
        let users = vec![
            User { id: 2, name: "b".into() },
            User { id: 1, name: "a".into() },
        ];

        let raw = RawCollection::from_records(&users).unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw.records()[0], json!({ "id": 2, "name": "b" }));
        assert_eq!(raw.decode::<User>("users").unwrap(), users);
    }

    #[test]
    fn test_decode_reports_collection_and_record() {
        let raw = RawCollection::from(vec![
            json!({ "id": 1, "name": "a" }),
            json!({ "id": "two", "name": "b" }),
        ]);

        match raw.decode::<User>("users") {
            Err(DocumentStoreError::TypeMismatch { collection, reason }) => {
                assert_eq!(collection, "users");
                assert!(reason.starts_with("record 1"));
            }
            other => panic!("expected a type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_tolerates_key_case() {
        let raw = RawCollection::from(vec![json!({ "Id": 5, "Name": "e" })]);

        assert_eq!(
            raw.decode::<User>("users").unwrap(),
            vec![User { id: 5, name: "e".into() }]
        );
    }
}
