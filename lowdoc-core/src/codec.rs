//! Text encoding of the whole store.
//!
//! A [`DocumentCodec`] turns the name-to-collection mapping into the single text
//! payload handed to the storage adapter, and back. [`JsonCodec`] is the format
//! the store uses unless told otherwise.

use std::{collections::BTreeMap, fmt::Debug};

use crate::{
    document::RawCollection,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// The full persisted state: collection name to collection contents.
pub type StoreMap = BTreeMap<String, RawCollection>;

/// Encodes and decodes the whole store as one text payload.
pub trait DocumentCodec: Send + Sync + Debug {
    /// Encodes every collection into one payload.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if encoding fails.
    fn encode(&self, collections: &StoreMap) -> DocumentStoreResult<String>;

    /// Decodes a payload produced by [`DocumentCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CorruptPayload`] if the payload is not a
    /// mapping from names to record lists.
    fn decode(&self, payload: &str) -> DocumentStoreResult<StoreMap>;
}

/// JSON codec: `{ "<name>": [ {...}, ... ] }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output, easier to read and diff by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentCodec for JsonCodec {
    fn encode(&self, collections: &StoreMap) -> DocumentStoreResult<String> {
        let payload = if self.pretty {
            serde_json::to_string_pretty(collections)?
        } else {
            serde_json::to_string(collections)?
        };

        Ok(payload)
    }

    fn decode(&self, payload: &str) -> DocumentStoreResult<StoreMap> {
        serde_json::from_str(payload).map_err(|err| DocumentStoreError::CorruptPayload(err.to_string()))
    }
}

impl<C: DocumentCodec + ?Sized> DocumentCodec for Box<C> {
    fn encode(&self, collections: &StoreMap) -> DocumentStoreResult<String> {
        (**self).encode(collections)
    }

    fn decode(&self, payload: &str) -> DocumentStoreResult<StoreMap> {
        (**self).decode(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_is_an_object_of_arrays() {
        let mut collections = StoreMap::new();
        collections.insert("users".into(), RawCollection::from(vec![json!({ "id": 1 })]));
        collections.insert("empty".into(), RawCollection::new());

        let payload = JsonCodec::new().encode(&collections).unwrap();

        assert_eq!(payload, r#"{"empty":[],"users":[{"id":1}]}"#);
        assert_eq!(JsonCodec::new().decode(&payload).unwrap(), collections);
    }

    #[test]
    fn test_pretty_output_decodes_the_same() {
        let mut collections = StoreMap::new();
        collections.insert("users".into(), RawCollection::from(vec![json!({ "id": 1 })]));

        let payload = JsonCodec::pretty().encode(&collections).unwrap();

        assert!(payload.contains('\n'));
        assert_eq!(JsonCodec::new().decode(&payload).unwrap(), collections);
    }

    #[test]
    fn test_decode_rejects_non_mapping_payloads() {
        for payload in ["not json", "[1, 2]", r#"{"users": 3}"#] {
            assert!(matches!(
                JsonCodec::new().decode(payload),
                Err(DocumentStoreError::CorruptPayload(_))
            ));
        }
    }
}
