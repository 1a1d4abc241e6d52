//! Case-insensitive field matching for decoding stored records.
//!
//! Stored payloads may have been written by an encoder that spelled field names
//! differently (`Name` vs `name`). [`CaseFolded`] wraps a JSON value and, whenever
//! serde asks for a struct, renames object keys that match one of the struct's
//! fields ignoring ASCII case. Exact matches always win. Nested values are
//! wrapped again so the rule holds at every level.

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Error, Map, Value};

pub(crate) struct CaseFolded(pub(crate) Value);

/// Renames keys that match a field ignoring ASCII case.
///
/// Two keys folding onto the same field are a `duplicate field` error, as they
/// would be for a derived `Deserialize` reading both spellings verbatim.
fn fold_keys(map: Map<String, Value>, fields: &'static [&'static str]) -> Result<Map<String, Value>, Error> {
    let exact: Vec<String> = map
        .keys()
        .filter(|key| fields.contains(&key.as_str()))
        .cloned()
        .collect();
    let mut folded_fields: Vec<&'static str> = Vec::new();

    map.into_iter()
        .map(|(key, value)| {
            if exact.contains(&key) {
                return Ok((key, value));
            }

            let folded = fields.iter().copied().find(|field| {
                field.eq_ignore_ascii_case(&key) && !exact.iter().any(|e| e.as_str() == *field)
            });

            match folded {
                Some(field) if folded_fields.contains(&field) => Err(<Error as de::Error>::duplicate_field(field)),
                Some(field) => {
                    folded_fields.push(field);
                    Ok((field.to_string(), value))
                }
                None => Ok((key, value)),
            }
        })
        .collect()
}

impl<'de> Deserializer<'de> for CaseFolded {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(FoldedSeq(items.into_iter())),
            Value::Object(map) => visitor.visit_map(FoldedMap::new(map)),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CaseFolded(other)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(map) => visitor.visit_map(FoldedMap::new(fold_keys(map, fields)?)),
            other => CaseFolded(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_enum(name, variants, visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

struct FoldedSeq(std::vec::IntoIter<Value>);

impl<'de> SeqAccess<'de> for FoldedSeq {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.0.next() {
            Some(value) => seed.deserialize(CaseFolded(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct FoldedMap {
    entries: serde_json::map::IntoIter,
    pending: Option<Value>,
}

impl FoldedMap {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for FoldedMap {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(value) => seed.deserialize(CaseFolded(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
