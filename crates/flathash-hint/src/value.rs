//! Dynamically typed values for polymorphic positions.
//!
//! A field of type [`Value`] plays the role of an `Object`-typed field: it may
//! hold any scalar, list, map, or registered [`Polymorphic`] type, and the
//! concrete type survives a trip through a flat record.

use std::fmt;

use flathash_tree::{BuiltinHint, Node, TreeError, TreeResult, DYNAMIC_TOKEN, HINT_FIELD};
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};

use crate::entity::{Entity, Polymorphic};
use crate::registry::TypeRegistry;

/// A value whose type is only known at runtime.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// An instance of a registered [`Polymorphic`] type.
    Entity(Box<dyn Entity>),
}

impl Value {
    /// Wraps a polymorphic value.
    pub fn entity<T: Polymorphic>(value: T) -> Self {
        Value::Entity(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The wrapped entity, if it has type `T`.
    pub fn as_entity<T: Polymorphic>(&self) -> Option<&T> {
        match self {
            Value::Entity(entity) => entity.downcast_ref(),
            _ => None,
        }
    }

    /// Converts a JSON document. Numbers become `Int` when they fit in an
    /// `i64`, `Float` otherwise.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON. Bytes are hex encoded and entities are
    /// rendered with an `@class` member.
    pub fn to_json(&self) -> TreeResult<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::String(hex::encode(b)),
            Value::List(items) => {
                Json::Array(items.iter().map(Value::to_json).collect::<TreeResult<_>>()?)
            }
            Value::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<TreeResult<_>>()?,
            ),
            Value::Entity(entity) => Node::typed(entity.type_hint(), entity.to_tree()?).to_json(),
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DYNAMIC_TOKEN, &Untyped(self))
    }
}

/// The value's own shape, serialized behind the dynamic marker.
struct Untyped<'a>(&'a Value);

impl Serialize for Untyped<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(fields) => serializer.collect_map(fields),
            Value::Entity(entity) => {
                let tree = entity.to_tree().map_err(ser::Error::custom)?;
                Node::typed(entity.type_hint(), tree).serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DYNAMIC_TOKEN, ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any value")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        d.deserialize_any(ValueVisitor)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let Some(first) = map.next_key::<String>()? else {
            return Ok(Value::Map(IndexMap::new()));
        };

        if first == HINT_FIELD {
            let hint: String = map.next_value()?;
            // The inner node follows under the value key.
            map.next_key::<IgnoredAny>()?;
            return decode_hinted(&hint, map);
        }

        let mut fields = IndexMap::with_capacity(map.size_hint().unwrap_or(0) + 1);
        fields.insert(first, map.next_value()?);
        while let Some((field, value)) = map.next_entry::<String, Value>()? {
            fields.insert(field, value);
        }
        Ok(Value::Map(fields))
    }
}

fn decode_hinted<'de, A: MapAccess<'de>>(hint: &str, mut map: A) -> Result<Value, A::Error> {
    let value = match BuiltinHint::parse(hint) {
        Some(BuiltinHint::Null) => {
            map.next_value::<IgnoredAny>()?;
            Value::Null
        }
        Some(BuiltinHint::String) => Value::String(map.next_value()?),
        Some(BuiltinHint::Int) => Value::Int(map.next_value()?),
        Some(BuiltinHint::Float) => Value::Float(map.next_value()?),
        Some(BuiltinHint::Bool) => Value::Bool(map.next_value()?),
        Some(BuiltinHint::Bytes) => Value::Bytes(map.next_value::<RawBytes>()?.0),
        Some(BuiltinHint::Map) => Value::Map(map.next_value()?),
        None => {
            let registration = TypeRegistry::global()
                .resolve(hint)
                .map_err(|_| <A::Error as de::Error>::unknown_variant(hint, &[]))?;
            let node: Node = map.next_value()?;
            let entity = registration
                .decode(node)
                .map_err(TreeError::into_de_error::<A::Error>)?;
            Value::Entity(entity)
        }
    };
    Ok(value)
}

/// Byte content read from either raw bytes or text.
struct RawBytes(Vec<u8>);

impl<'de> Deserialize<'de> for RawBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawBytesVisitor;

        impl<'de> Visitor<'de> for RawBytesVisitor {
            type Value = RawBytes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("bytes")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<RawBytes, E> {
                Ok(RawBytes(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<RawBytes, E> {
                Ok(RawBytes(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<RawBytes, E> {
                Ok(RawBytes(v.as_bytes().to_vec()))
            }

            fn visit_string<E>(self, v: String) -> Result<RawBytes, E> {
                Ok(RawBytes(v.into_bytes()))
            }
        }

        deserializer.deserialize_byte_buf(RawBytesVisitor)
    }
}
