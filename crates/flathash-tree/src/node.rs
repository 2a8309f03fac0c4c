//! The intermediate tree: what a native value looks like between serde and
//! the flat record.
//!
//! Trees are built once and consumed once. Every node exclusively owns its
//! children, so a tree is never shared and never cyclic.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::hint::{
    TypeHint, FIELDS_FIELD, HINT_FIELD, NAMED_TOKEN, NAME_FIELD, NODE_TOKEN, TYPED_TOKEN,
    VALUE_FIELD,
};

/// A node of the intermediate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Object(Object),
    /// A node carrying the identifier of its concrete type.
    Typed(TypeHint, Box<Node>),
}

impl Node {
    pub fn typed(hint: impl Into<TypeHint>, node: Node) -> Self {
        Node::Typed(hint.into(), Box::new(node))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::Str(value.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// The hint attached to this node, if any.
    pub fn hint(&self) -> Option<&TypeHint> {
        match self {
            Node::Typed(hint, _) => Some(hint),
            _ => None,
        }
    }

    /// Drops an attached hint, returning the bare node.
    pub fn into_untyped(self) -> Node {
        match self {
            Node::Typed(_, inner) => inner.into_untyped(),
            other => other,
        }
    }

    /// Short description used in type mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Node::Null => "null".to_string(),
            Node::Scalar(scalar) => scalar.describe(),
            Node::Sequence(_) => "sequence".to_string(),
            Node::Object(_) => "object".to_string(),
            Node::Typed(hint, _) => format!("value hinted `{hint}`"),
        }
    }

    /// Renders the tree as JSON for logs and debugging output.
    ///
    /// Hints appear as an `@class` member; hinted non-objects are wrapped as
    /// `{"@class": .., "@value": ..}`. Byte scalars are hex encoded.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Map, Value};

        match self {
            Node::Null => Value::Null,
            Node::Scalar(scalar) => scalar.to_json(),
            Node::Sequence(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Object(object) => Value::Object(
                object
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_json()))
                    .collect(),
            ),
            Node::Typed(hint, inner) => {
                let mut out = Map::new();
                out.insert("@class".to_string(), Value::String(hint.to_string()));
                match inner.to_json() {
                    Value::Object(fields) => out.extend(fields),
                    other => {
                        out.insert("@value".to_string(), other);
                    }
                }
                Value::Object(out)
            }
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<Object> for Node {
    fn from(object: Object) -> Self {
        Node::Object(object)
    }
}

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// The flat-record encoding of this scalar.
    ///
    /// Every encoding parses back to the same value with the coercion rules
    /// of the deserializer.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Scalar::Bool(b) => b.to_string().into_bytes(),
            Scalar::Int(i) => i.to_string().into_bytes(),
            Scalar::UInt(u) => u.to_string().into_bytes(),
            Scalar::Float(f) => f.to_string().into_bytes(),
            Scalar::Str(s) => s.clone().into_bytes(),
            Scalar::Bytes(b) => b.clone(),
        }
    }

    /// Builds a text scalar from raw flat bytes, keeping non-UTF-8 data as bytes.
    pub fn from_bytes(raw: &[u8]) -> Self {
        match std::str::from_utf8(raw) {
            Ok(text) => Scalar::Str(text.to_string()),
            Err(_) => Scalar::Bytes(raw.to_vec()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Scalar::Bool(b) => format!("boolean `{b}`"),
            Scalar::Int(i) => format!("integer `{i}`"),
            Scalar::UInt(u) => format!("integer `{u}`"),
            Scalar::Float(f) => format!("floating point `{f}`"),
            Scalar::Str(s) => format!("string {s:?}"),
            Scalar::Bytes(_) => "byte array".to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::UInt(u) => Value::from(*u),
            Scalar::Float(f) => Value::from(*f),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Bytes(b) => Value::String(hex::encode(b)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// An ordered field-to-node mapping, optionally named after the struct it
/// was serialized from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    name: Option<String>,
    fields: IndexMap<String, Node>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// An object that came from a struct with the given serde name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: IndexMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn insert(&mut self, field: impl Into<String>, node: Node) -> Option<Node> {
        self.fields.insert(field.into(), node)
    }

    pub fn get(&self, field: &str) -> Option<&Node> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.fields.iter()
    }

    pub fn into_fields(self) -> IndexMap<String, Node> {
        self.fields
    }
}

impl FromIterator<(String, Node)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self {
            name: None,
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Object {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// ---------------------------------------------------------------------------
// Passing trees through serde
// ---------------------------------------------------------------------------

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::UInt(u) => serializer.serialize_u64(*u),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Bytes(b) => serializer.serialize_bytes(b),
        }
    }
}

struct Fields<'a>(&'a Object);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Scalar(scalar) => scalar.serialize(serializer),
            Node::Sequence(items) => serializer.collect_seq(items),
            Node::Object(object) => match object.name() {
                Some(name) => {
                    let mut state = serializer.serialize_struct(NAMED_TOKEN, 2)?;
                    state.serialize_field(NAME_FIELD, name)?;
                    state.serialize_field(FIELDS_FIELD, &Fields(object))?;
                    state.end()
                }
                None => serializer.collect_map(object.iter()),
            },
            Node::Typed(hint, inner) => {
                let mut state = serializer.serialize_struct(TYPED_TOKEN, 2)?;
                state.serialize_field(HINT_FIELD, hint.as_str())?;
                state.serialize_field(VALUE_FIELD, inner.as_ref())?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(NODE_TOKEN, NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any tree node")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Node, D::Error> {
        d.deserialize_any(NodeVisitor)
    }

    fn visit_unit<E>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Node, D::Error> {
        Node::deserialize(d)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::UInt(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Node, E> {
        Ok(Node::str(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Node, E> {
        Ok(Node::str(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Bytes(v.to_vec())))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Bytes(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let Some(first) = map.next_key::<String>()? else {
            return Ok(Node::Object(Object::new()));
        };

        if first == HINT_FIELD {
            let hint: String = map.next_value()?;
            expect_key(&mut map, VALUE_FIELD)?;
            let inner: Node = map.next_value()?;
            return Ok(Node::typed(hint, inner));
        }

        if first == NAME_FIELD {
            let name: String = map.next_value()?;
            expect_key(&mut map, FIELDS_FIELD)?;
            let mut object = match map.next_value::<Node>()? {
                Node::Object(object) => object,
                other => {
                    return Err(de::Error::invalid_type(
                        de::Unexpected::Other(&other.describe()),
                        &"object fields",
                    ))
                }
            };
            object.set_name(Some(name));
            return Ok(Node::Object(object));
        }

        let mut object = Object::new();
        object.insert(first, map.next_value()?);
        while let Some((field, node)) = map.next_entry::<String, Node>()? {
            object.insert(field, node);
        }
        Ok(Node::Object(object))
    }
}

fn expect_key<'de, A: MapAccess<'de>>(map: &mut A, expected: &'static str) -> Result<(), A::Error> {
    match map.next_key::<String>()? {
        Some(key) if key == expected => Ok(()),
        Some(key) => Err(de::Error::unknown_field(&key, &[])),
        None => Err(de::Error::missing_field(expected)),
    }
}
