//! Serde deserializer reading native values back out of [`Node`] trees.
//!
//! Scalars read from a flat record arrive as text; the type requested by the
//! visitor decides how that text is coerced.

use std::str::FromStr;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::error::{TreeError, TreeResult};
use crate::hint::{
    HintResolver, TypeHint, DYNAMIC_TOKEN, FIELDS_FIELD, HINT_FIELD, NAME_FIELD, NODE_TOKEN,
    VALUE_FIELD,
};
use crate::node::{Node, Object, Scalar};

/// Rebuilds a native value from a tree.
///
/// `resolver` decides which non-builtin hints found at polymorphic positions
/// are acceptable; an unrecognized one fails with
/// [`TreeError::UnknownTypeHint`].
pub fn from_tree<T: DeserializeOwned>(node: Node, resolver: &dyn HintResolver) -> TreeResult<T> {
    T::deserialize(NodeDeserializer::new(node, resolver))
}

/// Deserializer over an owned [`Node`].
pub struct NodeDeserializer<'r> {
    node: Node,
    resolver: &'r dyn HintResolver,
}

impl<'r> NodeDeserializer<'r> {
    pub fn new(node: Node, resolver: &'r dyn HintResolver) -> Self {
        Self { node, resolver }
    }

    fn deserialize_integer<'de, V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Int(i)) => visitor.visit_i64(i),
            Node::Scalar(Scalar::UInt(u)) => visitor.visit_u64(u),
            Node::Scalar(Scalar::Str(text)) => {
                if let Ok(i) = text.parse::<i64>() {
                    visitor.visit_i64(i)
                } else if let Ok(u) = text.parse::<u64>() {
                    visitor.visit_u64(u)
                } else {
                    Err(TreeError::mismatch("an integer", format!("string {text:?}")))
                }
            }
            other => Err(TreeError::mismatch("an integer", other.describe())),
        }
    }

    fn deserialize_float<'de, V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Float(f)) => visitor.visit_f64(f),
            Node::Scalar(Scalar::Int(i)) => visitor.visit_f64(i as f64),
            Node::Scalar(Scalar::UInt(u)) => visitor.visit_f64(u as f64),
            Node::Scalar(Scalar::Str(text)) => {
                visitor.visit_f64(parse_text(&text, "a floating point number")?)
            }
            other => Err(TreeError::mismatch("a floating point number", other.describe())),
        }
    }
}

fn parse_text<T: FromStr>(text: &str, expected: &str) -> TreeResult<T> {
    text.parse::<T>()
        .map_err(|_| TreeError::mismatch(expected, format!("string {text:?}")))
}

/// Text an empty container was read from. Only hinted text can collide with
/// the empty-container markers, so a string target gets the text back.
fn sentinel_text(node: &Node) -> Option<&'static str> {
    match node {
        Node::Sequence(items) if items.is_empty() => Some("[]"),
        Node::Object(object) if object.is_empty() => Some("{}"),
        _ => None,
    }
}

fn visit_scalar<'de, V: Visitor<'de>>(scalar: Scalar, visitor: V) -> TreeResult<V::Value> {
    match scalar {
        Scalar::Bool(b) => visitor.visit_bool(b),
        Scalar::Int(i) => visitor.visit_i64(i),
        Scalar::UInt(u) => visitor.visit_u64(u),
        Scalar::Float(f) => visitor.visit_f64(f),
        Scalar::Str(s) => visitor.visit_string(s),
        Scalar::Bytes(b) => visitor.visit_byte_buf(b),
    }
}

fn visit_sequence<'de, V: Visitor<'de>>(
    items: Vec<Node>,
    resolver: &dyn HintResolver,
    visitor: V,
) -> TreeResult<V::Value> {
    let len = items.len();
    let mut access = NodeSeqAccess {
        iter: items.into_iter(),
        resolver,
    };
    let value = visitor.visit_seq(&mut access)?;
    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

fn visit_object<'de, V: Visitor<'de>>(
    object: Object,
    resolver: &dyn HintResolver,
    visitor: V,
) -> TreeResult<V::Value> {
    let mut access = ObjectAccess {
        iter: object.into_fields().into_iter(),
        pending: None,
        resolver,
    };
    visitor.visit_map(&mut access)
}

macro_rules! forward_integers {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
                self.deserialize_integer(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'_> {
    type Error = TreeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node {
            Node::Null => visitor.visit_unit(),
            Node::Scalar(scalar) => visit_scalar(scalar, visitor),
            Node::Sequence(items) => visit_sequence(items, self.resolver, visitor),
            Node::Object(object) => visit_object(object, self.resolver, visitor),
            Node::Typed(_, inner) => {
                NodeDeserializer::new(*inner, self.resolver).deserialize_any(visitor)
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Bool(b)) => visitor.visit_bool(b),
            Node::Scalar(Scalar::Str(text)) => visitor.visit_bool(parse_text(&text, "a boolean")?),
            other => Err(TreeError::mismatch("a boolean", other.describe())),
        }
    }

    forward_integers! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_float(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Str(text)) => visitor.visit_string(text),
            Node::Scalar(Scalar::Bytes(raw)) => match String::from_utf8(raw) {
                Ok(text) => visitor.visit_string(text),
                Err(_) => Err(TreeError::mismatch("a string", "non UTF-8 bytes")),
            },
            Node::Scalar(scalar) => visitor.visit_string(scalar.to_string()),
            other => match sentinel_text(&other) {
                Some(text) => visitor.visit_str(text),
                None => Err(TreeError::mismatch("a string", other.describe())),
            },
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Bytes(raw)) => visitor.visit_byte_buf(raw),
            Node::Scalar(Scalar::Str(text)) => visitor.visit_byte_buf(text.into_bytes()),
            other => match sentinel_text(&other) {
                Some(text) => visitor.visit_bytes(text.as_bytes()),
                None => match other {
                    Node::Sequence(items) => visit_sequence(items, self.resolver, visitor),
                    other => Err(TreeError::mismatch("bytes", other.describe())),
                },
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node {
            Node::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Null => visitor.visit_unit(),
            other => Err(TreeError::mismatch("unit", other.describe())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> TreeResult<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> TreeResult<V::Value> {
        let resolver = self.resolver;
        match (name, self.node) {
            (NODE_TOKEN, Node::Typed(hint, inner)) => {
                visitor.visit_map(TokenAccess::typed(hint, *inner, resolver))
            }
            (NODE_TOKEN, Node::Object(object)) if object.name().is_some() => {
                visitor.visit_map(TokenAccess::named(object, resolver))
            }
            (NODE_TOKEN, node) => NodeDeserializer::new(node, resolver).deserialize_any(visitor),
            (DYNAMIC_TOKEN, Node::Typed(hint, inner)) => {
                if hint.as_builtin().is_none() && !resolver.recognizes(&hint) {
                    return Err(TreeError::UnknownTypeHint(hint.into_string()));
                }
                visitor.visit_map(TokenAccess::typed(hint, *inner, resolver))
            }
            (_, node) => visitor.visit_newtype_struct(NodeDeserializer::new(node, resolver)),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Sequence(items) => visit_sequence(items, self.resolver, visitor),
            other => Err(TreeError::mismatch("a sequence", other.describe())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> TreeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Object(object) => visit_object(object, self.resolver, visitor),
            other => Err(TreeError::mismatch("a map", other.describe())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> TreeResult<V::Value> {
        if let Node::Typed(hint, _) = &self.node {
            if hint.as_builtin().is_some_and(|kind| kind.is_scalar()) {
                return Err(TreeError::mismatch(
                    format!("struct {name}"),
                    format!("value hinted `{hint}`"),
                ));
            }
        }
        match self.node.into_untyped() {
            Node::Object(object) => visit_object(object, self.resolver, visitor),
            Node::Sequence(items) => visit_sequence(items, self.resolver, visitor),
            other => Err(TreeError::mismatch(format!("struct {name}"), other.describe())),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> TreeResult<V::Value> {
        match self.node.into_untyped() {
            Node::Scalar(Scalar::Str(variant)) => visitor.visit_enum(variant.into_deserializer()),
            Node::Object(object) if object.len() == 1 => match object.into_fields().pop() {
                Some((variant, content)) => visitor.visit_enum(NodeEnumAccess {
                    variant,
                    content,
                    resolver: self.resolver,
                }),
                None => Err(TreeError::mismatch(format!("enum {name}"), "an empty object")),
            },
            other => Err(TreeError::mismatch(format!("enum {name}"), other.describe())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        visitor.visit_unit()
    }
}

struct NodeSeqAccess<'r> {
    iter: std::vec::IntoIter<Node>,
    resolver: &'r dyn HintResolver,
}

impl<'de> SeqAccess<'de> for NodeSeqAccess<'_> {
    type Error = TreeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> TreeResult<Option<T::Value>> {
        match self.iter.next() {
            Some(node) => seed
                .deserialize(NodeDeserializer::new(node, self.resolver))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ObjectAccess<'r> {
    iter: indexmap::map::IntoIter<String, Node>,
    pending: Option<Node>,
    resolver: &'r dyn HintResolver,
}

impl<'de> MapAccess<'de> for ObjectAccess<'_> {
    type Error = TreeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> TreeResult<Option<K::Value>> {
        match self.iter.next() {
            Some((field, node)) => {
                self.pending = Some(node);
                seed.deserialize(KeyDeserializer(field)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> TreeResult<V::Value> {
        let node = self
            .pending
            .take()
            .ok_or_else(|| TreeError::Message("map value requested before its key".into()))?;
        seed.deserialize(NodeDeserializer::new(node, self.resolver))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

enum TokenEntry {
    Text(String),
    Tree(Node),
}

/// Presents a hinted node, or a named object, as a map of private token fields.
struct TokenAccess<'r> {
    entries: std::vec::IntoIter<(&'static str, TokenEntry)>,
    pending: Option<TokenEntry>,
    resolver: &'r dyn HintResolver,
}

impl<'r> TokenAccess<'r> {
    fn typed(hint: TypeHint, inner: Node, resolver: &'r dyn HintResolver) -> Self {
        Self::new(
            vec![
                (HINT_FIELD, TokenEntry::Text(hint.into_string())),
                (VALUE_FIELD, TokenEntry::Tree(inner)),
            ],
            resolver,
        )
    }

    fn named(mut object: Object, resolver: &'r dyn HintResolver) -> Self {
        let name = object.name().unwrap_or_default().to_string();
        object.set_name(None);
        Self::new(
            vec![
                (NAME_FIELD, TokenEntry::Text(name)),
                (FIELDS_FIELD, TokenEntry::Tree(Node::Object(object))),
            ],
            resolver,
        )
    }

    fn new(entries: Vec<(&'static str, TokenEntry)>, resolver: &'r dyn HintResolver) -> Self {
        Self {
            entries: entries.into_iter(),
            pending: None,
            resolver,
        }
    }
}

impl<'de> MapAccess<'de> for TokenAccess<'_> {
    type Error = TreeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> TreeResult<Option<K::Value>> {
        match self.entries.next() {
            Some((key, entry)) => {
                self.pending = Some(entry);
                seed.deserialize(KeyDeserializer(key.to_string())).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> TreeResult<V::Value> {
        match self.pending.take() {
            Some(TokenEntry::Text(text)) => seed.deserialize(text.into_deserializer()),
            Some(TokenEntry::Tree(node)) => {
                seed.deserialize(NodeDeserializer::new(node, self.resolver))
            }
            None => Err(TreeError::Message("map value requested before its key".into())),
        }
    }
}

struct NodeEnumAccess<'r> {
    variant: String,
    content: Node,
    resolver: &'r dyn HintResolver,
}

impl<'de, 'r> EnumAccess<'de> for NodeEnumAccess<'r> {
    type Error = TreeError;
    type Variant = NodeDeserializer<'r>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> TreeResult<(V::Value, NodeDeserializer<'r>)> {
        let variant = seed.deserialize(KeyDeserializer(self.variant))?;
        Ok((variant, NodeDeserializer::new(self.content, self.resolver)))
    }
}

impl<'de> VariantAccess<'de> for NodeDeserializer<'_> {
    type Error = TreeError;

    fn unit_variant(self) -> TreeResult<()> {
        match self.node.into_untyped() {
            Node::Null => Ok(()),
            other => Err(TreeError::mismatch("unit variant", other.describe())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> TreeResult<T::Value> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> TreeResult<V::Value> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> TreeResult<V::Value> {
        de::Deserializer::deserialize_map(self, visitor)
    }
}

/// Deserializer for field names, parsing them back into scalar keys on demand.
struct KeyDeserializer(String);

macro_rules! parse_key {
    ($($method:ident => $visit:ident($ty:ty))*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
                let parsed = self.0.parse::<$ty>().map_err(|_| {
                    TreeError::mismatch(stringify!($ty), format!("map key {:?}", self.0))
                })?;
                visitor.$visit(parsed)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer {
    type Error = TreeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        visitor.visit_string(self.0)
    }

    parse_key! {
        deserialize_bool => visit_bool(bool)
        deserialize_i8 => visit_i8(i8)
        deserialize_i16 => visit_i16(i16)
        deserialize_i32 => visit_i32(i32)
        deserialize_i64 => visit_i64(i64)
        deserialize_u8 => visit_u8(u8)
        deserialize_u16 => visit_u16(u16)
        deserialize_u32 => visit_u32(u32)
        deserialize_u64 => visit_u64(u64)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> TreeResult<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> TreeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> TreeResult<V::Value> {
        visitor.visit_enum(self.0.into_deserializer())
    }

    forward_to_deserialize_any! {
        f32 f64 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::hint::BuiltinOnly;
    use crate::ser::to_tree;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        first: String,
        last: String,
        age: u32,
        address: Option<Address>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Address {
        street: String,
        number: i32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Point,
        Circle(f64),
        Rect { w: u8, h: u8 },
        Pair(i8, i8),
    }

    fn text(value: &str) -> Node {
        Node::str(value)
    }

    fn read<T: DeserializeOwned>(node: Node) -> TreeResult<T> {
        from_tree(node, &BuiltinOnly)
    }

    fn person_from_text(age: &str) -> Node {
        let mut object = Object::new();
        object.insert("first", text("jon"));
        object.insert("last", text("snow"));
        object.insert("age", text(age));
        Node::Object(object)
    }

    #[test]
    fn text_scalars_coerce_to_requested_types() {
        let person: Person = read(person_from_text("19")).unwrap();
        assert_eq!(person.age, 19);
        assert_eq!(person.address, None);

        assert_eq!(read::<f64>(text("2.5")).unwrap(), 2.5);
        assert!(read::<bool>(text("true")).unwrap());
        assert_eq!(read::<i8>(text("-7")).unwrap(), -7);
        assert_eq!(read::<char>(text("x")).unwrap(), 'x');
        assert_eq!(read::<u64>(text("18446744073709551615")).unwrap(), u64::MAX);
    }

    #[test]
    fn integers_widen_to_floats() {
        assert_eq!(read::<f64>(Node::Scalar(Scalar::Int(3))).unwrap(), 3.0);
    }

    #[test]
    fn non_numeric_text_is_a_type_mismatch() {
        let err = read::<Person>(person_from_text("nineteen")).unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn out_of_range_integer_is_a_type_mismatch() {
        let err = read::<u8>(text("300")).unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn missing_required_field() {
        let mut object = Object::new();
        object.insert("first", text("jon"));
        let err = read::<Person>(Node::Object(object)).unwrap_err();
        assert_eq!(err, TreeError::MissingField("last"));
    }

    #[test]
    fn native_roundtrip_through_tree() {
        let person = Person {
            first: "jon".into(),
            last: "snow".into(),
            age: 19,
            address: Some(Address {
                street: "the wall".into(),
                number: 100,
            }),
        };
        let back: Person = read(to_tree(&person).unwrap()).unwrap();
        assert_eq!(back, person);
    }

    #[test]
    fn enums_roundtrip() {
        for shape in [
            Shape::Point,
            Shape::Circle(0.5),
            Shape::Rect { w: 1, h: 2 },
            Shape::Pair(-1, 1),
        ] {
            let back: Shape = read(to_tree(&shape).unwrap()).unwrap();
            assert_eq!(back, shape);
        }
    }

    #[test]
    fn keyed_maps_parse_keys() {
        let map: BTreeMap<u32, String> = [(1, "spring".to_string()), (20, "redis".to_string())]
            .into_iter()
            .collect();
        let back: BTreeMap<u32, String> = read(to_tree(&map).unwrap()).unwrap();
        assert_eq!(back, map);

        let flags: HashMap<bool, u8> = [(true, 1), (false, 0)].into_iter().collect();
        let back: HashMap<bool, u8> = read(to_tree(&flags).unwrap()).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn hints_are_transparent_at_concrete_positions() {
        let node = Node::typed("Person", person_from_text("19"));
        let person: Person = read(node).unwrap();
        assert_eq!(person.first, "jon");
    }

    #[test]
    fn empty_containers_read_as_marker_text() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Tag(String);

        let node = Node::typed("com.example.Tag", Node::Sequence(vec![]));
        assert_eq!(read::<Tag>(node).unwrap(), Tag("[]".into()));
        assert_eq!(read::<String>(Node::Object(Object::new())).unwrap(), "{}");
        assert_eq!(read::<Vec<String>>(Node::Sequence(vec![])).unwrap(), Vec::<String>::new());

        let err = read::<String>(Node::Sequence(vec![text("a")])).unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn scalar_hint_where_struct_expected_is_a_mismatch() {
        let node = Node::typed("int", text("5"));
        let err = read::<Person>(node).unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn dates_roundtrip_as_text() {
        use chrono::{DateTime, TimeZone, Utc};

        let at: DateTime<Utc> = Utc.with_ymd_and_hms(2016, 3, 1, 12, 30, 0).unwrap();
        let node = to_tree(&at).unwrap();
        assert!(matches!(node, Node::Scalar(Scalar::Str(_))));
        let back: DateTime<Utc> = read(node).unwrap();
        assert_eq!(back, at);
    }

    #[test]
    fn node_deserializes_itself_losslessly() {
        let mut object = Object::named("Person");
        object.insert("first", text("jon"));
        let node = Node::Sequence(vec![
            Node::typed("com.example.Person", Node::Object(object)),
            Node::typed("int", text("100")),
            Node::Null,
        ]);
        let back: Node = read(node.clone()).unwrap();
        assert_eq!(back, node);
    }

    struct Dynamic(Node);

    impl<'de> Deserialize<'de> for Dynamic {
        fn deserialize<D: de::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            struct DynamicVisitor;

            impl<'de> Visitor<'de> for DynamicVisitor {
                type Value = Dynamic;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    f.write_str("a dynamic value")
                }

                fn visit_newtype_struct<D: de::Deserializer<'de>>(
                    self,
                    d: D,
                ) -> Result<Dynamic, D::Error> {
                    Node::deserialize(d).map(Dynamic)
                }

                fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Dynamic, A::Error> {
                    let _: Option<String> = map.next_key()?;
                    let hint: String = map.next_value()?;
                    let _: Option<String> = map.next_key()?;
                    let inner: Node = map.next_value()?;
                    Ok(Dynamic(Node::typed(hint, inner)))
                }
            }

            d.deserialize_newtype_struct(DYNAMIC_TOKEN, DynamicVisitor)
        }
    }

    #[test]
    fn dynamic_position_rejects_unknown_hints() {
        let err = read::<Dynamic>(Node::typed("com.example.Gone", text("x")))
            .err()
            .unwrap();
        assert_eq!(err, TreeError::UnknownTypeHint("com.example.Gone".into()));
    }

    #[test]
    fn dynamic_position_sees_builtin_hints() {
        let Dynamic(node) = read(Node::typed("int", text("100"))).unwrap();
        assert_eq!(node, Node::typed("int", text("100")));

        let Dynamic(node) = read(text("plain")).unwrap();
        assert_eq!(node, text("plain"));
    }
}
