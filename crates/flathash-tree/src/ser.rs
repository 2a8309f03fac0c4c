//! Serde serializer producing [`Node`] trees.

use indexmap::IndexMap;
use serde::ser::{self, Impossible, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::hint::{
    BuiltinHint, TypeHint, DYNAMIC_TOKEN, FIELDS_FIELD, HINT_FIELD, NAMED_TOKEN, NAME_FIELD,
    TYPED_TOKEN, VALUE_FIELD,
};
use crate::node::{Node, Object, Scalar};

/// Converts any serializable value into a tree.
///
/// The root is always treated as a concrete position: the value's own type
/// determines its shape, and only values that pass through a
/// [`DYNAMIC_TOKEN`] newtype receive scalar hints.
pub fn to_tree<T: Serialize + ?Sized>(value: &T) -> TreeResult<Node> {
    value.serialize(NodeSerializer::default())
}

/// Serializer from the serde data model into [`Node`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeSerializer {
    /// Set while serializing the value directly behind a polymorphic position.
    dynamic: bool,
}

impl NodeSerializer {
    fn scalar(self, scalar: Scalar, kind: BuiltinHint) -> Node {
        if self.dynamic {
            Node::typed(kind, Node::Scalar(scalar))
        } else {
            Node::Scalar(scalar)
        }
    }
}

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = TreeError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> TreeResult<Node> {
        Ok(self.scalar(Scalar::Bool(v), BuiltinHint::Bool))
    }

    fn serialize_i8(self, v: i8) -> TreeResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> TreeResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> TreeResult<Node> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> TreeResult<Node> {
        Ok(self.scalar(Scalar::Int(v), BuiltinHint::Int))
    }

    fn serialize_u8(self, v: u8) -> TreeResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> TreeResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> TreeResult<Node> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> TreeResult<Node> {
        Ok(self.scalar(Scalar::UInt(v), BuiltinHint::Int))
    }

    fn serialize_f32(self, v: f32) -> TreeResult<Node> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> TreeResult<Node> {
        Ok(self.scalar(Scalar::Float(v), BuiltinHint::Float))
    }

    fn serialize_char(self, v: char) -> TreeResult<Node> {
        Ok(Node::str(v))
    }

    fn serialize_str(self, v: &str) -> TreeResult<Node> {
        Ok(Node::str(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> TreeResult<Node> {
        Ok(self.scalar(Scalar::Bytes(v.to_vec()), BuiltinHint::Bytes))
    }

    fn serialize_none(self) -> TreeResult<Node> {
        self.serialize_unit()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> TreeResult<Node> {
        value.serialize(self)
    }

    /// A null behind a polymorphic position is kept as an explicit `null`
    /// hint so that the position is still present when read back.
    fn serialize_unit(self) -> TreeResult<Node> {
        if self.dynamic {
            Ok(Node::typed(BuiltinHint::Null, Node::Null))
        } else {
            Ok(Node::Null)
        }
    }

    fn serialize_unit_struct(self, _name: &'static str) -> TreeResult<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> TreeResult<Node> {
        Ok(Node::str(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> TreeResult<Node> {
        let dynamic = name == DYNAMIC_TOKEN;
        value.serialize(NodeSerializer { dynamic })
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> TreeResult<Node> {
        let mut object = Object::new();
        object.insert(variant, to_tree(value)?);
        Ok(Node::Object(object))
    }

    fn serialize_seq(self, len: Option<usize>) -> TreeResult<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> TreeResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> TreeResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> TreeResult<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> TreeResult<SerializeMap> {
        Ok(SerializeMap {
            fields: IndexMap::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> TreeResult<SerializeStruct> {
        Ok(match name {
            TYPED_TOKEN => SerializeStruct::Typed {
                hint: None,
                value: None,
            },
            NAMED_TOKEN => SerializeStruct::Named {
                name: None,
                fields: None,
            },
            _ => SerializeStruct::Plain(Object::named(name)),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> TreeResult<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            fields: Object::new(),
        })
    }
}

pub struct SerializeVec {
    items: Vec<Node>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> TreeResult<()> {
        self.items.push(to_tree(value)?);
        Ok(())
    }

    fn end(self) -> TreeResult<Node> {
        Ok(Node::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> TreeResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> TreeResult<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> TreeResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> TreeResult<Node> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Node>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> TreeResult<()> {
        self.items.push(to_tree(value)?);
        Ok(())
    }

    fn end(self) -> TreeResult<Node> {
        let mut object = Object::new();
        object.insert(self.variant, Node::Sequence(self.items));
        Ok(Node::Object(object))
    }
}

pub struct SerializeMap {
    fields: IndexMap<String, Node>,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> TreeResult<()> {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> TreeResult<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| TreeError::Message("map value serialized before its key".into()))?;
        self.fields.insert(key, to_tree(value)?);
        Ok(())
    }

    fn end(self) -> TreeResult<Node> {
        Ok(Node::Object(self.fields.into_iter().collect()))
    }
}

pub enum SerializeStruct {
    Plain(Object),
    /// Reassembles a [`Node::Typed`] passed through serde.
    Typed {
        hint: Option<String>,
        value: Option<Node>,
    },
    /// Reassembles a named [`Object`] passed through serde.
    Named {
        name: Option<String>,
        fields: Option<Object>,
    },
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> TreeResult<()> {
        match self {
            SerializeStruct::Plain(object) => {
                object.insert(key, to_tree(value)?);
            }
            SerializeStruct::Typed { hint, value: inner } => match key {
                HINT_FIELD => *hint = Some(token_text(value)?),
                VALUE_FIELD => *inner = Some(to_tree(value)?),
                _ => return Err(unexpected_token_field(key)),
            },
            SerializeStruct::Named { name, fields } => match key {
                NAME_FIELD => *name = Some(token_text(value)?),
                FIELDS_FIELD => match to_tree(value)? {
                    Node::Object(object) => *fields = Some(object),
                    other => {
                        return Err(TreeError::mismatch("object fields", other.describe()))
                    }
                },
                _ => return Err(unexpected_token_field(key)),
            },
        }
        Ok(())
    }

    fn end(self) -> TreeResult<Node> {
        match self {
            SerializeStruct::Plain(object) => Ok(Node::Object(object)),
            SerializeStruct::Typed {
                hint: Some(hint),
                value: Some(value),
            } => Ok(Node::Typed(TypeHint::new(hint), Box::new(value))),
            SerializeStruct::Named {
                name: Some(name),
                fields: Some(mut object),
            } => {
                object.set_name(Some(name));
                Ok(Node::Object(object))
            }
            _ => Err(TreeError::Message("incomplete tree passthrough".into())),
        }
    }
}

fn token_text<T: Serialize + ?Sized>(value: &T) -> TreeResult<String> {
    match to_tree(value)? {
        Node::Scalar(Scalar::Str(text)) => Ok(text),
        other => Err(TreeError::mismatch("string", other.describe())),
    }
}

fn unexpected_token_field(key: &str) -> TreeError {
    TreeError::Message(format!("unexpected field `{key}` in tree passthrough"))
}

pub struct SerializeStructVariant {
    variant: &'static str,
    fields: Object,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> TreeResult<()> {
        self.fields.insert(key, to_tree(value)?);
        Ok(())
    }

    fn end(self) -> TreeResult<Node> {
        let mut object = Object::new();
        object.insert(self.variant, Node::Object(self.fields));
        Ok(Node::Object(object))
    }
}

/// Renders map keys as field names. Only scalar keys can become path segments.
struct MapKeySerializer;

fn key_must_be_scalar() -> TreeError {
    TreeError::Unsupported("map keys must be strings or scalars".into())
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = TreeError;

    type SerializeSeq = Impossible<String, TreeError>;
    type SerializeTuple = Impossible<String, TreeError>;
    type SerializeTupleStruct = Impossible<String, TreeError>;
    type SerializeTupleVariant = Impossible<String, TreeError>;
    type SerializeMap = Impossible<String, TreeError>;
    type SerializeStruct = Impossible<String, TreeError>;
    type SerializeStructVariant = Impossible<String, TreeError>;

    fn serialize_bool(self, v: bool) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_f64(self, _v: f64) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_char(self, v: char) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> TreeResult<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_none(self) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> TreeResult<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> TreeResult<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> TreeResult<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> TreeResult<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_seq(self, _len: Option<usize>) -> TreeResult<Self::SerializeSeq> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple(self, _len: usize) -> TreeResult<Self::SerializeTuple> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> TreeResult<Self::SerializeTupleStruct> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> TreeResult<Self::SerializeTupleVariant> {
        Err(key_must_be_scalar())
    }

    fn serialize_map(self, _len: Option<usize>) -> TreeResult<Self::SerializeMap> {
        Err(key_must_be_scalar())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> TreeResult<Self::SerializeStruct> {
        Err(key_must_be_scalar())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> TreeResult<Self::SerializeStructVariant> {
        Err(key_must_be_scalar())
    }
}
