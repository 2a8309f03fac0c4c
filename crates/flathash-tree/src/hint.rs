//! Type hint identifiers and the resolver seam used during reconstruction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Newtype name that marks a statically unknown (polymorphic) position.
///
/// A value serialized through `serialize_newtype_struct(DYNAMIC_TOKEN, ..)`
/// gets builtin hints on its non-string scalars, and a value deserialized
/// through `deserialize_newtype_struct(DYNAMIC_TOKEN, ..)` sees the hint of a
/// [`Node::Typed`](crate::Node::Typed) node instead of having it stripped.
pub const DYNAMIC_TOKEN: &str = "$flathash::private::Dynamic";

/// Struct name used to pass a [`Node::Typed`](crate::Node::Typed) through serde.
pub const TYPED_TOKEN: &str = "$flathash::private::Typed";

/// Struct name used to pass a named [`Object`](crate::Object) through serde.
pub const NAMED_TOKEN: &str = "$flathash::private::Named";

/// Newtype name requested by `Node`'s own `Deserialize` impl.
pub const NODE_TOKEN: &str = "$flathash::private::Node";

/// Map key under which a hinted node presents its hint to a visitor.
#[doc(hidden)]
pub const HINT_FIELD: &str = "$flathash::hint";
/// Map key under which a hinted node presents its inner node to a visitor.
#[doc(hidden)]
pub const VALUE_FIELD: &str = "$flathash::value";
pub(crate) const NAME_FIELD: &str = "$flathash::name";
pub(crate) const FIELDS_FIELD: &str = "$flathash::fields";

/// Identifier of the concrete type stored at an ambiguous position.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHint(String);

impl TypeHint {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn builtin(kind: BuiltinHint) -> Self {
        Self(kind.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The builtin kind this hint names, if any.
    pub fn as_builtin(&self) -> Option<BuiltinHint> {
        BuiltinHint::parse(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHint({})", self.0)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeHint {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TypeHint {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<BuiltinHint> for TypeHint {
    fn from(kind: BuiltinHint) -> Self {
        Self::builtin(kind)
    }
}

/// Hint identifiers reserved for kinds that are rebuilt without a registry lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinHint {
    /// Explicit null, used for null sequence elements.
    Null,
    /// Text that would otherwise be read as a container sentinel.
    String,
    Int,
    Float,
    Bool,
    Bytes,
    /// An untyped string-keyed mapping.
    Map,
}

impl BuiltinHint {
    pub const ALL: [BuiltinHint; 7] = [
        BuiltinHint::Null,
        BuiltinHint::String,
        BuiltinHint::Int,
        BuiltinHint::Float,
        BuiltinHint::Bool,
        BuiltinHint::Bytes,
        BuiltinHint::Map,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinHint::Null => "null",
            BuiltinHint::String => "string",
            BuiltinHint::Int => "int",
            BuiltinHint::Float => "float",
            BuiltinHint::Bool => "bool",
            BuiltinHint::Bytes => "bytes",
            BuiltinHint::Map => "map",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == id)
    }

    /// Returns `true` for hints that describe a scalar leaf.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            BuiltinHint::String
                | BuiltinHint::Int
                | BuiltinHint::Float
                | BuiltinHint::Bool
                | BuiltinHint::Bytes
        )
    }
}

impl fmt::Display for BuiltinHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a non-builtin hint names a type that can be reconstructed.
///
/// Consulted by the deserializer at polymorphic positions so that an
/// unresolvable hint fails where it is found rather than deep inside a visitor.
pub trait HintResolver: Sync {
    fn recognizes(&self, hint: &TypeHint) -> bool;
}

/// Resolver that recognizes builtin hints only.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinOnly;

impl HintResolver for BuiltinOnly {
    fn recognizes(&self, hint: &TypeHint) -> bool {
        hint.as_builtin().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_roundtrip() {
        for kind in BuiltinHint::ALL {
            assert_eq!(BuiltinHint::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(BuiltinHint::parse("com.example.Person"), None);
    }

    #[test]
    fn scalar_kinds() {
        assert!(BuiltinHint::Int.is_scalar());
        assert!(BuiltinHint::String.is_scalar());
        assert!(!BuiltinHint::Map.is_scalar());
        assert!(!BuiltinHint::Null.is_scalar());
    }

    #[test]
    fn hint_reports_builtin() {
        assert_eq!(TypeHint::from("int").as_builtin(), Some(BuiltinHint::Int));
        assert_eq!(TypeHint::from("Person").as_builtin(), None);
        assert_eq!(TypeHint::builtin(BuiltinHint::Map).to_string(), "map");
    }

    #[test]
    fn builtin_only_resolver() {
        assert!(BuiltinOnly.recognizes(&TypeHint::from("float")));
        assert!(!BuiltinOnly.recognizes(&TypeHint::from("Person")));
    }
}
