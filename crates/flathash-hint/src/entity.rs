use std::any::Any;
use std::fmt;

use flathash_tree::{Node, TreeError, TreeResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::registry::TypeRegistry;

/// A type that may be stored behind a polymorphic position.
///
/// `TYPE_HINT` is the stable identifier written next to the value in a flat
/// record. It must be unique across the process and must not change between
/// writers and readers of the same records.
///
/// ```
/// use flathash_hint::Polymorphic;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Person {
///     first: String,
///     age: u32,
/// }
///
/// impl Polymorphic for Person {
///     const TYPE_HINT: &'static str = "com.example.Person";
/// }
/// ```
pub trait Polymorphic:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const TYPE_HINT: &'static str;
}

/// Object-safe view of a [`Polymorphic`] value.
pub trait Entity: fmt::Debug + Send + Sync {
    fn type_hint(&self) -> &'static str;

    /// Serializes the value, registering its type on first use.
    fn to_tree(&self) -> TreeResult<Node>;

    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn Entity>;

    fn eq_entity(&self, other: &dyn Entity) -> bool;
}

impl<T: Polymorphic> Entity for T {
    fn type_hint(&self) -> &'static str {
        T::TYPE_HINT
    }

    fn to_tree(&self) -> TreeResult<Node> {
        TypeRegistry::global()
            .register::<T>()
            .map_err(|err| TreeError::Unsupported(err.to_string()))?;
        flathash_tree::to_tree(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }

    fn eq_entity(&self, other: &dyn Entity) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn Entity {
    fn eq(&self, other: &Self) -> bool {
        self.eq_entity(other)
    }
}

impl dyn Entity {
    /// Downcasts to the concrete type.
    pub fn downcast_ref<T: Polymorphic>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}
