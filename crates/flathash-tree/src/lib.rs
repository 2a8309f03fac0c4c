//! Intermediate tree model for the flathash mapper.
//!
//! Native values never go straight to a flat record. They are first
//! serialized into a [`Node`] tree by [`to_tree`], which drives
//! `serde::Serialize`, and read back by [`from_tree`], which drives
//! `serde::Deserialize` over an owned tree.
//!
//! # Node Kinds
//!
//! - [`Node::Null`] -- absent value
//! - [`Node::Scalar`] -- leaf with a stable textual encoding ([`Scalar`])
//! - [`Node::Sequence`] -- ordered elements
//! - [`Node::Object`] -- named fields in insertion order ([`Object`])
//! - [`Node::Typed`] -- any node tagged with its concrete type ([`TypeHint`])
//!
//! # Polymorphic Positions
//!
//! A value serialized as the newtype [`DYNAMIC_TOKEN`] marks a position whose
//! static type does not pin down the runtime type. Only there do scalars pick
//! up builtin hints, and only there does the deserializer hand hints to the
//! visitor, consulting a [`HintResolver`] first.

pub mod de;
pub mod error;
pub mod hint;
pub mod node;
pub mod ser;

pub use de::{from_tree, NodeDeserializer};
pub use error::{TreeError, TreeResult};
pub use hint::{
    BuiltinHint, BuiltinOnly, HintResolver, TypeHint, DYNAMIC_TOKEN, HINT_FIELD, NAMED_TOKEN,
    NODE_TOKEN, TYPED_TOKEN, VALUE_FIELD,
};
pub use node::{Node, Object, Scalar};
pub use ser::{to_tree, NodeSerializer};
