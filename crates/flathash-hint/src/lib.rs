//! Type hinting for the flathash mapper.
//!
//! Rust has no `Object` type, so a position whose concrete type is only known
//! at runtime is spelled [`Value`]. Values of user types go behind it as
//! [`Polymorphic`] entities, each identified by a stable `TYPE_HINT` string
//! that the process-wide [`TypeRegistry`] maps back to the type.
//!
//! # Hinting Modes
//!
//! - [`TypeHintingMode::Lenient`] -- hints only where the declared type is
//!   not enough to rebuild the value
//! - [`TypeHintingMode::Neutral`] -- additionally hints every object: a
//!   registered struct with its `TYPE_HINT`, any other struct with its serde
//!   name, and plain maps with `map`
//!
//! Builtin scalars (`int`, `float`, `bool`, `bytes`) never need the registry.

pub mod entity;
pub mod error;
pub mod mode;
pub mod registry;
pub mod value;

pub use entity::{Entity, Polymorphic};
pub use error::{HintError, HintResult};
pub use mode::TypeHintingMode;
pub use registry::{Registration, TypeRegistry};
pub use value::Value;
