//! Bidirectional mapping between nested values and flat hash records.
//!
//! A key-value store's hash type holds one flat field-to-value mapping per
//! record. [`FlatHashMapper`] projects any serde value onto such a mapping
//! with path keys and rebuilds the value from it, recording the concrete
//! type of values stored behind polymorphic [`Value`] positions.
//!
//! ```
//! use flathash_mapper::FlatHashMapper;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Person {
//!     first: String,
//!     last: String,
//!     age: u32,
//! }
//!
//! let mapper = FlatHashMapper::lenient();
//! let jon = Person { first: "jon".into(), last: "snow".into(), age: 19 };
//!
//! let record = mapper.to_hash(&jon).unwrap();
//! assert_eq!(record.get_str("first"), Some("jon"));
//! assert_eq!(record.get_str("age"), Some("19"));
//!
//! let back: Person = mapper.from_hash(&record).unwrap();
//! assert_eq!(back, jon);
//! ```
//!
//! # Pipeline
//!
//! 1. `serde::Serialize` builds a [`Node`](flathash_tree::Node) tree.
//! 2. The [`TypeHintingMode`] adds hints to objects (neutral mode only).
//! 3. The [`Flattener`](flathash_path::Flattener) writes the tree as a [`FlatRecord`].
//!
//! Reading runs the same steps backwards. Each call works on its own tree and
//! record, and the output is only produced once every step has succeeded.

pub mod config;
pub mod error;
pub mod mapper;
pub mod traits;

pub use config::MapperConfig;
pub use error::{ErrorKind, MapperError, MapperResult};
pub use mapper::FlatHashMapper;
pub use traits::HashMapper;

pub use flathash_hint::{Polymorphic, TypeHintingMode, Value};
pub use flathash_path::FlatRecord;
