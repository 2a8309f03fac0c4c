//! Flat-record encoding for flathash trees.
//!
//! A key-value store's hash type only holds a flat field-to-value mapping per
//! record. This crate projects a [`Node`](flathash_tree::Node) tree onto such a
//! mapping using path keys (`persons[0].address.street`) and reassembles the
//! tree from it.
//!
//! # Encoding Rules
//!
//! - Scalars are written as their textual encoding at their path.
//! - Null values are written as nothing, except inside sequences where they
//!   become a `null` hint so that positions stay contiguous.
//! - Empty sequences and empty objects are written as the sentinels `[]` and `{}`.
//! - Type hints are written at `<path>.@class`, or `@class` for the root.
//!
//! # Reading Back
//!
//! [`Flattener::unflatten`] never repairs a record: index gaps, paths mixing
//! field and index children, and paths with both a value and children are
//! all errors.

pub mod error;
pub mod flatten;
pub mod key;
pub mod record;

pub use error::{PathError, PathResult};
pub use flatten::{Flattener, DEFAULT_MAX_DEPTH, EMPTY_OBJECT, EMPTY_SEQUENCE};
pub use key::{PathKey, Segment, HINT_SEGMENT};
pub use record::FlatRecord;
