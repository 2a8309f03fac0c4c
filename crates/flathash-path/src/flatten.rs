//! Conversion between trees and flat records.

use std::collections::BTreeMap;

use bytes::Bytes;
use flathash_tree::{BuiltinHint, Node, Object, Scalar, TypeHint};
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{PathError, PathResult};
use crate::key::{PathKey, Segment};
use crate::record::FlatRecord;

/// Value written for an empty sequence.
pub const EMPTY_SEQUENCE: &[u8] = b"[]";

/// Value written for an object with no non-null fields.
pub const EMPTY_OBJECT: &[u8] = b"{}";

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

fn is_sentinel(raw: &[u8]) -> bool {
    raw == EMPTY_SEQUENCE || raw == EMPTY_OBJECT
}

/// Projects trees onto flat records and reassembles them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flattener {
    max_depth: usize,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Flattener {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Flattens a tree into a new record.
    ///
    /// The record is only returned once the whole tree has been written.
    pub fn flatten(&self, node: &Node) -> PathResult<FlatRecord> {
        let mut record = FlatRecord::new();
        let mut path = PathKey::root();
        self.emit(node, &mut path, 0, &mut record)?;
        trace!(entries = record.len(), "flattened tree");
        Ok(record)
    }

    /// Writes `node` at `path`, returning whether any entry was written.
    fn emit(
        &self,
        node: &Node,
        path: &mut PathKey,
        depth: usize,
        record: &mut FlatRecord,
    ) -> PathResult<bool> {
        self.check_depth(path, depth)?;

        match node {
            Node::Null => Ok(false),
            Node::Scalar(scalar) => {
                let raw = scalar.to_bytes();
                if is_sentinel(&raw) {
                    record.insert(path.hint_key().to_string(), BuiltinHint::String.as_str());
                }
                record.insert(path.to_string(), raw);
                Ok(true)
            }
            Node::Sequence(items) => {
                if items.is_empty() {
                    record.insert(path.to_string(), EMPTY_SEQUENCE);
                    return Ok(true);
                }
                for (i, item) in items.iter().enumerate() {
                    path.push(Segment::Index(i));
                    if item.is_null() {
                        self.check_depth(path, depth + 1)?;
                        record.insert(path.hint_key().to_string(), BuiltinHint::Null.as_str());
                    } else {
                        self.emit(item, path, depth + 1, record)?;
                    }
                    path.pop();
                }
                Ok(true)
            }
            Node::Object(object) => {
                let mut emitted = false;
                for (name, child) in object {
                    if name.is_empty() {
                        return Err(PathError::Unsupported {
                            path: path.to_string(),
                            reason: "empty field name".into(),
                        });
                    }
                    path.push(Segment::Field(name.clone()));
                    emitted |= self.emit(child, path, depth + 1, record)?;
                    path.pop();
                }
                if !emitted {
                    record.insert(path.to_string(), EMPTY_OBJECT);
                }
                Ok(true)
            }
            Node::Typed(hint, inner) => {
                self.emit_typed(hint, inner, path, depth, record)?;
                Ok(true)
            }
        }
    }

    fn check_depth(&self, path: &PathKey, depth: usize) -> PathResult<()> {
        if depth > self.max_depth {
            return Err(PathError::TooDeep {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Writes a hinted node. Sentinel text under a non-scalar hint is
    /// written as is and read back as an empty container; the deserializer
    /// turns it back into text where the target asks for a string.
    fn emit_typed(
        &self,
        hint: &TypeHint,
        inner: &Node,
        path: &mut PathKey,
        depth: usize,
        record: &mut FlatRecord,
    ) -> PathResult<()> {
        if let Node::Typed(..) = inner {
            return Err(PathError::Unsupported {
                path: path.to_string(),
                reason: format!("nested type hint under `{hint}`"),
            });
        }

        record.insert(path.hint_key().to_string(), hint.as_str().to_string());
        match inner {
            Node::Scalar(scalar) => {
                record.insert(path.to_string(), scalar.to_bytes());
            }
            other => {
                self.emit(other, path, depth, record)?;
            }
        }
        Ok(())
    }

    /// Reassembles a tree from a record.
    pub fn unflatten(&self, record: &FlatRecord) -> PathResult<Node> {
        let mut root = Slot::default();
        for (key, value) in record {
            let parsed = PathKey::parse(key)?;
            if parsed.len() > self.max_depth + 1 {
                return Err(PathError::TooDeep {
                    path: key.clone(),
                    max_depth: self.max_depth,
                });
            }
            root.place(&parsed, value)?;
        }
        let node = root.build(&mut PathKey::root())?;
        trace!(entries = record.len(), "unflattened record");
        Ok(node)
    }
}

fn carries_scalar(hint: &TypeHint) -> bool {
    hint.as_builtin().is_some_and(BuiltinHint::is_scalar)
}

#[derive(Default)]
enum Children {
    #[default]
    None,
    Fields(IndexMap<String, Slot>),
    Items(BTreeMap<usize, Slot>),
}

/// Everything the record says about one path.
#[derive(Default)]
struct Slot {
    value: Option<Bytes>,
    hint: Option<Bytes>,
    children: Children,
}

impl Slot {
    fn place(&mut self, key: &PathKey, value: &Bytes) -> PathResult<()> {
        let mut slot = self;
        for (depth, segment) in key.segments().iter().enumerate() {
            let mixed = || PathError::MixedSegments {
                path: PathKey::from(key.segments()[..depth].to_vec()).to_string(),
            };
            slot = match segment {
                Segment::Hint => {
                    slot.hint = Some(value.clone());
                    return Ok(());
                }
                Segment::Field(name) => {
                    if let Children::None = slot.children {
                        slot.children = Children::Fields(IndexMap::new());
                    }
                    match &mut slot.children {
                        Children::Fields(fields) => fields.entry(name.clone()).or_default(),
                        _ => return Err(mixed()),
                    }
                }
                Segment::Index(i) => {
                    if let Children::None = slot.children {
                        slot.children = Children::Items(BTreeMap::new());
                    }
                    match &mut slot.children {
                        Children::Items(items) => items.entry(*i).or_default(),
                        _ => return Err(mixed()),
                    }
                }
            };
        }
        slot.value = Some(value.clone());
        Ok(())
    }

    fn build(self, path: &mut PathKey) -> PathResult<Node> {
        let hint = match self.hint {
            Some(raw) => Some(TypeHint::new(String::from_utf8(raw.to_vec()).map_err(
                |_| PathError::InvalidHint {
                    path: path.to_string(),
                },
            )?)),
            None => None,
        };
        let keep_text = hint.as_ref().is_some_and(carries_scalar);

        let body = match (self.value, self.children) {
            (Some(_), Children::Fields(_) | Children::Items(_)) => {
                return Err(PathError::ValueWithChildren {
                    path: path.to_string(),
                });
            }
            (Some(raw), Children::None) => {
                if !keep_text && raw.as_ref() == EMPTY_SEQUENCE {
                    Node::Sequence(Vec::new())
                } else if !keep_text && raw.as_ref() == EMPTY_OBJECT {
                    Node::Object(Object::new())
                } else {
                    Node::Scalar(Scalar::from_bytes(&raw))
                }
            }
            (None, Children::Fields(fields)) => {
                let mut object = Object::new();
                for (name, child) in fields {
                    path.push(Segment::Field(name.clone()));
                    let node = child.build(path)?;
                    path.pop();
                    object.insert(name, node);
                }
                Node::Object(object)
            }
            (None, Children::Items(items)) => {
                let mut elements = Vec::with_capacity(items.len());
                for (expected, (index, child)) in items.into_iter().enumerate() {
                    if index != expected {
                        return Err(PathError::SequenceGap {
                            path: path.to_string(),
                            missing: expected,
                        });
                    }
                    path.push(Segment::Index(index));
                    elements.push(null_element(child.build(path)?));
                    path.pop();
                }
                Node::Sequence(elements)
            }
            (None, Children::None) => Node::Null,
        };

        Ok(match hint {
            None => body,
            Some(hint) => Node::Typed(hint, Box::new(body)),
        })
    }
}

/// A `null` hint on a sequence element marks a plain null. Elsewhere the hint
/// is kept, so an optional dynamic value reads back as a present null.
fn null_element(node: Node) -> Node {
    match node {
        Node::Typed(hint, inner)
            if hint.as_builtin() == Some(BuiltinHint::Null) && inner.is_null() =>
        {
            Node::Null
        }
        other => other,
    }
}
