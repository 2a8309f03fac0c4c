//! Process-wide mapping from type hints to concrete types.
//!
//! The registry starts empty and grows as polymorphic values are serialized
//! or types are registered explicitly. A hint, once bound, stays bound to the
//! same type for the lifetime of the process.
//!
//! Registrations are also indexed by the type's serde struct name, so neutral
//! mode can hint a registered struct with its `TYPE_HINT` even where it is
//! stored at a concrete position.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use flathash_tree::{from_tree, BuiltinHint, HintResolver, Node, TreeResult, TypeHint};
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::forward_to_deserialize_any;
use tracing::{debug, warn};

use crate::entity::{Entity, Polymorphic};
use crate::error::{HintError, HintResult};

type DecodeFn = fn(Node) -> TreeResult<Box<dyn Entity>>;

/// A type bound to a hint.
#[derive(Clone, Copy, Debug)]
pub struct Registration {
    hint: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
}

impl Registration {
    fn of<T: Polymorphic>() -> Self {
        Self {
            hint: T::TYPE_HINT,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            decode: decode::<T>,
        }
    }

    pub fn hint(&self) -> &'static str {
        self.hint
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Rebuilds a value of the registered type from its tree.
    pub fn decode(&self, node: Node) -> TreeResult<Box<dyn Entity>> {
        (self.decode)(node)
    }
}

fn decode<T: Polymorphic>(node: Node) -> TreeResult<Box<dyn Entity>> {
    let value: T = from_tree(node, TypeRegistry::global())?;
    Ok(Box::new(value))
}

#[derive(Default)]
struct Entries {
    by_hint: HashMap<&'static str, Registration>,
    /// Serde struct name to hint; `None` once two hints share the name.
    by_struct: HashMap<&'static str, Option<&'static str>>,
}

/// Hint-to-type registry.
pub struct TypeRegistry {
    entries: RwLock<Entries>,
}

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

impl TypeRegistry {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::new)
    }

    /// Binds `T::TYPE_HINT` to `T` if it is not bound yet.
    ///
    /// Registering the same type again is a no-op.
    pub fn register<T: Polymorphic>(&self) -> HintResult<()> {
        let registration = Registration::of::<T>();
        if BuiltinHint::parse(registration.hint).is_some() {
            return Err(HintError::ReservedHint(registration.hint.to_string()));
        }

        {
            let entries = self.entries.read().expect("lock poisoned");
            if let Some(existing) = entries.by_hint.get(registration.hint) {
                return check_same(existing, &registration);
            }
        }

        let struct_name = struct_name::<T>();
        let mut entries = self.entries.write().expect("lock poisoned");
        match entries.by_hint.get(registration.hint) {
            Some(existing) => check_same(existing, &registration),
            None => {
                debug!(
                    hint = registration.hint,
                    type_name = registration.type_name,
                    struct_name,
                    "registered type hint"
                );
                entries.by_hint.insert(registration.hint, registration);
                if let Some(name) = struct_name {
                    let slot = entries.by_struct.entry(name).or_insert(Some(registration.hint));
                    if slot.is_some_and(|hint| hint != registration.hint) {
                        warn!(struct_name = name, "struct name shared by several type hints");
                        *slot = None;
                    }
                }
                Ok(())
            }
        }
    }

    /// Looks up the type bound to `hint`.
    pub fn resolve(&self, hint: &str) -> HintResult<Registration> {
        self.entries
            .read()
            .expect("lock poisoned")
            .by_hint
            .get(hint)
            .copied()
            .ok_or_else(|| HintError::UnknownTypeHint(hint.to_string()))
    }

    pub fn is_registered(&self, hint: &str) -> bool {
        self.entries
            .read()
            .expect("lock poisoned")
            .by_hint
            .contains_key(hint)
    }

    /// Number of registered hints.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").by_hint.len()
    }

    /// The hint registered for the struct with the given serde name, unless
    /// several registered types share that name.
    pub fn hint_for_struct(&self, name: &str) -> Option<&'static str> {
        self.entries
            .read()
            .expect("lock poisoned")
            .by_struct
            .get(name)
            .copied()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_same(existing: &Registration, attempted: &Registration) -> HintResult<()> {
    if existing.type_id == attempted.type_id {
        return Ok(());
    }
    warn!(
        hint = existing.hint,
        existing = existing.type_name,
        attempted = attempted.type_name,
        "conflicting type hint registration"
    );
    Err(HintError::ConflictingRegistration {
        hint: existing.hint.to_string(),
        existing: existing.type_name,
        attempted: attempted.type_name,
    })
}

/// The serde name of `T`, when its `Deserialize` impl names a struct.
///
/// Derived impls pass the name to the deserializer before reading any input,
/// so a deserializer that refuses every request learns it without a value.
fn struct_name<T: DeserializeOwned>() -> Option<&'static str> {
    match T::deserialize(NameProbe) {
        Err(NameFound(name)) => name,
        Ok(_) => None,
    }
}

#[derive(Debug)]
struct NameFound(Option<&'static str>);

impl fmt::Display for NameFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("struct name lookup")
    }
}

impl std::error::Error for NameFound {}

impl de::Error for NameFound {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        NameFound(None)
    }
}

struct NameProbe;

impl<'de> Deserializer<'de> for NameProbe {
    type Error = NameFound;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, NameFound> {
        Err(NameFound(None))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, NameFound> {
        Err(NameFound(Some(name)))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

impl HintResolver for TypeRegistry {
    fn recognizes(&self, hint: &TypeHint) -> bool {
        hint.as_builtin().is_some() || self.is_registered(hint.as_str())
    }
}
