use flathash_tree::{BuiltinHint, Node, Object, TypeHint};
use serde::{Deserialize, Serialize};

use crate::registry::TypeRegistry;

/// When object positions receive type hints.
///
/// In both modes, values behind a polymorphic position (a [`Value`](crate::Value))
/// are hinted whenever their shape alone does not identify their type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeHintingMode {
    /// Every object is hinted, whether or not its position is concrete.
    ///
    /// A struct is hinted with its registered `TYPE_HINT`, or with its serde
    /// name when it is not registered.
    Neutral,
    /// Only polymorphic positions are hinted.
    #[default]
    Lenient,
}

impl TypeHintingMode {
    /// Applies the mode's hinting policy to a freshly serialized tree.
    pub fn annotate(self, node: Node) -> Node {
        match self {
            TypeHintingMode::Lenient => node,
            TypeHintingMode::Neutral => hint_objects(node),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeHintingMode::Neutral => "neutral",
            TypeHintingMode::Lenient => "lenient",
        }
    }
}

impl std::fmt::Display for TypeHintingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn hint_objects(node: Node) -> Node {
    match node {
        Node::Object(object) => {
            let hint = match object.name() {
                Some(name) => {
                    TypeHint::new(TypeRegistry::global().hint_for_struct(name).unwrap_or(name))
                }
                None => TypeHint::builtin(BuiltinHint::Map),
            };
            Node::Typed(hint, Box::new(Node::Object(hint_fields(object))))
        }
        Node::Typed(hint, inner) => {
            let inner = match *inner {
                Node::Object(object) => Node::Object(hint_fields(object)),
                other => hint_objects(other),
            };
            Node::Typed(hint, Box::new(inner))
        }
        Node::Sequence(items) => Node::Sequence(items.into_iter().map(hint_objects).collect()),
        other => other,
    }
}

fn hint_fields(object: Object) -> Object {
    let name = object.name().map(str::to_string);
    let mut hinted: Object = object
        .into_iter()
        .map(|(field, child)| (field, hint_objects(child)))
        .collect();
    hinted.set_name(name);
    hinted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Node {
        let mut address = Object::named("Address");
        address.insert("street", Node::str("the wall"));
        let mut person = Object::named("Contact");
        person.insert("first", Node::str("jon"));
        person.insert("address", Node::Object(address));
        Node::Object(person)
    }

    #[test]
    fn lenient_is_identity() {
        assert_eq!(TypeHintingMode::Lenient.annotate(person()), person());
    }

    #[test]
    fn neutral_hints_every_object() {
        let Node::Typed(hint, inner) = TypeHintingMode::Neutral.annotate(person()) else {
            panic!("expected hinted root");
        };
        assert_eq!(hint.as_str(), "Contact");
        let Node::Object(fields) = *inner else {
            panic!("expected object");
        };
        assert_eq!(fields.get("first"), Some(&Node::str("jon")));
        assert_eq!(
            fields.get("address").and_then(Node::hint).map(TypeHint::as_str),
            Some("Address")
        );
    }

    #[test]
    fn neutral_hints_maps_and_keeps_existing_hints() {
        let mut map = Object::new();
        map.insert("1", Node::str("spring"));
        let node = Node::Sequence(vec![
            Node::Object(map),
            Node::typed("com.example.Person", person()),
            Node::str("plain"),
        ]);
        let Node::Sequence(items) = TypeHintingMode::Neutral.annotate(node) else {
            panic!("expected sequence");
        };
        assert_eq!(items[0].hint().map(TypeHint::as_str), Some("map"));
        assert_eq!(
            items[1].hint().map(TypeHint::as_str),
            Some("com.example.Person")
        );
        assert!(matches!(&items[1], Node::Typed(_, inner) if matches!(**inner, Node::Object(_))));
        assert_eq!(items[2], Node::str("plain"));
    }

    #[test]
    fn neutral_uses_registered_hints() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Badge {
            rank: u8,
        }

        impl crate::Polymorphic for Badge {
            const TYPE_HINT: &'static str = "test.mode.Badge";
        }

        TypeRegistry::global().register::<Badge>().unwrap();
        let node = flathash_tree::to_tree(&Badge { rank: 3 }).unwrap();
        let hinted = TypeHintingMode::Neutral.annotate(node);
        assert_eq!(hinted.hint().map(TypeHint::as_str), Some("test.mode.Badge"));
    }

    #[test]
    fn parses_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: TypeHintingMode,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"mode":"neutral"}"#).unwrap();
        assert_eq!(parsed.mode, TypeHintingMode::Neutral);
        assert_eq!(TypeHintingMode::default(), TypeHintingMode::Lenient);
    }
}
