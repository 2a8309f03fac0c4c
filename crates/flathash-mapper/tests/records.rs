mod common;

use flathash_mapper::{ErrorKind, FlatHashMapper, FlatRecord, MapperConfig, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use common::*;

fn flat(entries: &[(&str, &str)]) -> FlatRecord {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Roster {
    name: String,
    persons: IndexMap<String, Person>,
    anything: Value,
}

fn roster() -> Roster {
    Roster {
        name: "jon".into(),
        persons: [("1".to_string(), jon())].into_iter().collect(),
        anything: Value::entity(jon()),
    }
}

#[test]
fn lenient_hints_only_polymorphic_positions() {
    let record = FlatHashMapper::lenient().to_hash(&roster()).unwrap();

    assert_eq!(record.get_str("name"), Some("jon"));
    assert_eq!(record.get_str("persons.1.first"), Some("jon"));
    assert_eq!(record.get_str("persons.1.last"), Some("snow"));
    assert_eq!(record.get_str("persons.1.age"), Some("19"));
    assert!(!record.contains_key("persons.1.@class"));
    assert!(!record.contains_key("@class"));

    assert_eq!(
        record.get_str("anything.@class"),
        Some("org.example.Person")
    );
    assert_eq!(record.get_str("anything.first"), Some("jon"));
}

#[test]
fn neutral_hints_every_object() {
    let record = FlatHashMapper::neutral().to_hash(&roster()).unwrap();

    assert_eq!(record.get_str("@class"), Some("Roster"));
    assert_eq!(record.get_str("persons.@class"), Some("map"));
    // Person registered itself while `anything` was serialized.
    assert_eq!(
        record.get_str("persons.1.@class"),
        Some("org.example.Person")
    );
    assert_eq!(
        record.get_str("anything.@class"),
        Some("org.example.Person")
    );
    assert_eq!(record.get_str("persons.1.first"), Some("jon"));

    let back: Roster = FlatHashMapper::neutral().from_hash(&record).unwrap();
    assert_eq!(back, roster());
}

#[test]
fn neutral_hints_of_registered_types_resolve() {
    let mapper = FlatHashMapper::neutral();
    mapper.register::<Person>().unwrap();

    let record = mapper.to_hash(&jon()).unwrap();
    assert_eq!(record.get_str("@class"), Some("org.example.Person"));

    let back: Value = mapper.from_hash(&record).unwrap();
    assert_eq!(back.as_entity::<Person>(), Some(&jon()));
    let back: Person = mapper.from_hash(&record).unwrap();
    assert_eq!(back, jon());
}

#[test]
fn both_modes_read_each_others_records() {
    let neutral = FlatHashMapper::neutral().to_hash(&roster()).unwrap();
    let lenient = FlatHashMapper::lenient().to_hash(&roster()).unwrap();
    assert_ne!(neutral, lenient);

    let back: Roster = FlatHashMapper::lenient().from_hash(&neutral).unwrap();
    assert_eq!(back, roster());
    let back: Roster = FlatHashMapper::neutral().from_hash(&lenient).unwrap();
    assert_eq!(back, roster());
}

#[test]
fn untyped_list_keys() {
    let source = WithList {
        objects: Some(vec![Value::Int(100), Value::from("foo"), Value::entity(jon())]),
        ..Default::default()
    };
    let record = FlatHashMapper::lenient().to_hash(&source).unwrap();
    let expected = flat(&[
        ("objects[0].@class", "int"),
        ("objects[0]", "100"),
        ("objects[1]", "foo"),
        ("objects[2].@class", "org.example.Person"),
        ("objects[2].first", "jon"),
        ("objects[2].last", "snow"),
        ("objects[2].age", "19"),
    ]);
    assert_eq!(record, expected);
}

#[test]
fn empty_and_null_fields_are_distinguished() {
    let source = WithList {
        strings: Some(vec![]),
        ..Default::default()
    };
    let record = FlatHashMapper::lenient().to_hash(&source).unwrap();
    assert_eq!(record, flat(&[("strings", "[]")]));

    let back: WithList = FlatHashMapper::lenient().from_hash(&record).unwrap();
    assert_eq!(back.strings, Some(vec![]));
    assert_eq!(back.objects, None);
}

#[test]
fn record_reads_from_hand_written_text() {
    let record = flat(&[
        ("first", "arya"),
        ("last", "stark"),
        ("age", "11"),
        ("address.street", "kings road"),
        ("address.number", "-3"),
    ]);
    let person: Person = FlatHashMapper::lenient().from_hash(&record).unwrap();
    assert_eq!(person.age, 11);
    assert_eq!(person.address.map(|a| a.number), Some(-3));
}

#[test]
fn sequence_gap_is_malformed() {
    let record = flat(&[("strings[0]", "a"), ("strings[2]", "c")]);
    let err = FlatHashMapper::lenient()
        .from_hash::<WithList>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
    assert!(err.to_string().contains("missing index 1"), "{err}");
}

#[test]
fn mixed_segments_are_malformed() {
    let record = flat(&[("strings[0]", "a"), ("strings.x", "c")]);
    let err = FlatHashMapper::lenient()
        .from_hash::<WithList>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
}

#[test]
fn unparsable_key_is_malformed() {
    let record = flat(&[("strings[01]", "a")]);
    let err = FlatHashMapper::lenient()
        .from_hash::<WithList>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
}

#[test]
fn missing_required_field_fails() {
    let record = flat(&[("first", "jon")]);
    let err = FlatHashMapper::lenient()
        .from_hash::<Person>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
}

#[test]
fn unknown_type_hint_fails() {
    let record = flat(&[
        ("objects[0].@class", "org.example.Nobody"),
        ("objects[0].name", "ghost"),
    ]);
    let err = FlatHashMapper::lenient()
        .from_hash::<WithList>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTypeHint);
}

#[test]
fn unknown_type_hint_inside_entity_fails() {
    FlatHashMapper::lenient().register::<WithList>().unwrap();
    let record = flat(&[
        ("objects.1.@class", "org.example.WithList"),
        ("objects.1.objects[0].@class", "org.example.Nobody"),
        ("objects.1.objects[0].name", "ghost"),
    ]);
    let err = FlatHashMapper::lenient()
        .from_hash::<WithMap>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTypeHint);
}

#[test]
fn non_numeric_text_is_a_type_mismatch() {
    let record = flat(&[("first", "jon"), ("last", "snow"), ("age", "nineteen")]);
    let err = FlatHashMapper::lenient()
        .from_hash::<Person>(&record)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn empty_field_name_is_unsupported() {
    let source: IndexMap<String, String> =
        [(String::new(), "x".to_string())].into_iter().collect();
    let err = FlatHashMapper::lenient().to_hash(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
}

#[test]
fn depth_limit_is_unsupported() {
    let mut value = Value::Int(1);
    for _ in 0..8 {
        value = Value::List(vec![value]);
    }
    let mapper = FlatHashMapper::new(MapperConfig {
        max_depth: 4,
        ..Default::default()
    });
    let err = mapper.to_hash(&value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
}

#[test]
fn null_elements_at_the_depth_limit() {
    let mapper = FlatHashMapper::new(MapperConfig {
        max_depth: 1,
        ..Default::default()
    });
    let err = mapper.to_hash(&vec![vec![None::<i32>]]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedValue);

    let shallow = vec![None, Some(4)];
    let record = mapper.to_hash(&shallow).unwrap();
    assert_eq!(record, flat(&[("[0].@class", "null"), ("[1]", "4")]));
    assert_eq!(mapper.from_hash::<Vec<Option<i32>>>(&record).unwrap(), shallow);
}

#[test]
fn present_null_in_optional_value() {
    let mapper = FlatHashMapper::lenient();
    let record = flat(&[("@class", "null")]);
    assert_eq!(
        mapper.from_hash::<Option<Value>>(&record).unwrap(),
        Some(Value::Null)
    );
    assert_eq!(
        mapper.from_hash::<Option<Value>>(&FlatRecord::new()).unwrap(),
        None
    );
}

#[test]
fn bare_scalar_root() {
    let mapper = FlatHashMapper::lenient();
    let record = mapper.to_hash(&42u32).unwrap();
    assert_eq!(record, flat(&[("", "42")]));
    assert_eq!(mapper.from_hash::<u32>(&record).unwrap(), 42);

    let record = mapper.to_hash(&Value::Int(7)).unwrap();
    assert_eq!(record, flat(&[("@class", "int"), ("", "7")]));
    assert_eq!(mapper.from_hash::<Value>(&record).unwrap(), Value::Int(7));
}

#[test]
fn absent_optional_root_is_none() {
    let mapper = FlatHashMapper::lenient();
    let record = mapper.to_hash(&Option::<Person>::None).unwrap();
    assert!(record.is_empty());
    assert_eq!(mapper.from_hash::<Option<Person>>(&record).unwrap(), None);
}
