#![allow(dead_code)]

use std::fmt::Debug;

use flathash_mapper::{FlatHashMapper, Polymorphic, Value};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub first: String,
    pub last: String,
    pub age: u32,
    pub address: Option<Address>,
}

impl Person {
    pub fn new(first: &str, last: &str, age: u32) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            age,
            address: None,
        }
    }
}

impl Polymorphic for Person {
    const TYPE_HINT: &'static str = "org.example.Person";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithList {
    pub strings: Option<Vec<String>>,
    pub objects: Option<Vec<Value>>,
    pub persons: Option<Vec<Person>>,
}

impl Polymorphic for WithList {
    const TYPE_HINT: &'static str = "org.example.WithList";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithMap {
    pub strings: Option<IndexMap<String, String>>,
    pub objects: Option<IndexMap<String, Value>>,
    pub persons: Option<IndexMap<String, Person>>,
}

impl Polymorphic for WithMap {
    const TYPE_HINT: &'static str = "org.example.WithMap";
}

pub fn jon() -> Person {
    Person::new("jon", "snow", 19)
}

pub fn jon_with_address() -> Person {
    Person {
        address: Some(Address {
            street: "the wall".into(),
            number: 100,
        }),
        ..jon()
    }
}

pub fn mappers() -> [FlatHashMapper; 2] {
    [FlatHashMapper::neutral(), FlatHashMapper::lenient()]
}

/// Maps `source` to a record and back with every mapper, expecting equality.
pub fn assert_back_and_forward<T>(source: &T)
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    for mapper in mappers() {
        let record = mapper.to_hash(source).unwrap();
        let back: T = mapper.from_hash(&record).unwrap_or_else(|err| {
            panic!("{:?} mode failed on {record:?}: {err}", mapper.mode())
        });
        assert_eq!(&back, source, "{:?} mode, record {record:?}", mapper.mode());
    }
}
