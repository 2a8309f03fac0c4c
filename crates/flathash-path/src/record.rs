use bytes::Bytes;
use indexmap::IndexMap;

/// A single-level mapping from path keys to raw values.
///
/// Entries keep insertion order so flattened output is deterministic.
/// Equality ignores order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatRecord {
    entries: IndexMap<String, Bytes>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Option<Bytes> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.entries.get(key)
    }

    /// The value for `key`, if present and valid UTF-8.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Bytes> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Bytes> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Bytes> {
        self.entries.keys()
    }

    /// Sorts entries by key, for stable display.
    pub fn sort_keys(&mut self) {
        self.entries.sort_keys();
    }
}

impl<K: Into<String>, V: Into<Bytes>> FromIterator<(K, V)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FlatRecord::new();
        record.extend(iter);
        record
    }
}

impl<K: Into<String>, V: Into<Bytes>> Extend<(K, V)> for FlatRecord {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, Bytes);
    type IntoIter = indexmap::map::IntoIter<String, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlatRecord {
    type Item = (&'a String, &'a Bytes);
    type IntoIter = indexmap::map::Iter<'a, String, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_order() {
        let a: FlatRecord = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: FlatRecord = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn string_access() {
        let mut record = FlatRecord::new();
        record.insert("name", "jon");
        record.insert("raw", vec![0xff, 0xfe]);
        assert_eq!(record.get_str("name"), Some("jon"));
        assert_eq!(record.get_str("raw"), None);
        assert!(record.contains_key("raw"));
        assert_eq!(record.remove("raw").map(|v| v.len()), Some(2));
        assert_eq!(record.len(), 1);
    }
}
