use alloc::vec::Vec;

use super::Value;

/// An insertion-ordered mapping with arbitrary [`Value`] keys.
///
/// Keys are compared by structural equality. Entries are stored in a `Vec`
/// to preserve insertion order through validation; lookup is O(n), which is
/// acceptable because validation iterates entries rather than probing, and
/// struct nodes keep their own indexed field tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    entries: Vec<(Value, Value)>,
}

impl Map {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty mapping with space for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, replacing the value of a structurally equal key in
    /// place. Returns the previous value if one was replaced.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        for (k, v) in &mut self.entries {
            if *k == key {
                return Some(core::mem::replace(v, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    /// Looks up a value by structural key equality.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a value under a string key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if s.as_ref() == key))
            .map(|(_, v)| v)
    }

    /// Returns whether a string key is present.
    #[must_use]
    pub fn contains_str(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// The underlying entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k.into(), v.into());
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (Value, Value);
    type IntoIter = alloc::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_preserved() {
        let map: Map = [("b", 1_i64), ("a", 2), ("c", 3)].into_iter().collect();
        let keys: Vec<_> = map.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![Value::from("b"), Value::from("a"), Value::from("c")]
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = Map::new();
        map.insert("a".into(), 1_i64.into());
        map.insert("b".into(), 2_i64.into());
        let old = map.insert("a".into(), 3_i64.into());
        assert_eq!(old, Some(Value::from(1_i64)));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("a"), Some(&Value::from(3_i64)));
        // The replaced key keeps its original position.
        assert_eq!(map.entries()[0].0, Value::from("a"));
    }

    #[test]
    fn structural_key_equality() {
        let mut map = Map::new();
        map.insert(Value::from(1_i64), "int".into());
        map.insert(Value::from("1"), "str".into());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from(1_i64)), Some(&Value::from("int")));
        assert_eq!(map.get(&Value::from("1")), Some(&Value::from("str")));
    }
}
