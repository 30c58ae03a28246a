//! Insertion-ordered string set
//!
//! Display orders are "first seen wins". This keeps that order explicit
//! instead of relying on the iteration order of a map.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet {
    items: Vec<String>,
    positions: HashMap<String, usize>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; returns `false` if it was already present
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.positions.contains_key(&value) {
            return false;
        }
        self.positions.insert(value.clone(), self.items.len());
        self.items.push(value);
        true
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.positions.get(value).copied()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.positions.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for OrderedSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl Serialize for OrderedSet {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OrderedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insertion_wins() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.as_slice(), &["b".to_string(), "a".to_string()]);
        assert_eq!(set.position("a"), Some(1));
        assert_eq!(set.position("z"), None);
    }

    #[test]
    fn test_serializes_as_list() {
        let set: OrderedSet = ["x", "y", "x"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["x","y"]"#);
        let back: OrderedSet = serde_json::from_str(r#"["y","y","x"]"#).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.position("x"), Some(1));
    }
}
