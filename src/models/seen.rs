//! Seen-set of delivered listing identifiers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifiers of listings that have already been delivered.
///
/// The set only grows: there is no removal API. Serialized as a plain
/// sorted JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns `true` if it was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Whether every identifier in `other` is also in `self`.
    pub fn is_superset(&self, other: &SeenSet) -> bool {
        self.ids.is_superset(&other.ids)
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_novelty() {
        let mut seen = SeenSet::new();
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_serializes_as_sorted_array() {
        let seen: SeenSet = ["c", "a", "b"].into_iter().collect();
        let json = serde_json::to_string(&seen).unwrap();
        assert_eq!(json, r#"["a","b","c"]"#);

        let back: SeenSet = serde_json::from_str(r#"["x","y"]"#).unwrap();
        assert!(back.contains("x") && back.contains("y"));
    }

    #[test]
    fn test_superset() {
        let small: SeenSet = ["a"].into_iter().collect();
        let big: SeenSet = ["a", "b"].into_iter().collect();
        assert!(big.is_superset(&small));
        assert!(!small.is_superset(&big));
    }
}
