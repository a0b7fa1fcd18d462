use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One node of a cached subtree.
///
/// Both parts are optional. A node without a value and without children is
/// equivalent to no node at all, and `children: Some(empty)` is equivalent to
/// `children: None`; serializers never emit the empty forms and decode them
/// back as `None`.
///
/// The serde representation uses the short keys `v` and `c`, the same keys
/// the cache uses for the binary tree schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree<V> {
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, Tree<V>>>,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self { value: None, children: None }
    }
}

impl<V> Tree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node holding only a value.
    pub fn leaf(value: V) -> Self {
        Self { value: Some(value), children: None }
    }

    pub fn with_value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    /// Add (or replace) the child under `label`.
    pub fn with_child(mut self, label: impl Into<String>, child: Tree<V>) -> Self {
        self.children
            .get_or_insert_with(BTreeMap::new)
            .insert(label.into(), child);
        self
    }

    pub fn child(&self, label: &str) -> Option<&Tree<V>> {
        self.children.as_ref()?.get(label)
    }

    /// Descend through `path`, one label per level.
    pub fn descend<'a, I>(&self, path: I) -> Option<&Tree<V>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for label in path {
            current = current.child(label)?;
        }
        Some(current)
    }

    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// True when the node carries nothing: no value and no children.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && !self.has_children()
    }

    /// Iterate over `(label, child)` pairs in label order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Tree<V>)> {
        self.children
            .iter()
            .flat_map(|c| c.iter().map(|(label, child)| (label.as_str(), child)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree<Vec<u8>> {
        Tree::leaf(vec![1, 2])
            .with_child("a", Tree::leaf(vec![3, 4]).with_child("a1", Tree::leaf(vec![5, 6])))
            .with_child("b", Tree::leaf(vec![7, 8]))
    }

    #[test]
    fn descend_follows_labels() {
        let tree = sample();
        assert_eq!(tree.descend(["a", "a1"]).and_then(|n| n.value.clone()), Some(vec![5, 6]));
        assert!(tree.descend(["a", "missing"]).is_none());
        assert_eq!(tree.descend(Vec::<&str>::new()), Some(&tree));
    }

    #[test]
    fn empty_children_map_counts_as_absent() {
        let node: Tree<Vec<u8>> = Tree { value: None, children: Some(BTreeMap::new()) };
        assert!(!node.has_children());
        assert!(node.is_empty());
        assert_eq!(node.children().count(), 0);
    }

    #[test]
    fn serde_uses_short_keys_and_skips_absent_parts() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "v": [1, 2],
                "c": {
                    "a": { "v": [3, 4], "c": { "a1": { "v": [5, 6] } } },
                    "b": { "v": [7, 8] }
                }
            })
        );
        let back: Tree<Vec<u8>> = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
