//! Per-node records of referenced type names.

use crate::source::NodeId;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Referenced names in first-referenced order, without duplicates.
pub type References = IndexSet<String, FxBuildHasher>;

/// Maps each node to the type names referenced beneath it.
#[derive(Debug, Default)]
pub struct ReferenceMap {
    map: FxHashMap<NodeId, References>,
}

impl ReferenceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` on every node of the ancestor path.
    pub fn record(&mut self, ancestors: &[NodeId], name: &str) {
        for &ancestor in ancestors {
            let references = self.map.entry(ancestor).or_default();
            if !references.contains(name) {
                references.insert(name.to_string());
            }
        }
    }

    /// Returns the references recorded for a node, if any.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&References> {
        self.map.get(&id)
    }

    /// Iterates the names referenced beneath a node.
    pub fn names(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get(id).into_iter().flatten().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_on_every_ancestor() {
        let document = NodeId::from_raw(9);
        let object = NodeId::from_raw(7);
        let field = NodeId::from_raw(5);

        let mut references = ReferenceMap::new();
        references.record(&[document, object, field], "Topic");
        references.record(&[document, object], "Actor");
        references.record(&[document, object, field], "Topic");

        assert_eq!(references.names(document).collect::<Vec<_>>(), ["Topic", "Actor"]);
        assert_eq!(references.names(object).collect::<Vec<_>>(), ["Topic", "Actor"]);
        assert_eq!(references.names(field).collect::<Vec<_>>(), ["Topic"]);
        assert!(references.get(NodeId::from_raw(0)).is_none());
        assert_eq!(references.names(NodeId::from_raw(0)).count(), 0);
    }
}
