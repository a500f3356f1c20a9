//! Orders top-level definitions so referenced types come first.

use crate::references::ReferenceMap;
use crate::source::NodeId;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

/// Returns definition ids in emission order.
///
/// Definitions are visited in document order; each one contributes its
/// references, then its own name, to a single ordered name set. Names with
/// no definition are dropped. When names repeat, the last definition wins.
///
/// This is not a topological sort. Mutually referencing definitions keep
/// the order in which they were first referenced.
#[must_use]
pub fn linearize(definitions: &[(NodeId, &str)], references: &ReferenceMap) -> Vec<NodeId> {
    let mut order: IndexSet<&str, FxBuildHasher> = IndexSet::default();
    for &(id, name) in definitions {
        order.extend(references.names(id));
        order.insert(name);
    }

    let by_name: FxHashMap<&str, NodeId> = definitions.iter().map(|&(id, name)| (name, id)).collect();

    order
        .into_iter()
        .filter_map(|name| {
            let id = by_name.get(name).copied();
            if id.is_none() {
                debug!(name, "dropping reference without a definition");
            }
            id
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> NodeId {
        NodeId::from_raw(raw)
    }

    #[test]
    fn test_references_are_pulled_forward() {
        let (foo_bar, bar, baz, foo) = (id(1), id(2), id(3), id(4));
        let mut references = ReferenceMap::new();
        references.record(&[foo_bar], "Foo");
        references.record(&[foo_bar], "Bar");
        references.record(&[bar], "Foo");

        let order = linearize(
            &[(foo_bar, "FooBar"), (bar, "Bar"), (baz, "Baz"), (foo, "Foo")],
            &references,
        );
        assert_eq!(order, [foo, bar, foo_bar, baz]);
    }

    #[test]
    fn test_unknown_names_are_dropped() {
        let event = id(1);
        let mut references = ReferenceMap::new();
        references.record(&[event], "Actor");
        references.record(&[event], "DateTime");

        let order = linearize(&[(event, "AssignedEvent")], &references);
        assert_eq!(order, [event]);
    }

    // Known limitation: cycles are not detected. The first reference decides
    // the order, so `B` comes out before `A` here even though `B` needs `A`.
    #[test]
    fn test_mutual_references_keep_first_reference_order() {
        let (a, b) = (id(1), id(2));
        let mut references = ReferenceMap::new();
        references.record(&[a], "B");
        references.record(&[b], "A");

        assert_eq!(linearize(&[(a, "A"), (b, "B")], &references), [b, a]);
    }

    #[test]
    fn test_duplicate_names_keep_last_definition() {
        let (first, second, other) = (id(1), id(2), id(3));
        let references = ReferenceMap::new();

        let order = linearize(
            &[(first, "Node"), (other, "Other"), (second, "Node")],
            &references,
        );
        assert_eq!(order, [second, other]);
    }

    #[test]
    fn test_self_reference() {
        let comment = id(1);
        let mut references = ReferenceMap::new();
        references.record(&[comment], "Comment");

        assert_eq!(linearize(&[(comment, "Comment")], &references), [comment]);
    }
}
