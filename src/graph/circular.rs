//! Circular reference detection
//!
//! Answers one question before an edit is made: if the subtree at `child`
//! were placed under `parent` (moved there, or referenced from there), would
//! some definition end up containing itself?
//!
//! Both sides are reduced to the set of definitions they touch. The subtree
//! touches every definition inside it and every definition it references.
//! The insertion point touches every definition above it. A definition can be
//! entered from every reference to it, so walking up from a definition also
//! walks up from each of its referrers.

use std::collections::HashSet;

use crate::node_map::NodeMap;
use crate::pointer::Pointer;

pub struct CircularReferenceDetector<'a> {
    nodes: &'a NodeMap,
}

impl<'a> CircularReferenceDetector<'a> {
    pub fn new(nodes: &'a NodeMap) -> Self {
        Self { nodes }
    }

    pub fn would_create_cycle(&self, child: &str, parent: &str) -> bool {
        if child == parent {
            return true;
        }
        let within = self.definitions_within(child);
        if within.is_empty() {
            return false;
        }
        let above = self.definitions_above(parent);
        !within.is_disjoint(&above)
    }

    /// Definitions declared in or referenced from the subtree at `pointer`
    pub fn definitions_within(&self, pointer: &str) -> HashSet<Pointer> {
        let mut found = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![Pointer::from(pointer)];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Ok(node) = self.nodes.get(current.as_str()) else {
                continue;
            };
            if node.is_definition() {
                found.insert(node.pointer.clone());
            }
            if let Some(target) = node.reference_target() {
                found.insert(target.clone());
            }
            stack.extend(node.children().iter().cloned());
        }
        found
    }

    /// Definitions the node at `pointer` sits in, directly or through any
    /// reference leading to one of its enclosing definitions
    pub fn definitions_above(&self, pointer: &str) -> HashSet<Pointer> {
        let mut found = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![Pointer::from(pointer)];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Ok(node) = self.nodes.get(current.as_str()) else {
                continue;
            };
            if let Some(target) = node.reference_target() {
                found.insert(target.clone());
            }
            if node.is_definition() {
                found.insert(node.pointer.clone());
                stack.extend(
                    self.nodes
                        .referring_nodes(current.as_str())
                        .into_iter()
                        .map(|referrer| referrer.pointer.clone()),
                );
            }
            if let Some(parent) = self.nodes.find_parent(current.as_str()) {
                stack.push(parent.pointer.clone());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FieldType, UiSchemaNode};

    /// Root with `D` (holding object `o`), `E` (holding a reference to `D`),
    /// a reference `r` to `D` and an unrelated object `plain`.
    fn nodes() -> NodeMap {
        let mut root = UiSchemaNode::field("#", FieldType::Object);
        *root.children_mut().unwrap() = vec![
            "#/properties/r".into(),
            "#/properties/plain".into(),
            "#/$defs/D".into(),
            "#/$defs/E".into(),
        ];
        let mut d = UiSchemaNode::field("#/$defs/D", FieldType::Object);
        d.children_mut().unwrap().push("#/$defs/D/properties/o".into());
        let mut e = UiSchemaNode::field("#/$defs/E", FieldType::Object);
        e.children_mut().unwrap().push("#/$defs/E/properties/d".into());

        NodeMap::from_nodes(vec![
            root,
            UiSchemaNode::reference("#/properties/r", "#/$defs/D"),
            UiSchemaNode::field("#/properties/plain", FieldType::Object),
            d,
            UiSchemaNode::field("#/$defs/D/properties/o", FieldType::Object),
            e,
            UiSchemaNode::reference("#/$defs/E/properties/d", "#/$defs/D"),
        ])
    }

    #[test]
    fn test_definition_under_its_own_reference() {
        let nodes = nodes();
        let detector = CircularReferenceDetector::new(&nodes);
        assert!(detector.would_create_cycle("#/$defs/D", "#/properties/r"));
    }

    #[test]
    fn test_unrelated_parent() {
        let nodes = nodes();
        let detector = CircularReferenceDetector::new(&nodes);
        assert!(!detector.would_create_cycle("#/$defs/D", "#/properties/plain"));
        assert!(!detector.would_create_cycle("#/properties/plain", "#/$defs/D/properties/o"));
    }

    #[test]
    fn test_transitive_through_intermediate_reference() {
        let nodes = nodes();
        let detector = CircularReferenceDetector::new(&nodes);
        // E refers to D, so E may not be placed inside D.
        assert!(detector.would_create_cycle("#/$defs/E", "#/$defs/D/properties/o"));
        assert!(!detector.would_create_cycle("#/$defs/D", "#/properties/plain"));
    }

    #[test]
    fn test_same_pointer() {
        let nodes = nodes();
        let detector = CircularReferenceDetector::new(&nodes);
        assert!(detector.would_create_cycle("#/properties/plain", "#/properties/plain"));
    }

    #[test]
    fn test_definition_sets() {
        let nodes = nodes();
        let detector = CircularReferenceDetector::new(&nodes);
        let within = detector.definitions_within("#/$defs/E");
        assert!(within.contains("#/$defs/E"));
        assert!(within.contains("#/$defs/D"));

        let above = detector.definitions_above("#/$defs/D/properties/o");
        assert!(above.contains("#/$defs/D"));
        // D is entered from the reference inside E
        assert!(above.contains("#/$defs/E"));

        let top = detector.definitions_above("#/properties/plain");
        assert!(top.is_empty());
    }
}
