//! Definition graph analysis
//!
//! One vertex per definition, one edge `A -> B` whenever a reference to `B`
//! appears anywhere in the subtree of `A`. Cycles are found as strongly
//! connected components, usage as reachability from the references in the
//! document body.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use crate::model::SchemaModel;
use crate::node_map::NodeMap;
use crate::pointer::{is_definition_pointer, Pointer, ROOT_POINTER};

#[derive(Debug, Clone)]
pub struct DefinitionGraph {
    graph: DiGraph<Pointer, ()>,
    index: HashMap<Pointer, NodeIndex>,
    /// Definitions referenced from outside the definitions namespace
    entry_points: Vec<Pointer>,
}

impl DefinitionGraph {
    pub fn build(model: &SchemaModel) -> Self {
        Self::from_nodes(model.node_map())
    }

    pub fn from_nodes(nodes: &NodeMap) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for node in nodes.values().filter(|n| n.is_definition()) {
            let idx = graph.add_node(node.pointer.clone());
            index.insert(node.pointer.clone(), idx);
        }

        for (definition, &from) in &index {
            for target in referenced_in_subtree(nodes, definition.as_str(), false) {
                if let Some(&to) = index.get(&target) {
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        let entry_points = referenced_in_subtree(nodes, ROOT_POINTER, true);

        Self {
            graph,
            index,
            entry_points,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Groups of definitions that reach themselves, each sorted
    pub fn cycles(&self) -> Vec<Vec<Pointer>> {
        let mut groups = Vec::new();
        for scc in kosaraju_scc(&self.graph) {
            let is_cycle = if scc.len() == 1 {
                let idx = scc[0];
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .any(|e| e.target() == idx)
            } else {
                true
            };
            if is_cycle {
                let mut members: Vec<Pointer> = scc
                    .iter()
                    .filter_map(|idx| self.graph.node_weight(*idx).cloned())
                    .collect();
                members.sort();
                groups.push(members);
            }
        }
        groups.sort();
        groups
    }

    pub fn is_acyclic(&self) -> bool {
        self.cycles().is_empty()
    }

    /// Definitions reachable from the document body through references
    pub fn definitions_in_use(&self) -> HashSet<Pointer> {
        let mut used = HashSet::new();
        for entry in &self.entry_points {
            let Some(&start) = self.index.get(entry) else {
                continue;
            };
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                if let Some(pointer) = self.graph.node_weight(idx) {
                    used.insert(pointer.clone());
                }
            }
        }
        used
    }

    /// Definitions nothing in the document body leads to, sorted
    pub fn unused_definitions(&self) -> Vec<Pointer> {
        let used = self.definitions_in_use();
        let mut unused: Vec<Pointer> = self
            .index
            .keys()
            .filter(|pointer| !used.contains(*pointer))
            .cloned()
            .collect();
        unused.sort();
        unused
    }

    /// Definitions referenced directly from inside `definition`
    pub fn dependencies(&self, definition: &str) -> Vec<Pointer> {
        let Some(&idx) = self.index.get(definition) else {
            return Vec::new();
        };
        let mut deps: Vec<Pointer> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        deps.sort();
        deps
    }
}

/// Reference targets found below `start`, in document order.
/// With `skip_definitions`, subtrees of definitions are not entered.
fn referenced_in_subtree(nodes: &NodeMap, start: &str, skip_definitions: bool) -> Vec<Pointer> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![Pointer::from(start)];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let Ok(node) = nodes.get(current.as_str()) else {
            continue;
        };
        if let Some(target) = node.reference_target() {
            if !found.contains(target) {
                found.push(target.clone());
            }
        }
        for child in node.children().iter().rev() {
            if skip_definitions && is_definition_pointer(child.as_str()) {
                continue;
            }
            stack.push(child.clone());
        }
    }
    found
}
