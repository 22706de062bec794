//! Invariant validation
//!
//! Checks a node list against the structural rules every model must obey
//! after a successful edit: unique pointers, a field or combination root,
//! closed and single-parented children lists, references to existing
//! definitions, no definition cycles and pointers that spell out the path
//! through the children lists.

use std::collections::{HashMap, HashSet};

use super::analysis::DefinitionGraph;
use super::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::node::UiSchemaNode;
use crate::node_map::NodeMap;
use crate::pointer::{
    create_property_pointer, extract_name_from_pointer, is_definition_pointer, Pointer,
    ROOT_POINTER,
};

pub fn validate_nodes(nodes: &[UiSchemaNode]) -> Diagnostics {
    let mut diags = Diagnostics::new();

    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.pointer.as_str()) {
            diags.report(
                node.pointer.clone(),
                DiagnosticCode::DuplicatePointer,
                "pointer is used by more than one node",
            );
        }
    }

    let map = NodeMap::from_nodes(nodes.iter().cloned());
    check_root(&map, &mut diags);
    check_parent_links(&map, &mut diags);
    check_references(&map, &mut diags);
    check_positions(&map, &mut diags);
    check_definition_graph(&map, &mut diags);
    diags
}

fn check_root(map: &NodeMap, diags: &mut Diagnostics) {
    match map.get(ROOT_POINTER) {
        Err(_) => diags.report(ROOT_POINTER, DiagnosticCode::MissingRoot, "no root node"),
        Ok(root) if root.is_reference() => {
            diags.report(ROOT_POINTER, DiagnosticCode::InvalidRoot, "root is a reference")
        }
        Ok(_) => {}
    }
}

fn check_parent_links(map: &NodeMap, diags: &mut Diagnostics) {
    let mut parents: HashMap<&Pointer, Vec<&Pointer>> = HashMap::new();

    for node in map.values() {
        for child in node.children() {
            if !map.has(child.as_str()) {
                diags.push(
                    DiagnosticItem::new(
                        node.pointer.clone(),
                        DiagnosticCode::DanglingChild,
                        format!("child {} does not exist", child),
                    )
                    .with_context(child.to_string()),
                );
            }
            parents.entry(child).or_default().push(&node.pointer);
        }
    }

    for node in map.values() {
        if node.is_root() {
            continue;
        }
        match parents.get(&node.pointer) {
            None => diags.report(
                node.pointer.clone(),
                DiagnosticCode::OrphanNode,
                "node is not listed as a child of any node",
            ),
            Some(list) if list.len() > 1 => {
                let mut item = DiagnosticItem::new(
                    node.pointer.clone(),
                    DiagnosticCode::MultipleParents,
                    format!("node is listed {} times", list.len()),
                );
                for parent in list {
                    item = item.with_context(format!("listed by {}", parent));
                }
                diags.push(item);
            }
            Some(_) => {}
        }
    }
}

fn check_references(map: &NodeMap, diags: &mut Diagnostics) {
    for node in map.values() {
        let Some(target) = node.reference_target() else {
            continue;
        };
        if !is_definition_pointer(target.as_str()) || !map.has(target.as_str()) {
            diags.push(
                DiagnosticItem::new(
                    node.pointer.clone(),
                    DiagnosticCode::InvalidReference,
                    format!("reference target {} is not an existing definition", target),
                )
                .with_context(target.to_string()),
            );
        }
    }
}

fn check_positions(map: &NodeMap, diags: &mut Diagnostics) {
    for parent in map.values() {
        let mut ordinal = 0usize;
        for child in parent.children() {
            if is_definition_pointer(child.as_str()) {
                if !parent.is_root() {
                    diags.report(
                        child.clone(),
                        DiagnosticCode::PointerMismatch,
                        format!("definition is listed under {} instead of the root", parent.pointer),
                    );
                }
                continue;
            }

            let name = if parent.is_combination() {
                ordinal.to_string()
            } else {
                extract_name_from_pointer(child.as_str()).to_string()
            };
            ordinal += 1;

            match create_property_pointer(parent, &name) {
                Ok(expected) if expected == *child => {}
                Ok(expected) => diags.push(
                    DiagnosticItem::new(
                        child.clone(),
                        DiagnosticCode::PointerMismatch,
                        format!("expected pointer {}", expected),
                    )
                    .with_context(format!("parent {}", parent.pointer)),
                ),
                Err(_) => diags.report(
                    child.clone(),
                    DiagnosticCode::PointerMismatch,
                    format!("{} cannot hold children", parent.pointer),
                ),
            }
        }
    }
}

fn check_definition_graph(map: &NodeMap, diags: &mut Diagnostics) {
    let graph = DefinitionGraph::from_nodes(map);

    for cycle in graph.cycles() {
        let Some(first) = cycle.first() else {
            continue;
        };
        let chain: Vec<&str> = cycle.iter().map(|p| p.as_str()).collect();
        diags.push(
            DiagnosticItem::new(
                first.clone(),
                DiagnosticCode::DefinitionCycle,
                "definitions reference each other in a cycle",
            )
            .with_context(format!("cycle: {}", chain.join(" -> "))),
        );
    }

    for unused in graph.unused_definitions() {
        diags.report(
            unused,
            DiagnosticCode::UnusedDefinition,
            "definition is not referenced from the document",
        );
    }
}
