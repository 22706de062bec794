//! Node Map
//!
//! Pointer → node store. Keeps insertion order so snapshots are stable;
//! re-keying an entry keeps its position.

use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::node::UiSchemaNode;
use crate::pointer::Pointer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    nodes: HashMap<Pointer, UiSchemaNode>,
    order: Vec<Pointer>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a node list. A later node with an already seen pointer
    /// replaces the earlier one.
    pub fn from_nodes(nodes: impl IntoIterator<Item = UiSchemaNode>) -> Self {
        let mut map = Self::new();
        for node in nodes {
            map.set(node);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has(&self, pointer: &str) -> bool {
        self.nodes.contains_key(pointer)
    }

    pub fn get(&self, pointer: &str) -> Result<&UiSchemaNode> {
        self.nodes
            .get(pointer)
            .ok_or_else(|| SchemaError::NodeNotFound(pointer.to_string()))
    }

    pub fn get_mut(&mut self, pointer: &str) -> Result<&mut UiSchemaNode> {
        self.nodes
            .get_mut(pointer)
            .ok_or_else(|| SchemaError::NodeNotFound(pointer.to_string()))
    }

    /// Insert or replace the node stored under `node.pointer`
    pub fn set(&mut self, node: UiSchemaNode) {
        if !self.nodes.contains_key(node.pointer.as_str()) {
            self.order.push(node.pointer.clone());
        }
        self.nodes.insert(node.pointer.clone(), node);
    }

    pub fn delete(&mut self, pointer: &str) -> Option<UiSchemaNode> {
        let node = self.nodes.remove(pointer)?;
        self.order.retain(|p| p.as_str() != pointer);
        Some(node)
    }

    /// Move the entry at `old` to `new`, updating the node's own pointer
    pub fn rekey(&mut self, old: &str, new: Pointer) -> Result<()> {
        if old == new.as_str() {
            return Ok(());
        }
        if self.has(new.as_str()) {
            return Err(SchemaError::DuplicatePointer(new.into_string()));
        }
        let mut node = self
            .nodes
            .remove(old)
            .ok_or_else(|| SchemaError::NodeNotFound(old.to_string()))?;
        node.pointer = new.clone();
        if let Some(slot) = self.order.iter_mut().find(|p| p.as_str() == old) {
            *slot = new.clone();
        }
        self.nodes.insert(new, node);
        Ok(())
    }

    /// Nodes in map order
    pub fn values(&self) -> impl Iterator<Item = &UiSchemaNode> + '_ {
        self.order.iter().filter_map(move |p| self.nodes.get(p))
    }

    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> + '_ {
        self.order.iter()
    }

    /// Linear scan for the first node matching `predicate`
    pub fn find_first<P>(&self, predicate: P) -> Option<&UiSchemaNode>
    where
        P: Fn(&UiSchemaNode) -> bool,
    {
        self.values().find(|node| predicate(node))
    }

    /// The node whose children list contains `pointer`
    pub fn find_parent(&self, pointer: &str) -> Option<&UiSchemaNode> {
        self.find_first(|node| node.has_child(pointer))
    }

    /// All reference nodes pointing at `pointer`
    pub fn referring_nodes(&self, pointer: &str) -> Vec<&UiSchemaNode> {
        self.values()
            .filter(|node| {
                node.reference_target()
                    .map(|target| target.as_str() == pointer)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn to_vec(&self) -> Vec<UiSchemaNode> {
        self.values().cloned().collect()
    }
}
