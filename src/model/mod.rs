//! Schema Model
//!
//! The stateful façade over a [`NodeMap`]. Queries live here, structural
//! edits in [`mutations`], and the unique-pointer addressing mode in
//! [`unique_pointer`].
//!
//! Mutations change the model in place. Take a [`SchemaModel::deep_clone`]
//! before a speculative edit and discard it if the edit fails:
//!
//! ```
//! use schema_model::{FieldType, NodePosition, SchemaModel, UiSchemaNode};
//!
//! let model = SchemaModel::from_array(vec![UiSchemaNode::field("#", FieldType::Object)]);
//! let mut draft = model.deep_clone();
//! draft.add_field(Some("name"), FieldType::String, NodePosition::default()).unwrap();
//! assert!(draft.has_node("#/properties/name"));
//! assert!(!model.has_node("#/properties/name"));
//! ```

pub mod mutations;
pub mod unique_pointer;

use std::borrow::Cow;

use crate::error::{Result, SchemaError};
use crate::graph::CircularReferenceDetector;
use crate::graph::{validate_nodes, Diagnostics};
use crate::node::{NodeKind, UiSchemaNode};
use crate::node_map::NodeMap;
use crate::pointer::{
    create_definition_pointer, create_property_pointer, extract_name_from_pointer,
    is_definition_pointer, is_under_definition, Pointer, ROOT_POINTER,
};

/// Pointer-addressed schema document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaModel {
    pub(crate) nodes: NodeMap,
}

impl SchemaModel {
    pub fn new(nodes: NodeMap) -> Self {
        Self { nodes }
    }

    /// The only constructor accepting external data
    pub fn from_array(nodes: Vec<UiSchemaNode>) -> Self {
        Self::new(NodeMap::from_nodes(nodes))
    }

    /// Snapshot of every node in map order
    pub fn as_array(&self) -> Vec<UiSchemaNode> {
        self.nodes.to_vec()
    }

    /// Independent copy for speculative edits
    pub fn deep_clone(&self) -> Self {
        Self::from_array(self.as_array())
    }

    pub fn node_map(&self) -> &NodeMap {
        &self.nodes
    }

    /// True when the model holds nothing but the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Check every structural invariant of the current node set
    pub fn validate(&self) -> Diagnostics {
        validate_nodes(&self.as_array())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn get_root_node(&self) -> Result<&UiSchemaNode> {
        let root = self.get_node(ROOT_POINTER)?;
        if root.is_reference() {
            return Err(SchemaError::InvalidRoot);
        }
        Ok(root)
    }

    pub fn get_node(&self, pointer: &str) -> Result<&UiSchemaNode> {
        self.nodes.get(pointer)
    }

    pub fn has_node(&self, pointer: &str) -> bool {
        self.nodes.has(pointer)
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.has_node(create_definition_pointer(name).as_str())
    }

    pub fn get_definition(&self, name: &str) -> Result<&UiSchemaNode> {
        self.get_node(create_definition_pointer(name).as_str())
    }

    /// Root children living in the definitions namespace
    pub fn get_definitions(&self) -> Result<Vec<&UiSchemaNode>> {
        Ok(self
            .get_root_children()?
            .into_iter()
            .filter(|node| node.is_definition())
            .collect())
    }

    /// Root children that are not definitions
    pub fn get_root_properties(&self) -> Result<Vec<&UiSchemaNode>> {
        Ok(self
            .get_root_children()?
            .into_iter()
            .filter(|node| !node.is_definition())
            .collect())
    }

    pub fn get_root_children(&self) -> Result<Vec<&UiSchemaNode>> {
        self.get_child_nodes(ROOT_POINTER)
    }

    /// Children of the node, looking through references
    pub fn get_child_nodes(&self, pointer: &str) -> Result<Vec<&UiSchemaNode>> {
        let node = self.get_final_node(pointer)?;
        node.children()
            .iter()
            .map(|child| self.get_node(child.as_str()))
            .collect()
    }

    /// The definition a reference node stands in for
    pub fn get_referred_node(&self, node: &UiSchemaNode) -> Result<&UiSchemaNode> {
        match node.reference_target() {
            Some(target) => self.get_node(target.as_str()),
            None => Err(SchemaError::NotAReference(node.pointer.to_string())),
        }
    }

    /// Follow references until a field or combination is reached
    pub fn get_final_node(&self, pointer: &str) -> Result<&UiSchemaNode> {
        let mut node = self.get_node(pointer)?;
        let mut hops = 0;
        while let Some(target) = node.reference_target() {
            hops += 1;
            if hops > self.nodes.len() {
                return Err(SchemaError::CircularReference {
                    child: target.to_string(),
                    parent: pointer.to_string(),
                });
            }
            node = self.get_node(target.as_str())?;
        }
        Ok(node)
    }

    /// The node whose children list contains `pointer`
    pub fn get_parent_node(&self, pointer: &str) -> Result<&UiSchemaNode> {
        self.nodes
            .find_parent(pointer)
            .ok_or_else(|| SchemaError::ParentNotFound(pointer.to_string()))
    }

    pub fn get_index_of_child_node(&self, pointer: &str) -> Result<usize> {
        let parent = self.get_parent_node(pointer)?;
        parent
            .children()
            .iter()
            .position(|child| child.as_str() == pointer)
            .ok_or_else(|| SchemaError::ParentNotFound(pointer.to_string()))
    }

    pub fn does_node_have_child_with_name(&self, pointer: &str, name: &str) -> Result<bool> {
        Ok(self
            .get_child_nodes(pointer)?
            .iter()
            .any(|child| extract_name_from_pointer(child.pointer.as_str()) == name))
    }

    pub fn get_referring_nodes(&self, pointer: &str) -> Vec<&UiSchemaNode> {
        self.nodes.referring_nodes(pointer)
    }

    pub fn has_referring_nodes(&self, pointer: &str) -> bool {
        !self.get_referring_nodes(pointer).is_empty()
    }

    /// A node under `$defs` is in use when something refers to it or when
    /// the definition node containing it is in use.
    pub fn is_definition_in_use(&self, pointer: &str) -> Result<bool> {
        self.get_node(pointer)?;
        if !is_under_definition(pointer) {
            return Ok(false);
        }
        Ok(self.has_referring_nodes(pointer) || self.are_definition_parents_in_use(pointer)?)
    }

    pub fn are_definition_parents_in_use(&self, pointer: &str) -> Result<bool> {
        match self.nodes.find_parent(pointer) {
            Some(parent) => self.is_definition_in_use(parent.pointer.as_str()),
            None => Ok(false),
        }
    }

    /// Pointer a child named `name` would get under the node at `pointer`
    pub fn create_child_pointer(&self, pointer: &str, name: &str) -> Result<Pointer> {
        create_property_pointer(self.get_node(pointer)?, name)
    }

    /// Definitions are siblings of the root properties in the children list
    /// but are never treated as combination items.
    pub fn is_child_of_combination(&self, pointer: &str) -> bool {
        if is_definition_pointer(pointer) {
            return false;
        }
        self.nodes
            .find_parent(pointer)
            .map(|parent| parent.is_combination())
            .unwrap_or(false)
    }

    /// Would grafting `child` under `parent` close a definition cycle?
    pub fn will_result_in_circular_references(&self, child: &str, parent: &str) -> bool {
        CircularReferenceDetector::new(&self.nodes).would_create_cycle(child, parent)
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// `prefix` followed by the smallest number no child of `pointer` uses
    pub fn generate_unique_child_name(&self, pointer: &str, prefix: &str) -> Result<String> {
        let node = self.get_node(pointer)?;
        let names: Vec<Cow<'_, str>> = node
            .children()
            .iter()
            .map(|child| extract_name_from_pointer(child.as_str()))
            .collect();
        Ok(generate_unique_string_with_number(&names, prefix))
    }

    /// `prefix` followed by the smallest number no definition uses
    pub fn generate_unique_definition_name(&self, prefix: &str) -> Result<String> {
        let names: Vec<Cow<'_, str>> = self
            .get_definitions()?
            .into_iter()
            .map(|node| extract_name_from_pointer(node.pointer.as_str()))
            .collect();
        Ok(generate_unique_string_with_number(&names, prefix))
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Children of a combination that are named by position
    pub(crate) fn combination_items(node: &UiSchemaNode) -> Vec<Pointer> {
        match &node.kind {
            NodeKind::Combination { children, .. } => children
                .iter()
                .filter(|child| !is_definition_pointer(child.as_str()))
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn generate_unique_string_with_number<S: AsRef<str>>(existing: &[S], prefix: &str) -> String {
    let mut n = 0usize;
    loop {
        let candidate = format!("{}{}", prefix, n);
        if !existing.iter().any(|name| name.as_ref() == candidate) {
            return candidate;
        }
        n += 1;
    }
}
