//! Unique pointers
//!
//! The editor shows the children of a definition under every reference to
//! it. Such a node has one schema pointer but many positions on screen, so
//! the editor addresses it by the path it was reached through instead:
//! `uniqueNodePointer#/properties/ref/properties/child` where `ref` is a
//! reference to a definition that holds `child`.

use super::SchemaModel;
use crate::error::{Result, SchemaError};
use crate::node::UiSchemaNode;
use crate::pointer::{
    create_property_pointer, extract_category_from_pointer, extract_name_from_pointer,
    is_under_definition, split_pointer_in_base_and_name, Pointer, ITEMS, UNIQUE_POINTER_PREFIX,
};

impl SchemaModel {
    /// Unique pointer of the node at `schema_pointer` as seen below
    /// `unique_parent`. Nodes outside the definitions namespace are only
    /// ever shown in one place and keep their own path.
    pub fn get_unique_pointer(schema_pointer: &str, unique_parent: Option<&str>) -> String {
        match unique_parent {
            Some(parent) if is_under_definition(schema_pointer) => format!(
                "{}{}/{}/{}",
                UNIQUE_POINTER_PREFIX,
                remove_unique_pointer_prefix(parent),
                extract_category_from_pointer(schema_pointer),
                split_pointer_in_base_and_name(schema_pointer).1
            ),
            _ => format!("{}{}", UNIQUE_POINTER_PREFIX, schema_pointer),
        }
    }

    /// Drop the last name, its category and an `items` segment in front of it
    pub fn get_parent_unique_pointer(unique_pointer: &str) -> String {
        let mut parts: Vec<&str> = unique_pointer.split('/').collect();
        parts.pop();
        parts.pop();
        if parts.last() == Some(&ITEMS) {
            parts.pop();
        }
        parts.join("/")
    }

    pub fn get_node_by_unique_pointer(&self, unique_pointer: &str) -> Result<&UiSchemaNode> {
        let pointer = self.get_schema_pointer_by_unique_pointer(unique_pointer)?;
        self.get_node(pointer.as_str())
    }

    /// Resolve a unique pointer to the schema pointer of the node it shows
    pub fn get_schema_pointer_by_unique_pointer(&self, unique_pointer: &str) -> Result<Pointer> {
        let pointer = remove_unique_pointer_prefix(unique_pointer);
        if self.has_node(pointer) {
            return Ok(Pointer::from(pointer));
        }
        if !pointer.contains('/') {
            return Err(SchemaError::NodeNotFound(pointer.to_string()));
        }

        let parent_unique = Self::get_parent_unique_pointer(pointer);
        let parent_pointer = self.get_schema_pointer_by_unique_pointer(&parent_unique)?;
        let parent = self.get_final_node(parent_pointer.as_str())?;
        let resolved = create_property_pointer(parent, &extract_name_from_pointer(pointer))?;
        if !self.has_node(resolved.as_str()) {
            return Err(SchemaError::NodeNotFound(unique_pointer.to_string()));
        }
        Ok(resolved)
    }
}

fn remove_unique_pointer_prefix(unique_pointer: &str) -> &str {
    unique_pointer
        .strip_prefix(UNIQUE_POINTER_PREFIX)
        .unwrap_or(unique_pointer)
}
