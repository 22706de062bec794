//! Node list → wire schema

use serde_json::{Map, Value};

use super::keywords::*;
use crate::error::{Result, SchemaError};
use crate::node::{ItemsLevel, NodeKind, UiSchemaNode};
use crate::node_map::NodeMap;
use crate::pointer::{extract_name_from_pointer, is_definition_pointer, ROOT_POINTER};

/// Convert nodes back into a wire schema
pub fn serialize_from_nodes(nodes: &[UiSchemaNode]) -> Result<Value> {
    let map = NodeMap::from_nodes(nodes.iter().cloned());
    let root = map
        .get(ROOT_POINTER)
        .map_err(|_| SchemaError::invalid_schema(ROOT_POINTER, "missing root node"))?;
    let builder = Builder { map: &map };
    builder.build(root, 0).map(Value::Object)
}

struct Builder<'a> {
    map: &'a NodeMap,
}

impl Builder<'_> {
    fn build(&self, node: &UiSchemaNode, depth: usize) -> Result<Map<String, Value>> {
        if depth > self.map.len() {
            return Err(SchemaError::invalid_schema(
                node.pointer.as_str(),
                "children lists form a loop",
            ));
        }

        let mut content = Map::new();
        match &node.kind {
            NodeKind::Field { field_type, .. } => {
                if !node.implicit_type {
                    let name = Value::String(field_type.as_str().to_string());
                    let value = if node.is_nillable && !node.is_array {
                        Value::Array(vec![name, Value::String(NULL_TYPE.to_string())])
                    } else {
                        name
                    };
                    content.insert(TYPE.to_string(), value);
                }
                let (properties, required) = self.properties(node, depth)?;
                if !properties.is_empty() {
                    content.insert(PROPERTIES.to_string(), Value::Object(properties));
                }
                if !required.is_empty() {
                    content.insert(REQUIRED.to_string(), Value::Array(required));
                }
            }
            NodeKind::Combination { combination_type, .. } => {
                let mut items = Vec::new();
                for child in self.content_children(node)? {
                    items.push(Value::Object(self.build(child, depth + 1)?));
                }
                content.insert(combination_type.as_str().to_string(), Value::Array(items));
            }
            NodeKind::Reference { reference } => {
                content.insert(REF.to_string(), Value::String(reference.to_string()));
            }
        }

        if let Some(values) = &node.enum_values {
            content.insert(ENUM.to_string(), Value::Array(values.clone()));
        }

        let mut schema = if node.is_array {
            let mut outer = Map::new();
            let array = Value::String(ARRAY_TYPE.to_string());
            let array_type = if node.is_nillable {
                Value::Array(vec![array, Value::String(NULL_TYPE.to_string())])
            } else {
                array
            };
            outer.insert(TYPE.to_string(), array_type);
            for (key, value) in &node.restrictions {
                if is_array_restriction(key) {
                    outer.insert(key.clone(), value.clone());
                } else {
                    content.insert(key.clone(), value.clone());
                }
            }
            if let Some(level) = &node.items {
                write_items_level(&mut content, level);
            }
            outer.insert(ITEMS.to_string(), Value::Object(content));
            outer
        } else {
            for (key, value) in &node.restrictions {
                content.insert(key.clone(), value.clone());
            }
            content
        };

        if let Some(title) = &node.title {
            schema.insert(TITLE.to_string(), Value::String(title.clone()));
        }
        if let Some(description) = &node.description {
            schema.insert(DESCRIPTION.to_string(), Value::String(description.clone()));
        }
        if let Some(default) = &node.default {
            schema.insert(DEFAULT.to_string(), default.clone());
        }
        for (key, value) in &node.custom {
            schema.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if node.is_root() {
            let mut definitions = Map::new();
            for child in self.children(node)? {
                if child.is_definition() {
                    let name = extract_name_from_pointer(child.pointer.as_str()).to_string();
                    definitions.insert(name, Value::Object(self.build(child, depth + 1)?));
                }
            }
            if !definitions.is_empty() {
                schema.insert(DEFS.to_string(), Value::Object(definitions));
            }
        }
        Ok(schema)
    }

    fn properties(
        &self,
        node: &UiSchemaNode,
        depth: usize,
    ) -> Result<(Map<String, Value>, Vec<Value>)> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for child in self.content_children(node)? {
            let name = extract_name_from_pointer(child.pointer.as_str()).to_string();
            if child.is_required {
                required.push(Value::String(name.clone()));
            }
            properties.insert(name, Value::Object(self.build(child, depth + 1)?));
        }
        Ok((properties, required))
    }

    fn children(&self, node: &UiSchemaNode) -> Result<Vec<&UiSchemaNode>> {
        node.children()
            .iter()
            .map(|child| self.map.get(child.as_str()))
            .collect()
    }

    /// Children that are not definitions
    fn content_children(&self, node: &UiSchemaNode) -> Result<Vec<&UiSchemaNode>> {
        Ok(self
            .children(node)?
            .into_iter()
            .filter(|child| !is_definition_pointer(child.pointer.as_str()))
            .collect())
    }
}

/// Item data of an array goes next to the item content
fn write_items_level(content: &mut Map<String, Value>, level: &ItemsLevel) {
    if let Some(title) = &level.title {
        content.insert(TITLE.to_string(), Value::String(title.clone()));
    }
    if let Some(description) = &level.description {
        content.insert(DESCRIPTION.to_string(), Value::String(description.clone()));
    }
    if let Some(default) = &level.default {
        content.insert(DEFAULT.to_string(), default.clone());
    }
    for (key, value) in &level.custom {
        content.entry(key.clone()).or_insert_with(|| value.clone());
    }
    if level.is_nillable {
        if let Some(Value::String(name)) = content.get(TYPE).cloned() {
            let nillable = vec![Value::String(name), Value::String(NULL_TYPE.to_string())];
            content.insert(TYPE.to_string(), Value::Array(nillable));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serialize_nillable_array_of_objects() {
        let mut root = UiSchemaNode::field("#", FieldType::Object);
        root.children_mut().unwrap().push("#/properties/list".into());
        let mut list = UiSchemaNode::field("#/properties/list", FieldType::Object);
        list.is_array = true;
        list.is_nillable = true;
        list.is_required = true;
        list.restrictions.insert("minItems".into(), json!(1));
        list.children_mut()
            .unwrap()
            .push("#/properties/list/items/properties/id".into());
        let id = UiSchemaNode::field("#/properties/list/items/properties/id", FieldType::Integer);

        let schema = serialize_from_nodes(&[root, list, id]).unwrap();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "list": {
                        "type": ["array", "null"],
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": { "id": { "type": "integer" } }
                        }
                    }
                },
                "required": ["list"]
            })
        );
    }

    #[test]
    fn test_serialize_items_level() {
        let mut root = UiSchemaNode::field("#", FieldType::Object);
        root.children_mut().unwrap().push("#/properties/tags".into());
        let mut tags = UiSchemaNode::field("#/properties/tags", FieldType::String);
        tags.is_array = true;
        tags.title = Some("Tags".into());
        tags.items = Some(ItemsLevel {
            is_nillable: true,
            title: Some("Tag".into()),
            custom: [("x-order".to_string(), json!(2))].into_iter().collect(),
            ..ItemsLevel::default()
        });

        let schema = serialize_from_nodes(&[root, tags]).unwrap();
        assert_eq!(
            schema["properties"]["tags"],
            json!({
                "type": "array",
                "title": "Tags",
                "items": { "type": ["string", "null"], "title": "Tag", "x-order": 2 }
            })
        );
    }

    #[test]
    fn test_serialize_requires_root() {
        let nodes = [UiSchemaNode::field("#/properties/a", FieldType::String)];
        assert!(matches!(
            serialize_from_nodes(&nodes),
            Err(SchemaError::InvalidSchema { .. })
        ));
    }
}
