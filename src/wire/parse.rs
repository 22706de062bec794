//! Wire schema → node list
//!
//! Walks the schema depth first, emitting each node before its descendants.
//! Keywords are taken out of a working copy of each schema object as they
//! are interpreted; whatever is left over becomes the node's `custom` bag.

use serde_json::{Map, Value};

use super::keywords::*;
use crate::error::{Result, SchemaError};
use crate::node::{CombinationKind, FieldType, ItemsLevel, NodeKind, UiSchemaNode};
use crate::pointer::{
    create_definition_pointer, create_property_pointer, is_definition_pointer, Pointer,
    ROOT_POINTER,
};

/// Convert a wire schema into nodes, root first
pub fn parse_to_nodes(schema: &Value) -> Result<Vec<UiSchemaNode>> {
    let object = as_schema_object(schema, ROOT_POINTER)?;
    let mut parser = Parser { out: Vec::new() };
    parser.parse(Pointer::root(), object.clone(), Position::Root)?;
    Ok(parser.out)
}

#[derive(Clone, Copy, PartialEq)]
enum Position {
    Root,
    Definition,
    Property { required: bool },
    CombinationItem,
}

struct Parser {
    out: Vec<UiSchemaNode>,
}

impl Parser {
    fn parse(&mut self, pointer: Pointer, mut schema: Map<String, Value>, position: Position) -> Result<()> {
        let mut outer = Map::new();
        let mut items_level = ItemsLevel::default();
        let is_array = is_array_type(schema.get(TYPE));

        // Split an array schema into its array level (`outer`) and its items.
        if is_array.is_some() {
            let mut items = match schema.remove(ITEMS) {
                Some(Value::Object(items)) => items,
                _ => {
                    return Err(SchemaError::invalid_schema(
                        pointer.as_str(),
                        "arrays must have an object schema as items",
                    ))
                }
            };
            if is_array_type(items.get(TYPE)).is_some() {
                return Err(SchemaError::invalid_schema(
                    pointer.as_str(),
                    "nested arrays are not supported",
                ));
            }
            if let Some(field_type) = items.get(TYPE).and_then(nillable_type) {
                items.insert(TYPE.to_string(), Value::String(field_type.as_str().to_string()));
                items_level.is_nillable = true;
            }
            items_level.title = take_string(&mut items, TITLE);
            items_level.description = take_string(&mut items, DESCRIPTION);
            items_level.default = items.remove(DEFAULT);

            schema.remove(TYPE);
            outer = std::mem::replace(&mut schema, items);
            if position == Position::Root {
                if let Some(definitions) = outer.remove(DEFS) {
                    schema.insert(DEFS.to_string(), definitions);
                }
            }
        }

        let mut node = self.node_kind(&pointer, &mut schema, position)?;
        node.is_array = is_array.is_some();
        if is_array == Some(true) {
            node.is_nillable = true;
        }
        node.is_required = matches!(position, Position::Property { required: true });
        node.is_combination_item = position == Position::CombinationItem;

        let source = if node.is_array { &mut outer } else { &mut schema };
        node.title = take_string(source, TITLE);
        node.description = take_string(source, DESCRIPTION);
        node.default = source.remove(DEFAULT);
        node.enum_values = match schema.remove(ENUM) {
            Some(Value::Array(values)) => Some(values),
            Some(other) => {
                schema.insert(ENUM.to_string(), other);
                None
            }
            None => None,
        };

        for keyword in VALUE_RESTRICTIONS {
            if let Some(value) = schema.remove(*keyword) {
                node.restrictions.insert((*keyword).to_string(), value);
            }
        }
        for (key, value) in outer {
            if is_array_restriction(&key) {
                node.restrictions.insert(key, value);
            } else {
                node.custom.insert(key, value);
            }
        }

        let children = self.take_children(&node, &mut schema)?;
        let definitions = if position == Position::Root {
            match schema.remove(DEFS) {
                Some(Value::Object(definitions)) => Some(definitions),
                Some(other) => {
                    schema.insert(DEFS.to_string(), other);
                    None
                }
                None => None,
            }
        } else {
            None
        };

        if node.is_array {
            items_level.custom.extend(schema);
            node.items = Some(items_level).filter(|level| !level.is_empty());
        } else {
            node.custom.extend(schema);
        }
        let index = self.out.len();
        self.out.push(node);

        let mut child_pointers = Vec::new();
        for (child_pointer, child_schema, child_position) in children {
            child_pointers.push(child_pointer.clone());
            self.parse(child_pointer, child_schema, child_position)?;
        }
        for (name, definition) in definitions.into_iter().flatten() {
            let definition_pointer = create_definition_pointer(&name);
            let object = as_schema_object(&definition, definition_pointer.as_str())?;
            child_pointers.push(definition_pointer.clone());
            self.parse(definition_pointer, object.clone(), Position::Definition)?;
        }

        if let Some(list) = self.out[index].children_mut() {
            *list = child_pointers;
        }
        Ok(())
    }

    /// Decide the node variant and consume the keywords that decide it
    fn node_kind(
        &self,
        pointer: &Pointer,
        schema: &mut Map<String, Value>,
        position: Position,
    ) -> Result<UiSchemaNode> {
        if position != Position::Root {
            if let Some(Value::String(target)) = schema.get(REF) {
                if is_definition_pointer(target) {
                    let target = Pointer::from(target.as_str());
                    schema.remove(REF);
                    return Ok(UiSchemaNode::reference(pointer.clone(), target));
                }
            }
        }

        for kind in CombinationKind::ALL {
            if matches!(schema.get(kind.as_str()), Some(Value::Array(_))) {
                return Ok(UiSchemaNode::combination(pointer.clone(), kind));
            }
        }

        let mut node = match schema.get(TYPE) {
            None => {
                let mut node = UiSchemaNode::field(pointer.clone(), FieldType::Object);
                node.implicit_type = true;
                return Ok(node);
            }
            Some(Value::String(name)) => match FieldType::parse(name) {
                Some(field_type) => UiSchemaNode::field(pointer.clone(), field_type),
                None => {
                    return Err(SchemaError::invalid_schema(
                        pointer.as_str(),
                        format!("unknown type '{}'", name),
                    ))
                }
            },
            Some(other) => match nillable_type(other) {
                Some(field_type) => {
                    let mut node = UiSchemaNode::field(pointer.clone(), field_type);
                    node.is_nillable = true;
                    node
                }
                None => {
                    // Multi-type schemas are carried through untouched.
                    let mut node = UiSchemaNode::field(pointer.clone(), FieldType::Object);
                    node.implicit_type = true;
                    return Ok(node);
                }
            },
        };
        schema.remove(TYPE);
        node.implicit_type = false;
        Ok(node)
    }

    /// Child schemas in document order, with their pointers
    fn take_children(
        &self,
        node: &UiSchemaNode,
        schema: &mut Map<String, Value>,
    ) -> Result<Vec<(Pointer, Map<String, Value>, Position)>> {
        let mut children = Vec::new();
        match &node.kind {
            NodeKind::Combination { combination_type, .. } => {
                let Some(Value::Array(items)) = schema.remove(combination_type.as_str()) else {
                    return Ok(children);
                };
                for (index, item) in items.iter().enumerate() {
                    let child_pointer = create_property_pointer(node, &index.to_string())?;
                    let object = as_schema_object(item, child_pointer.as_str())?;
                    children.push((child_pointer, object.clone(), Position::CombinationItem));
                }
            }
            NodeKind::Field { field_type: FieldType::Object, .. } => {
                let properties = match schema.remove(PROPERTIES) {
                    Some(Value::Object(properties)) => properties,
                    Some(other) => {
                        schema.insert(PROPERTIES.to_string(), other);
                        return Ok(children);
                    }
                    None => Map::new(),
                };
                let required = take_required(schema);
                for (name, property) in properties {
                    let child_pointer = create_property_pointer(node, &name)?;
                    let object = as_schema_object(&property, child_pointer.as_str())?;
                    let is_required = required.contains(&name);
                    children.push((child_pointer, object.clone(), Position::Property { required: is_required }));
                }
            }
            _ => {}
        }
        Ok(children)
    }
}

/// `Some(nillable)` when `type` names an array
fn is_array_type(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::String(name) if name == ARRAY_TYPE => Some(false),
        Value::Array(types) if types.len() == 2 => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            if names.contains(&ARRAY_TYPE) && names.contains(&NULL_TYPE) {
                Some(true)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `[type, "null"]` or `["null", type]` for a single non-array type
fn nillable_type(value: &Value) -> Option<FieldType> {
    let types = value.as_array()?;
    if types.len() != 2 {
        return None;
    }
    let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
    match names.as_slice() {
        [NULL_TYPE, other] | [other, NULL_TYPE] if *other != NULL_TYPE => FieldType::parse(other),
        _ => None,
    }
}

fn take_string(schema: &mut Map<String, Value>, keyword: &str) -> Option<String> {
    match schema.remove(keyword) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            schema.insert(keyword.to_string(), other);
            None
        }
        None => None,
    }
}

/// Names listed in `required`; names without a property are dropped
fn take_required(schema: &mut Map<String, Value>) -> Vec<String> {
    match schema.remove(REQUIRED) {
        Some(Value::Array(names)) => names
            .into_iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        Some(other) => {
            schema.insert(REQUIRED.to_string(), other);
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn as_schema_object<'a>(value: &'a Value, pointer: &str) -> Result<&'a Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        Value::Bool(_) => Err(SchemaError::invalid_schema(pointer, "boolean schemas are not supported")),
        _ => Err(SchemaError::invalid_schema(pointer, "schema must be an object")),
    }
}
