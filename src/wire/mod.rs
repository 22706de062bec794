//! Conversion between wire JSON Schema documents and node lists
//!
//! `serialize_from_nodes(parse_to_nodes(x)) == x` holds for schemas built
//! from the supported vocabulary: `type` (one type, or one type plus
//! `"null"`), `properties`, `required`, array `items`, local `$ref`s into
//! `$defs`, `allOf`/`anyOf`/`oneOf`, `title`, `description`, `default`,
//! `enum` and the restriction keywords in [`keywords`]. Any other keyword is
//! kept in the node's `custom` bag (or, inside an array's `items`, in the
//! node's [`ItemsLevel`](crate::node::ItemsLevel)) and written back where it
//! was found.

pub mod build;
pub mod keywords;
pub mod parse;

pub use build::serialize_from_nodes;
pub use parse::parse_to_nodes;

use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::model::SchemaModel;
use crate::pointer::ROOT_POINTER;

impl SchemaModel {
    pub fn from_wire(schema: &Value) -> Result<Self> {
        Ok(Self::from_array(parse_to_nodes(schema)?))
    }

    pub fn to_wire(&self) -> Result<Value> {
        serialize_from_nodes(&self.as_array())
    }
}

/// Compile `schema` as a JSON Schema document, reporting the first problem
pub fn check_json_schema(schema: &Value) -> Result<()> {
    jsonschema::JSONSchema::compile(schema)
        .map(|_| ())
        .map_err(|e| SchemaError::invalid_schema(ROOT_POINTER, e.to_string()))
}
