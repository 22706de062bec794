//! JSON Schema keyword vocabulary understood by the converter

pub const TYPE: &str = "type";
pub const PROPERTIES: &str = "properties";
pub const REQUIRED: &str = "required";
pub const ITEMS: &str = "items";
pub const REF: &str = "$ref";
pub const DEFS: &str = "$defs";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const DEFAULT: &str = "default";
pub const ENUM: &str = "enum";

pub const ARRAY_TYPE: &str = "array";
pub const NULL_TYPE: &str = "null";

/// Restrictions that live on the array level of an array schema
pub const ARRAY_RESTRICTIONS: &[&str] = &["minItems", "maxItems", "uniqueItems"];

/// Restrictions that live on the value level
pub const VALUE_RESTRICTIONS: &[&str] = &[
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minProperties",
    "maxProperties",
];

pub fn is_array_restriction(keyword: &str) -> bool {
    ARRAY_RESTRICTIONS.contains(&keyword)
}
