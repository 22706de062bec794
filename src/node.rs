//! Schema node types
//!
//! A node is one flattened JSON Schema fragment. Structure is expressed only
//! through pointers: containers list their children by pointer, references
//! name the definition they stand in for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pointer::{is_definition_pointer, Pointer, ROOT_POINTER};

/// Scalar or container type of a field node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Null,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Null => "null",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "integer" => Some(FieldType::Integer),
            "boolean" => Some(FieldType::Boolean),
            "object" => Some(FieldType::Object),
            "null" => Some(FieldType::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown field type: {}", s))
    }
}

/// Composition keyword of a combination node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CombinationKind {
    #[serde(rename = "allOf")]
    AllOf,
    #[default]
    #[serde(rename = "anyOf")]
    AnyOf,
    #[serde(rename = "oneOf")]
    OneOf,
}

impl CombinationKind {
    pub const ALL: [CombinationKind; 3] = [
        CombinationKind::AllOf,
        CombinationKind::AnyOf,
        CombinationKind::OneOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationKind::AllOf => "allOf",
            CombinationKind::AnyOf => "anyOf",
            CombinationKind::OneOf => "oneOf",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for CombinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CombinationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown combination kind: {}", s))
    }
}

/// Discriminant of [`NodeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Field,
    Combination,
    Reference,
}

/// Variant-specific part of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "objectKind", rename_all = "lowercase")]
pub enum NodeKind {
    Field {
        #[serde(rename = "fieldType")]
        field_type: FieldType,
        #[serde(default)]
        children: Vec<Pointer>,
    },
    Combination {
        #[serde(rename = "combinationType")]
        combination_type: CombinationKind,
        #[serde(default)]
        children: Vec<Pointer>,
    },
    Reference {
        reference: Pointer,
    },
}

/// One node of the flattened schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSchemaNode {
    /// Identity and structural address
    pub pointer: Pointer,

    #[serde(flatten)]
    pub kind: NodeKind,

    #[serde(default)]
    pub is_array: bool,

    #[serde(default)]
    pub is_nillable: bool,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub is_combination_item: bool,

    /// The wire schema had no `type` keyword for this node
    #[serde(default)]
    pub implicit_type: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Validation keywords (`minLength`, `maximum`, ...)
    #[serde(default)]
    pub restrictions: Map<String, Value>,

    /// Keywords the model does not interpret, carried through losslessly
    #[serde(default)]
    pub custom: Map<String, Value>,

    /// What an array writes inside `items` next to its content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsLevel>,
}

/// Data an array node keeps on its `items` level.
///
/// The node's own `title`, `description`, `default`, `is_nillable` and
/// `custom` describe the array level; these describe a single item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsLevel {
    /// Items are `[type, "null"]`
    #[serde(default)]
    pub is_nillable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

impl ItemsLevel {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl UiSchemaNode {
    fn with_kind(pointer: impl Into<Pointer>, kind: NodeKind) -> Self {
        Self {
            pointer: pointer.into(),
            kind,
            is_array: false,
            is_nillable: false,
            is_required: false,
            is_combination_item: false,
            implicit_type: false,
            title: None,
            description: None,
            enum_values: None,
            default: None,
            restrictions: Map::new(),
            custom: Map::new(),
            items: None,
        }
    }

    /// New field node without children
    pub fn field(pointer: impl Into<Pointer>, field_type: FieldType) -> Self {
        Self::with_kind(
            pointer,
            NodeKind::Field {
                field_type,
                children: Vec::new(),
            },
        )
    }

    /// New combination node without children
    pub fn combination(pointer: impl Into<Pointer>, combination_type: CombinationKind) -> Self {
        Self::with_kind(
            pointer,
            NodeKind::Combination {
                combination_type,
                children: Vec::new(),
            },
        )
    }

    /// New reference node
    pub fn reference(pointer: impl Into<Pointer>, reference: impl Into<Pointer>) -> Self {
        Self::with_kind(
            pointer,
            NodeKind::Reference {
                reference: reference.into(),
            },
        )
    }

    pub fn object_kind(&self) -> ObjectKind {
        match self.kind {
            NodeKind::Field { .. } => ObjectKind::Field,
            NodeKind::Combination { .. } => ObjectKind::Combination,
            NodeKind::Reference { .. } => ObjectKind::Reference,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, NodeKind::Field { .. })
    }

    pub fn is_combination(&self) -> bool {
        matches!(self.kind, NodeKind::Combination { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, NodeKind::Reference { .. })
    }

    pub fn is_root(&self) -> bool {
        self.pointer.as_str() == ROOT_POINTER
    }

    /// Direct child of the root under `$defs`
    pub fn is_definition(&self) -> bool {
        is_definition_pointer(self.pointer.as_str())
    }

    /// Object fields and combinations may hold children
    pub fn is_valid_parent(&self) -> bool {
        match &self.kind {
            NodeKind::Field { field_type, .. } => *field_type == FieldType::Object,
            NodeKind::Combination { .. } => true,
            NodeKind::Reference { .. } => false,
        }
    }

    pub fn field_type(&self) -> Option<FieldType> {
        match &self.kind {
            NodeKind::Field { field_type, .. } => Some(*field_type),
            _ => None,
        }
    }

    pub fn combination_type(&self) -> Option<CombinationKind> {
        match &self.kind {
            NodeKind::Combination { combination_type, .. } => Some(*combination_type),
            _ => None,
        }
    }

    /// Target of a reference node
    pub fn reference_target(&self) -> Option<&Pointer> {
        match &self.kind {
            NodeKind::Reference { reference } => Some(reference),
            _ => None,
        }
    }

    /// Child pointers; always empty for references
    pub fn children(&self) -> &[Pointer] {
        match &self.kind {
            NodeKind::Field { children, .. } | NodeKind::Combination { children, .. } => children,
            NodeKind::Reference { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Pointer>> {
        match &mut self.kind {
            NodeKind::Field { children, .. } | NodeKind::Combination { children, .. } => {
                Some(children)
            }
            NodeKind::Reference { .. } => None,
        }
    }

    pub fn has_child(&self, pointer: &str) -> bool {
        self.children().iter().any(|child| child.as_str() == pointer)
    }
}

/// Where to place a node: a parent and an index in its children.
///
/// A negative index (or one past the end) appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub parent_pointer: Pointer,
    pub index: isize,
}

impl NodePosition {
    pub fn new(parent_pointer: impl Into<Pointer>, index: isize) -> Self {
        Self {
            parent_pointer: parent_pointer.into(),
            index,
        }
    }

    /// Append to the children of `parent_pointer`
    pub fn append(parent_pointer: impl Into<Pointer>) -> Self {
        Self::new(parent_pointer, -1)
    }

    /// Resolve the index against a children list of length `len`
    pub(crate) fn insertion_index(&self, len: usize) -> usize {
        if self.index < 0 || self.index as usize > len {
            len
        } else {
            self.index as usize
        }
    }
}

impl Default for NodePosition {
    fn default() -> Self {
        Self::append(Pointer::root())
    }
}
