//! Schema Pointers
//!
//! A pointer is both the identity of a node and an encoding of its position
//! in the document: `#/properties/address/items/properties/street`.
//! All functions here are pure string manipulation.
//!
//! Names are escaped the JSON Pointer way (`~` as `~0`, `/` as `~1`) when
//! they become segments, so a pointer is also a valid `$ref` target.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::node::{NodeKind, UiSchemaNode};

/// Root sentinel every pointer starts with
pub const ROOT_POINTER: &str = "#";

/// Marker in front of unique pointers (pointers that traverse references)
pub const UNIQUE_POINTER_PREFIX: &str = "uniqueNodePointer";

/// Path segment for object members
pub const PROPERTIES: &str = "properties";

/// Path segment for the array indirection
pub const ITEMS: &str = "items";

/// Path segment for the definitions namespace
pub const DEFINITIONS: &str = "$defs";

// =============================================================================
// Pointer
// =============================================================================

/// Address of a node in the schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pointer(String);

impl Pointer {
    pub fn new(pointer: impl Into<String>) -> Self {
        Self(pointer.into())
    }

    /// The root pointer `#`
    pub fn root() -> Self {
        Self(ROOT_POINTER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_POINTER
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Pointer {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Pointer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Pointer {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Pointer {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for Pointer {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Pointer {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Segments
// =============================================================================

/// Encode a name as a single pointer segment
pub fn escape_segment(name: &str) -> Cow<'_, str> {
    if name.contains(['~', '/']) {
        Cow::Owned(name.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Decode a pointer segment back into the name it was built from
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Join already encoded segments under the root sentinel
pub fn make_pointer(segments: &[&str]) -> Pointer {
    let mut pointer = String::from(ROOT_POINTER);
    for segment in segments {
        pointer.push('/');
        pointer.push_str(segment);
    }
    Pointer(pointer)
}

/// `#/$defs/<name>`
pub fn create_definition_pointer(name: &str) -> Pointer {
    make_pointer(&[DEFINITIONS, &escape_segment(name)])
}

/// Build the pointer a child named `name` would get under `parent`.
///
/// Fails with [`SchemaError::InvalidParent`] for references and for fields
/// that cannot hold children.
pub fn create_property_pointer(parent: &UiSchemaNode, name: &str) -> Result<Pointer> {
    let category = match &parent.kind {
        NodeKind::Combination { combination_type, .. } => combination_type.as_str(),
        NodeKind::Field { .. } if parent.is_valid_parent() => PROPERTIES,
        _ => return Err(SchemaError::InvalidParent(parent.pointer.to_string())),
    };

    let base = parent.pointer.as_str();
    let name = escape_segment(name);
    let pointer = if parent.is_array {
        format!("{}/{}/{}/{}", base, ITEMS, category, name)
    } else {
        format!("{}/{}/{}", base, category, name)
    };
    Ok(Pointer(pointer))
}

// =============================================================================
// Accessors
// =============================================================================

/// Split into everything before the last `/` and the last segment, still
/// encoded.
///
/// A pointer without segments yields an empty base and itself as the name.
pub fn split_pointer_in_base_and_name(pointer: &str) -> (&str, &str) {
    match pointer.rfind('/') {
        Some(idx) => (&pointer[..idx], &pointer[idx + 1..]),
        None => ("", pointer),
    }
}

/// Name carried by the last segment of the pointer
pub fn extract_name_from_pointer(pointer: &str) -> Cow<'_, str> {
    unescape_segment(split_pointer_in_base_and_name(pointer).1)
}

/// Second-to-last segment (`properties`, `anyOf`, `$defs`, ...)
pub fn extract_category_from_pointer(pointer: &str) -> &str {
    let (base, _) = split_pointer_in_base_and_name(pointer);
    split_pointer_in_base_and_name(base).1
}

/// Replace the last segment; pointers without segments are returned unchanged
pub fn change_name_in_pointer(pointer: &str, new_name: &str) -> String {
    match pointer.rfind('/') {
        Some(idx) => format!("{}/{}", &pointer[..idx], escape_segment(new_name)),
        None => pointer.to_string(),
    }
}

/// Substitute `old_prefix` at the start of `pointer` with `new_prefix`
pub fn replace_start(pointer: &str, old_prefix: &str, new_prefix: &str) -> String {
    match pointer.strip_prefix(old_prefix) {
        Some(rest) => format!("{}{}", new_prefix, rest),
        None => pointer.to_string(),
    }
}

/// True for `#/$defs/<name>` exactly
pub fn is_definition_pointer(pointer: &str) -> bool {
    pointer
        .strip_prefix(ROOT_POINTER)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.strip_prefix(DEFINITIONS))
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|name| !name.is_empty() && !name.contains('/'))
        .unwrap_or(false)
}

/// True for a definition or anything nested inside one
pub fn is_under_definition(pointer: &str) -> bool {
    let prefix = format!("{}/{}/", ROOT_POINTER, DEFINITIONS);
    pointer.starts_with(&prefix)
}

/// True if `pointer` equals `ancestor` or lies in its subtree
pub fn is_same_or_descendant(pointer: &str, ancestor: &str) -> bool {
    pointer == ancestor
        || pointer
            .strip_prefix(ancestor)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
