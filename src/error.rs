//! Error types for the schema model

use thiserror::Error;

/// Result type for schema model operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema model errors
///
/// Every mutation validates its preconditions before touching the node map,
/// so an error returned from an add/delete/convert operation leaves the model
/// exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Node with pointer {0} not found")]
    NodeNotFound(String),

    #[error("Node with pointer {0} has no parent")]
    ParentNotFound(String),

    #[error("{0} is not a reference")]
    NotAReference(String),

    #[error("Invalid parent node: {0}")]
    InvalidParent(String),

    #[error("Node with pointer {0} already exists")]
    DuplicatePointer(String),

    #[error("There is no definition named {0}")]
    UnknownDefinition(String),

    #[error("{0} is not a combination")]
    NotACombination(String),

    #[error("It is not possible to delete the root node")]
    CannotDeleteRoot,

    #[error("Operation '{0}' is not allowed on the root node")]
    RootNotAllowed(&'static str),

    #[error("Cannot delete {0} because it is a definition in use")]
    DefinitionInUse(String),

    #[error("{0} is already a reference")]
    AlreadyAReference(String),

    #[error("{0} is already a definition")]
    AlreadyADefinition(String),

    #[error("Name is required when adding a node to an object")]
    NameRequired,

    #[error("'{0}' cannot be used as a name")]
    InvalidName(String),

    #[error("Placing {child} under {parent} would result in a circular reference")]
    CircularReference { child: String, parent: String },

    #[error("Invalid update of {pointer}: {reason}")]
    InvalidUpdate { pointer: String, reason: String },

    #[error("Root node is neither a field nor a combination")]
    InvalidRoot,

    #[error("Invalid schema at {pointer}: {reason}")]
    InvalidSchema { pointer: String, reason: String },
}

/// Coarse classification of [`SchemaError`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Unknown pointer passed to an accessor
    Lookup,
    /// Structural precondition of a mutation not met
    Precondition,
    /// Converting a node into the kind it already is
    AlreadyThisKind,
    /// Wire schema could not be translated to or from nodes
    Conversion,
}

impl SchemaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NodeNotFound(_) | Self::ParentNotFound(_) | Self::NotAReference(_) => {
                ErrorCategory::Lookup
            }

            Self::InvalidParent(_)
            | Self::DuplicatePointer(_)
            | Self::UnknownDefinition(_)
            | Self::NotACombination(_)
            | Self::CannotDeleteRoot
            | Self::RootNotAllowed(_)
            | Self::DefinitionInUse(_)
            | Self::NameRequired
            | Self::InvalidName(_)
            | Self::CircularReference { .. }
            | Self::InvalidUpdate { .. }
            | Self::InvalidRoot => ErrorCategory::Precondition,

            Self::AlreadyAReference(_) | Self::AlreadyADefinition(_) => {
                ErrorCategory::AlreadyThisKind
            }

            Self::InvalidSchema { .. } => ErrorCategory::Conversion,
        }
    }

    pub(crate) fn invalid_update(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_schema(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }
}
