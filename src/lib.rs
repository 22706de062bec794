//! Schema Model
//!
//! A pointer-addressed, in-memory model of a JSON Schema document, built for
//! visual schema editors.
//!
//! ## Features
//!
//! - **Flat Node Map**: Every schema fragment is a node keyed by its JSON pointer
//! - **Typed Mutations**: Add, move, rename, delete and promote nodes with all
//!   pointers kept consistent
//! - **Cycle Protection**: Edits that would make a definition contain itself
//!   are rejected before anything changes
//! - **Unique Pointers**: Stable addresses for nodes reached through references
//! - **Wire Conversion**: Lossless round trips for the supported JSON Schema vocabulary
//!
//! ## Layout
//!
//! ```text
//! #                                  root object
//! ├── #/properties/name              field
//! ├── #/properties/pet               combination (anyOf)
//! │   ├── #/properties/pet/anyOf/0   reference → #/$defs/Cat
//! │   └── #/properties/pet/anyOf/1   field
//! └── #/$defs/Cat                    definition
//!     └── #/$defs/Cat/properties/age
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod node;
pub mod node_map;
pub mod pointer;
pub mod wire;

pub use config::ModelConfig;
pub use error::{ErrorCategory, Result, SchemaError};
pub use graph::{CircularReferenceDetector, DefinitionGraph, Diagnostics};
pub use model::SchemaModel;
pub use node::{
    CombinationKind, FieldType, ItemsLevel, NodeKind, NodePosition, ObjectKind, UiSchemaNode,
};
pub use node_map::NodeMap;
pub use pointer::Pointer;
pub use wire::{parse_to_nodes, serialize_from_nodes};
