//! Graph analysis over the node map
//!
//! Read-only passes: the circular reference check used to block edits, the
//! definition dependency graph (petgraph, SCCs for cycles) and the invariant
//! validator reporting [`Diagnostics`].

pub mod analysis;
pub mod circular;
pub mod diagnostics;
pub mod validate;

pub use analysis::DefinitionGraph;
pub use circular::CircularReferenceDetector;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use validate::validate_nodes;
