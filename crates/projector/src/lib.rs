//! # archgraph projector
//!
//! Turns the property graph back into a nested, per-class JSON document.
//!
//! ```text
//! GraphStore ──> most_connected / nodes_of_kind ──> classes
//!                    │
//!                    └─ per class: EXTENDS, IMPLEMENTS, HAS_METHOD (CALLS, CONTAINS),
//!                       HAS_FIELD, IMPORTS ──> SystemStructure ──> JSON
//! ```

mod error;
mod projection;

pub use error::{ProjectorError, Result};
pub use projection::{
    ClassStructure, ControlFlowStructure, FieldStructure, GraphProjector, MethodStructure,
    ProjectionMode, SystemStructure,
};
