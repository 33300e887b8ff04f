//! # archgraph graph
//!
//! Keyed property graph of classes, methods, calls and control flow, plus the
//! store protocol the ingestor writes through and the projector reads from.
//!
//! ## Architecture
//!
//! ```text
//! WriteTx (merge ops)
//!     │
//!     ├──> GraphStore::apply (validated, one write lock)
//!     │      ├─ MergeNode: create if absent, attributes set once
//!     │      └─ MergeRelationship: create if absent between existing nodes
//!     │
//!     ├──> PropertyGraph (petgraph DiGraph + key index)
//!     │      ├─ Nodes: Class, Method, MethodCall, ControlFlow, ...
//!     │      └─ Edges: HAS_METHOD, CALLS, CONTAINS, EXTENDS, ...
//!     │
//!     └──> Snapshot (optional JSON file, atomic rename on persist)
//! ```

mod error;
mod graph;
mod memory;
mod store;
mod types;

pub use error::{GraphError, Result};
pub use memory::{MemoryGraphStore, SNAPSHOT_VERSION};
pub use petgraph::Direction;
pub use store::{GraphStore, WriteOp, WriteSummary, WriteTx};
pub use types::{
    GraphCounts, GraphEdge, GraphNode, NodeKey, NodeKind, Properties, PropertyGraph,
    RelationshipType, TraversalRow, KEY_SEPARATOR,
};
