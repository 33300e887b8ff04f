use crate::types::{NodeKey, RelationshipType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid node key: {0}")]
    InvalidKey(String),

    #[error("Relationship {relationship} cannot connect {from} to {to}")]
    InvalidRelationship {
        from: NodeKey,
        relationship: RelationshipType,
        to: NodeKey,
    },

    #[error("Relationship endpoint does not exist: {0}")]
    MissingEndpoint(NodeKey),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}

impl GraphError {
    /// Whether the error means the store itself can no longer be used.
    ///
    /// Everything else is scoped to the write that produced it.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Io(_) | Self::Json(_) | Self::SnapshotVersion { .. }
        )
    }
}
