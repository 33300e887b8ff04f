use crate::error::Result;
use crate::types::{
    GraphCounts, GraphNode, NodeKey, NodeKind, Properties, RelationshipType, TraversalRow,
};
use petgraph::Direction;
use std::ops::AddAssign;

/// One create-if-absent write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    MergeNode {
        key: NodeKey,
        properties: Properties,
    },
    MergeRelationship {
        from: NodeKey,
        relationship: RelationshipType,
        to: NodeKey,
    },
}

/// Unit of work applied atomically by [`GraphStore::apply`].
///
/// Either every operation takes effect or none does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTx {
    ops: Vec<WriteOp>,
}

impl WriteTx {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_node(&mut self, key: NodeKey, properties: Properties) -> &mut Self {
        self.ops.push(WriteOp::MergeNode { key, properties });
        self
    }

    pub fn merge_relationship(
        &mut self,
        from: NodeKey,
        relationship: RelationshipType,
        to: NodeKey,
    ) -> &mut Self {
        self.ops.push(WriteOp::MergeRelationship {
            from,
            relationship,
            to,
        });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// What a transaction actually created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub nodes_created: usize,
    pub relationships_created: usize,
}

impl WriteSummary {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.nodes_created == 0 && self.relationships_created == 0
    }
}

impl AddAssign for WriteSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes_created += rhs.nodes_created;
        self.relationships_created += rhs.relationships_created;
    }
}

/// Upsert/query protocol every graph backend implements
pub trait GraphStore: Send + Sync {
    /// Apply a transaction of merge operations atomically
    fn apply(&self, tx: WriteTx) -> Result<WriteSummary>;

    /// Delete every node and relationship
    fn delete_all(&self) -> Result<()>;

    fn node(&self, key: &NodeKey) -> Result<Option<GraphNode>>;

    fn nodes_of_kind(&self, kind: NodeKind) -> Result<Vec<GraphNode>>;

    /// Neighbours of `key` across `relationship` edges in `direction`
    fn neighbors(
        &self,
        key: &NodeKey,
        relationship: RelationshipType,
        direction: Direction,
    ) -> Result<Vec<GraphNode>>;

    /// Number of relationships touching the node, both directions
    fn degree(&self, key: &NodeKey) -> Result<usize>;

    /// Up to `limit` nodes of `kind`, highest degree first
    fn most_connected(&self, kind: NodeKind, limit: usize) -> Result<Vec<(GraphNode, usize)>>;

    fn counts(&self) -> Result<GraphCounts>;

    /// Diagnostic read of every relationship
    fn traverse(&self) -> Result<Vec<TraversalRow>>;
}
