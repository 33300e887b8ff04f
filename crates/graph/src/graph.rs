use crate::types::{
    GraphCounts, GraphEdge, GraphNode, NodeKey, NodeKind, Properties, PropertyGraph,
    RelationshipType, TraversalRow,
};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

impl PropertyGraph {
    /// Return the node for `key`, creating it with `properties` if absent.
    ///
    /// The boolean is `true` when the node was created. Properties of an
    /// existing node are left untouched.
    pub fn merge_node(&mut self, key: NodeKey, properties: Properties) -> (NodeIndex, bool) {
        if let Some(idx) = self.find_node(&key) {
            return (idx, false);
        }
        let idx = self.graph.add_node(GraphNode::new(key.clone(), properties));
        self.index.insert(key, idx);
        (idx, true)
    }

    /// Add `from -[relationship]-> to` unless that exact edge already exists.
    pub fn merge_edge(
        &mut self,
        from: NodeIndex,
        relationship: RelationshipType,
        to: NodeIndex,
    ) -> bool {
        if self.has_edge(from, relationship, to) {
            return false;
        }
        self.graph.add_edge(from, to, GraphEdge { relationship });
        true
    }

    #[must_use]
    pub fn has_edge(&self, from: NodeIndex, relationship: RelationshipType, to: NodeIndex) -> bool {
        self.graph
            .edges(from)
            .any(|e| e.target() == to && e.weight().relationship == relationship)
    }

    /// All nodes carrying the given label
    #[must_use]
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].key.kind == kind)
            .collect()
    }

    /// Neighbours across edges of one relationship type
    #[must_use]
    pub fn neighbors(
        &self,
        node: NodeIndex,
        relationship: RelationshipType,
        direction: Direction,
    ) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(node, direction)
            .filter(|e| e.weight().relationship == relationship)
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .collect()
    }

    /// Get coupling score for a node (total edges in + out)
    #[must_use]
    pub fn coupling_score(&self, node: NodeIndex) -> usize {
        let outgoing = self.graph.edges(node).count();
        let incoming = self.graph.edges_directed(node, Direction::Incoming).count();
        outgoing + incoming
    }

    /// Highest-coupling nodes of one label.
    ///
    /// Nodes without any edge are not candidates. Ties are broken by key so
    /// the ranking is stable across runs.
    #[must_use]
    pub fn find_hotspots(&self, kind: NodeKind, limit: usize) -> Vec<(NodeIndex, usize)> {
        let mut scores: Vec<(NodeIndex, usize)> = self
            .nodes_of_kind(kind)
            .into_iter()
            .map(|n| (n, self.coupling_score(n)))
            .filter(|&(_, score)| score > 0)
            .collect();

        scores.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| self.graph[a.0].key.cmp(&self.graph[b.0].key))
        });
        scores.truncate(limit);
        scores
    }

    /// Every relationship with both endpoints
    #[must_use]
    pub fn traversal_rows(&self) -> Vec<TraversalRow> {
        let mut rows: Vec<TraversalRow> = self
            .graph
            .edge_references()
            .map(|edge| {
                let source = self.graph[edge.source()].clone();
                let target = self.graph[edge.target()].clone();
                TraversalRow {
                    source_code: source.property("code").map(str::to_string),
                    source_type: source.property("type").map(str::to_string),
                    target_code: target.property("code").map(str::to_string),
                    target_type: target.property("type").map(str::to_string),
                    relationship: edge.weight().relationship,
                    source,
                    target,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.source
                .key
                .cmp(&b.source.key)
                .then_with(|| a.relationship.cmp(&b.relationship))
                .then_with(|| a.target.key.cmp(&b.target.key))
        });
        rows
    }

    /// Get statistics about the graph
    #[must_use]
    pub fn stats(&self) -> GraphCounts {
        GraphCounts {
            nodes: self.node_count(),
            relationships: self.edge_count(),
        }
    }
}
