use crate::error::{GraphError, Result};
use crate::store::{GraphStore, WriteOp, WriteSummary, WriteTx};
use crate::types::{
    GraphCounts, GraphNode, NodeKey, NodeKind, PropertyGraph, RelationshipType, TraversalRow,
};
use log::{debug, info};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    nodes: Vec<GraphNode>,
    relationships: Vec<SnapshotEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEdge {
    from: NodeKey,
    relationship: RelationshipType,
    to: NodeKey,
}

/// In-process graph store backed by a keyed `petgraph` graph.
///
/// Optionally bound to a JSON snapshot file so separate processes can share
/// one graph. Writes stay in memory until [`MemoryGraphStore::persist`].
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: RwLock<PropertyGraph>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store bound to `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let graph = if path.exists() {
            let graph = load_snapshot(&path)?;
            info!(
                "Loaded graph snapshot {} ({} nodes, {} relationships)",
                path.display(),
                graph.node_count(),
                graph.edge_count()
            );
            graph
        } else {
            debug!("No snapshot at {}, starting empty", path.display());
            PropertyGraph::new()
        };

        Ok(Self {
            graph: RwLock::new(graph),
            snapshot_path: Some(path),
        })
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Write the current graph to the bound snapshot file.
    ///
    /// No-op for stores without a snapshot path.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let graph = self.read()?;
        save_snapshot(&graph, path)?;
        info!(
            "Persisted graph snapshot {} ({} nodes, {} relationships)",
            path.display(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PropertyGraph>> {
        self.graph
            .read()
            .map_err(|_| GraphError::Unavailable("graph lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PropertyGraph>> {
        self.graph
            .write()
            .map_err(|_| GraphError::Unavailable("graph lock poisoned".to_string()))
    }
}

/// Check every operation against the graph before anything is written
fn validate(graph: &PropertyGraph, ops: &[WriteOp]) -> Result<()> {
    let mut pending: HashSet<&NodeKey> = HashSet::new();
    for op in ops {
        match op {
            WriteOp::MergeNode { key, .. } => {
                key.validate()?;
                pending.insert(key);
            }
            WriteOp::MergeRelationship {
                from,
                relationship,
                to,
            } => {
                let (source_kind, target_kind) = relationship.endpoints();
                if from.kind != source_kind || to.kind != target_kind {
                    return Err(GraphError::InvalidRelationship {
                        from: from.clone(),
                        relationship: *relationship,
                        to: to.clone(),
                    });
                }
                for endpoint in [from, to] {
                    if !pending.contains(endpoint) && graph.find_node(endpoint).is_none() {
                        return Err(GraphError::MissingEndpoint(endpoint.clone()));
                    }
                }
            }
        }
    }
    Ok(())
}

impl GraphStore for MemoryGraphStore {
    fn apply(&self, tx: WriteTx) -> Result<WriteSummary> {
        if tx.is_empty() {
            return Ok(WriteSummary::default());
        }
        let mut graph = self.write()?;
        validate(&graph, tx.ops())?;

        let mut summary = WriteSummary::default();
        for op in tx.into_ops() {
            match op {
                WriteOp::MergeNode { key, properties } => {
                    let (_, created) = graph.merge_node(key, properties);
                    if created {
                        summary.nodes_created += 1;
                    }
                }
                WriteOp::MergeRelationship {
                    from,
                    relationship,
                    to,
                } => {
                    let (Some(source), Some(target)) = (graph.find_node(&from), graph.find_node(&to))
                    else {
                        return Err(GraphError::MissingEndpoint(from));
                    };
                    if graph.merge_edge(source, relationship, target) {
                        summary.relationships_created += 1;
                    }
                }
            }
        }
        Ok(summary)
    }

    fn delete_all(&self) -> Result<()> {
        let mut graph = self.write()?;
        let removed = graph.stats();
        graph.clear();
        info!(
            "Deleted {} nodes and {} relationships",
            removed.nodes, removed.relationships
        );
        Ok(())
    }

    fn node(&self, key: &NodeKey) -> Result<Option<GraphNode>> {
        let graph = self.read()?;
        Ok(graph
            .find_node(key)
            .and_then(|idx| graph.get_node(idx))
            .cloned())
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Result<Vec<GraphNode>> {
        let graph = self.read()?;
        let mut nodes: Vec<GraphNode> = graph
            .nodes_of_kind(kind)
            .into_iter()
            .filter_map(|idx| graph.get_node(idx).cloned())
            .collect();
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }

    fn neighbors(
        &self,
        key: &NodeKey,
        relationship: RelationshipType,
        direction: Direction,
    ) -> Result<Vec<GraphNode>> {
        let graph = self.read()?;
        let Some(idx) = graph.find_node(key) else {
            return Ok(Vec::new());
        };
        let mut nodes: Vec<GraphNode> = graph
            .neighbors(idx, relationship, direction)
            .into_iter()
            .filter_map(|n| graph.get_node(n).cloned())
            .collect();
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }

    fn degree(&self, key: &NodeKey) -> Result<usize> {
        let graph = self.read()?;
        graph
            .find_node(key)
            .map(|idx| graph.coupling_score(idx))
            .ok_or_else(|| GraphError::NodeNotFound(key.clone()))
    }

    fn most_connected(&self, kind: NodeKind, limit: usize) -> Result<Vec<(GraphNode, usize)>> {
        let graph = self.read()?;
        Ok(graph
            .find_hotspots(kind, limit)
            .into_iter()
            .filter_map(|(idx, score)| graph.get_node(idx).cloned().map(|n| (n, score)))
            .collect())
    }

    fn counts(&self) -> Result<GraphCounts> {
        Ok(self.read()?.stats())
    }

    fn traverse(&self) -> Result<Vec<TraversalRow>> {
        Ok(self.read()?.traversal_rows())
    }
}

fn load_snapshot(path: &Path) -> Result<PropertyGraph> {
    let content = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(GraphError::SnapshotVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let mut graph = PropertyGraph::new();
    for node in snapshot.nodes {
        graph.merge_node(node.key, node.properties);
    }
    for edge in snapshot.relationships {
        let source = graph
            .find_node(&edge.from)
            .ok_or_else(|| GraphError::MissingEndpoint(edge.from.clone()))?;
        let target = graph
            .find_node(&edge.to)
            .ok_or_else(|| GraphError::MissingEndpoint(edge.to.clone()))?;
        graph.merge_edge(source, edge.relationship, target);
    }
    Ok(graph)
}

fn save_snapshot(graph: &PropertyGraph, path: &Path) -> Result<()> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        nodes: graph.graph.node_weights().cloned().collect(),
        relationships: graph
            .graph
            .edge_references()
            .map(|e| SnapshotEdge {
                from: graph.graph[e.source()].key.clone(),
                relationship: e.weight().relationship,
                to: graph.graph[e.target()].key.clone(),
            })
            .collect(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file and rename so readers never see a torn file
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        serde_json::to_writer(&mut file, &snapshot)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
