use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Separator between the components of a composite node key.
///
/// ASCII unit separator: cannot appear in identifiers and is vanishingly rare
/// in condition text.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Node label in the property graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Class,
    Method,
    MethodCall,
    ControlFlow,
    ClassField,
    Import,
    Interface,
}

impl NodeKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Method => "Method",
            Self::MethodCall => "MethodCall",
            Self::ControlFlow => "ControlFlow",
            Self::ClassField => "ClassField",
            Self::Import => "Import",
            Self::Interface => "Interface",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Type of relationship between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Class declares method
    HasMethod,
    /// Method calls a target
    Calls,
    /// Method contains a control-flow construct
    Contains,
    /// Class extends class
    Extends,
    /// Class implements interface
    Implements,
    /// Class declares field
    HasField,
    /// Class imports a name
    Imports,
}

impl RelationshipType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasMethod => "HAS_METHOD",
            Self::Calls => "CALLS",
            Self::Contains => "CONTAINS",
            Self::Extends => "EXTENDS",
            Self::Implements => "IMPLEMENTS",
            Self::HasField => "HAS_FIELD",
            Self::Imports => "IMPORTS",
        }
    }

    /// Node kinds allowed at the (source, target) ends of this relationship.
    #[must_use]
    pub const fn endpoints(self) -> (NodeKind, NodeKind) {
        match self {
            Self::HasMethod => (NodeKind::Class, NodeKind::Method),
            Self::Calls => (NodeKind::Method, NodeKind::MethodCall),
            Self::Contains => (NodeKind::Method, NodeKind::ControlFlow),
            Self::Extends => (NodeKind::Class, NodeKind::Class),
            Self::Implements => (NodeKind::Class, NodeKind::Interface),
            Self::HasField => (NodeKind::Class, NodeKind::ClassField),
            Self::Imports => (NodeKind::Class, NodeKind::Import),
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a node: its label plus the uniqueness key within that label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub key: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Class, name)
    }

    pub fn method(key: impl Into<String>) -> Self {
        Self::new(NodeKind::Method, key)
    }

    pub fn method_call(callee: impl Into<String>) -> Self {
        Self::new(NodeKind::MethodCall, callee)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Interface, name)
    }

    pub fn import(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Import, name)
    }

    #[must_use]
    pub fn control_flow(kind: &str, condition: &str) -> Self {
        Self::new(NodeKind::ControlFlow, composite_key(&[kind, condition]))
    }

    #[must_use]
    pub fn field(name: &str, type_name: &str, visibility: &str) -> Self {
        Self::new(
            NodeKind::ClassField,
            composite_key(&[name, type_name, visibility]),
        )
    }

    /// Components of a composite key (a single element for simple keys).
    #[must_use]
    pub fn components(&self) -> Vec<&str> {
        self.key.split(KEY_SEPARATOR).collect()
    }

    /// Reject keys the store must never index.
    ///
    /// The leading component is the identifying name and must be non-blank;
    /// trailing components (e.g. a `for` loop without condition) may be empty.
    pub fn validate(&self) -> crate::Result<()> {
        let head = self.components().first().copied().unwrap_or_default();
        if head.trim().is_empty() {
            return Err(crate::GraphError::InvalidKey(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.components().join(", "))
    }
}

fn composite_key(parts: &[&str]) -> String {
    let mut out = String::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.push(KEY_SEPARATOR);
        }
        out.push_str(part);
    }
    out
}

/// Node attributes; set once when the node is created
pub type Properties = BTreeMap<String, String>;

/// Node in the property graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: NodeKey,
    #[serde(default)]
    pub properties: Properties,
}

impl GraphNode {
    #[must_use]
    pub const fn new(key: NodeKey, properties: Properties) -> Self {
        Self { key, properties }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Display name: the `name` attribute, falling back to the key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.property("name").unwrap_or(self.key.key.as_str())
    }
}

/// Edge in the property graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub relationship: RelationshipType,
}

/// Node and relationship totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

/// One relationship as returned by the diagnostic traversal read.
///
/// `*_code` / `*_type` are the free-form display attributes of each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalRow {
    pub source: GraphNode,
    pub relationship: RelationshipType,
    pub target: GraphNode,
    pub source_code: Option<String>,
    pub source_type: Option<String>,
    pub target_code: Option<String>,
    pub target_type: Option<String>,
}

/// Keyed property graph
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    pub graph: DiGraph<GraphNode, GraphEdge>,
    pub(crate) index: HashMap<NodeKey, NodeIndex>,
}

impl PropertyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn find_node(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    #[must_use]
    pub fn get_node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
    }
}
