//! Tests for property graph and store operations

use archgraph_graph::{
    Direction, GraphCounts, GraphStore, MemoryGraphStore, NodeKey, NodeKind, Properties,
    PropertyGraph, RelationshipType, WriteTx,
};
use pretty_assertions::assert_eq;

fn has_method(class: &str, method: &str) -> WriteTx {
    let mut tx = WriteTx::new();
    tx.merge_node(NodeKey::class(class), Properties::new())
        .merge_node(NodeKey::method(method), Properties::new())
        .merge_relationship(
            NodeKey::class(class),
            RelationshipType::HasMethod,
            NodeKey::method(method),
        );
    tx
}

fn extends(class: &str, parent: &str) -> WriteTx {
    let mut tx = WriteTx::new();
    tx.merge_node(NodeKey::class(class), Properties::new())
        .merge_node(NodeKey::class(parent), Properties::new())
        .merge_relationship(
            NodeKey::class(class),
            RelationshipType::Extends,
            NodeKey::class(parent),
        );
    tx
}

#[test]
fn test_merge_node_is_idempotent() {
    let mut graph = PropertyGraph::new();

    let (first, created) = graph.merge_node(NodeKey::class("Foo"), Properties::new());
    assert!(created);
    let (second, created) = graph.merge_node(NodeKey::class("Foo"), Properties::new());
    assert!(!created);

    assert_eq!(first, second);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_same_key_different_kind_are_distinct() {
    let mut graph = PropertyGraph::new();

    graph.merge_node(NodeKey::class("Foo"), Properties::new());
    graph.merge_node(NodeKey::interface("Foo"), Properties::new());

    assert_eq!(graph.node_count(), 2);
}

#[test]
fn test_merge_edge_is_idempotent() {
    let mut graph = PropertyGraph::new();
    let (a, _) = graph.merge_node(NodeKey::class("A"), Properties::new());
    let (b, _) = graph.merge_node(NodeKey::class("B"), Properties::new());

    assert!(graph.merge_edge(a, RelationshipType::Extends, b));
    assert!(!graph.merge_edge(a, RelationshipType::Extends, b));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_coupling_score_counts_both_directions() {
    let mut graph = PropertyGraph::new();
    let (a, _) = graph.merge_node(NodeKey::class("A"), Properties::new());
    let (b, _) = graph.merge_node(NodeKey::class("B"), Properties::new());
    let (c, _) = graph.merge_node(NodeKey::class("C"), Properties::new());

    graph.merge_edge(a, RelationshipType::Extends, b);
    graph.merge_edge(c, RelationshipType::Extends, b);

    assert_eq!(graph.coupling_score(b), 2);
    assert_eq!(graph.coupling_score(a), 1);
}

#[test]
fn test_find_hotspots_orders_by_degree_then_key() {
    let mut graph = PropertyGraph::new();
    let (a, _) = graph.merge_node(NodeKey::class("A"), Properties::new());
    let (b, _) = graph.merge_node(NodeKey::class("B"), Properties::new());
    let (c, _) = graph.merge_node(NodeKey::class("C"), Properties::new());
    graph.merge_node(NodeKey::class("Lonely"), Properties::new());
    let (m, _) = graph.merge_node(NodeKey::method("run"), Properties::new());

    graph.merge_edge(c, RelationshipType::HasMethod, m);
    graph.merge_edge(c, RelationshipType::Extends, a);
    graph.merge_edge(b, RelationshipType::HasMethod, m);

    let ranked: Vec<(String, usize)> = graph
        .find_hotspots(NodeKind::Class, 10)
        .into_iter()
        .map(|(idx, score)| (graph.graph[idx].key.key.clone(), score))
        .collect();

    assert_eq!(
        ranked,
        vec![
            ("C".to_string(), 2),
            ("A".to_string(), 1),
            ("B".to_string(), 1),
        ]
    );
}

#[test]
fn test_store_apply_reports_created_items() {
    let store = MemoryGraphStore::new();

    let summary = store.apply(has_method("Foo", "bar")).unwrap();
    assert_eq!(summary.nodes_created, 2);
    assert_eq!(summary.relationships_created, 1);

    let again = store.apply(has_method("Foo", "bar")).unwrap();
    assert!(again.is_noop());
    assert_eq!(
        store.counts().unwrap(),
        GraphCounts {
            nodes: 2,
            relationships: 1
        }
    );
}

#[test]
fn test_store_neighbors_by_relationship() {
    let store = MemoryGraphStore::new();
    store.apply(has_method("Foo", "b")).unwrap();
    store.apply(has_method("Foo", "a")).unwrap();
    store.apply(extends("Foo", "Base")).unwrap();

    let methods: Vec<String> = store
        .neighbors(
            &NodeKey::class("Foo"),
            RelationshipType::HasMethod,
            Direction::Outgoing,
        )
        .unwrap()
        .into_iter()
        .map(|n| n.key.key)
        .collect();
    assert_eq!(methods, vec!["a".to_string(), "b".to_string()]);

    let children = store
        .neighbors(
            &NodeKey::class("Base"),
            RelationshipType::Extends,
            Direction::Incoming,
        )
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].key, NodeKey::class("Foo"));

    assert_eq!(store.degree(&NodeKey::class("Foo")).unwrap(), 3);
    assert!(store.degree(&NodeKey::class("Missing")).is_err());
}

#[test]
fn test_delete_all_empties_store() {
    let store = MemoryGraphStore::new();
    store.apply(has_method("Foo", "bar")).unwrap();
    store.apply(extends("Foo", "Base")).unwrap();

    store.delete_all().unwrap();

    assert_eq!(store.counts().unwrap(), GraphCounts::default());
    assert!(store.nodes_of_kind(NodeKind::Class).unwrap().is_empty());
    assert!(store.traverse().unwrap().is_empty());
}

#[test]
fn test_traverse_returns_display_attributes() {
    let store = MemoryGraphStore::new();
    let mut tx = WriteTx::new();
    let flow = NodeKey::control_flow("if", "x > 0");
    tx.merge_node(NodeKey::method("run"), Properties::new())
        .merge_node(
            flow.clone(),
            Properties::from([
                ("type".to_string(), "if".to_string()),
                ("condition".to_string(), "x > 0".to_string()),
            ]),
        )
        .merge_relationship(NodeKey::method("run"), RelationshipType::Contains, flow);
    store.apply(tx).unwrap();

    let rows = store.traverse().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].relationship, RelationshipType::Contains);
    assert_eq!(rows[0].target_type.as_deref(), Some("if"));
    assert_eq!(rows[0].source_type, None);
}

#[test]
fn test_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store").join("graph.json");

    {
        let store = MemoryGraphStore::open(&path).unwrap();
        store.apply(has_method("Foo", "bar")).unwrap();
        store.apply(extends("Foo", "Base")).unwrap();
        store.persist().unwrap();
    }
    assert!(path.exists());

    let reopened = MemoryGraphStore::open(&path).unwrap();
    assert_eq!(
        reopened.counts().unwrap(),
        GraphCounts {
            nodes: 3,
            relationships: 2
        }
    );
    assert_eq!(reopened.degree(&NodeKey::class("Foo")).unwrap(), 2);
}

#[test]
fn test_control_flow_keys_are_composite() {
    let with_condition = NodeKey::control_flow("for", "i < n");
    let without_condition = NodeKey::control_flow("for", "");

    assert_ne!(with_condition, without_condition);
    assert_eq!(with_condition.components(), vec!["for", "i < n"]);
    assert!(without_condition.validate().is_ok());
    assert_eq!(with_condition.to_string(), "ControlFlow(for, i < n)");
}
