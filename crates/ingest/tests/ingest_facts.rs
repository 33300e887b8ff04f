//! Tests for fact ingestion

use archgraph_graph::{
    Direction, GraphCounts, GraphError, GraphNode, GraphStore, MemoryGraphStore, NodeKey,
    NodeKind, RelationshipType, TraversalRow, WriteSummary, WriteTx,
};
use archgraph_ingest::{
    Fact, FactSink, GraphIngestor, IngestError, IngestMode, MethodKeying,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup() -> (Arc<MemoryGraphStore>, GraphIngestor) {
    let store = Arc::new(MemoryGraphStore::new());
    let ingestor = GraphIngestor::new(store.clone());
    (store, ingestor)
}

fn sample_facts() -> Vec<Fact> {
    vec![
        Fact::ClassDeclared {
            name: "Order".to_string(),
        },
        Fact::MethodDeclared {
            class: "Order".to_string(),
            name: "total".to_string(),
            visibility: Some("public".to_string()),
        },
        Fact::MethodCall {
            class: "Order".to_string(),
            caller: "total".to_string(),
            callee: "price".to_string(),
        },
        Fact::ControlFlow {
            class: "Order".to_string(),
            method: "total".to_string(),
            kind: "if".to_string(),
            condition: "items.isEmpty()".to_string(),
        },
        Fact::Inherits {
            class: "Order".to_string(),
            parent: "Entity".to_string(),
        },
        Fact::Implements {
            class: "Order".to_string(),
            interface: "Serializable".to_string(),
        },
        Fact::FieldDeclared {
            class: "Order".to_string(),
            name: "items".to_string(),
            type_name: "List".to_string(),
            visibility: "private".to_string(),
        },
        Fact::Imports {
            class: "Order".to_string(),
            imported: "java.util.List".to_string(),
        },
    ]
}

#[test]
fn test_ingest_all_builds_expected_graph() {
    let (store, ingestor) = setup();

    let report = ingestor
        .ingest_all(&sample_facts(), IngestMode::FailFast)
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.facts_applied, 8);
    // Order, total, price, if, Entity, Serializable, items, java.util.List
    assert_eq!(report.nodes_created, 8);
    assert_eq!(report.relationships_created, 7);
    assert_eq!(
        store.counts().unwrap(),
        GraphCounts {
            nodes: 8,
            relationships: 7
        }
    );

    let parents = store
        .neighbors(
            &NodeKey::class("Order"),
            RelationshipType::Extends,
            Direction::Outgoing,
        )
        .unwrap();
    assert_eq!(parents[0].key, NodeKey::class("Entity"));
}

#[test]
fn test_ingesting_twice_changes_nothing() {
    let (store, ingestor) = setup();
    let facts = sample_facts();

    ingestor.ingest_all(&facts, IngestMode::FailFast).unwrap();
    let before = store.counts().unwrap();
    let second = ingestor.ingest_all(&facts, IngestMode::FailFast).unwrap();

    assert_eq!(second.nodes_created, 0);
    assert_eq!(second.relationships_created, 0);
    assert_eq!(store.counts().unwrap(), before);
}

#[test]
fn test_reset_then_query_is_empty() {
    let (store, ingestor) = setup();
    ingestor
        .ingest_all(&sample_facts(), IngestMode::FailFast)
        .unwrap();

    ingestor.reset().unwrap();

    assert!(store.nodes_of_kind(NodeKind::Class).unwrap().is_empty());
    assert_eq!(store.counts().unwrap().relationships, 0);
}

#[test]
fn test_bare_name_keying_shares_methods_across_classes() {
    let (store, ingestor) = setup();

    ingestor.upsert_method("A", "run").unwrap();
    ingestor.upsert_method("B", "run").unwrap();

    assert_eq!(store.nodes_of_kind(NodeKind::Method).unwrap().len(), 1);
    assert_eq!(store.degree(&NodeKey::method("run")).unwrap(), 2);
}

#[test]
fn test_class_qualified_keying_separates_methods() {
    let store = Arc::new(MemoryGraphStore::new());
    let ingestor =
        GraphIngestor::new(store.clone()).with_method_keying(MethodKeying::ClassQualified);

    ingestor.upsert_method("A", "run").unwrap();
    ingestor.upsert_method("B", "run").unwrap();
    ingestor.upsert_call("A", "run", "helper").unwrap();

    let methods = store.nodes_of_kind(NodeKind::Method).unwrap();
    assert_eq!(methods.len(), 2);
    assert!(methods.iter().all(|m| m.name() == "run"));
    assert_eq!(store.degree(&NodeKey::method("A.run")).unwrap(), 2);
    assert_eq!(store.degree(&NodeKey::method("B.run")).unwrap(), 1);
}

#[test]
fn test_control_flow_without_condition() {
    let (store, ingestor) = setup();

    ingestor.upsert_control_flow("A", "loop", "for", "").unwrap();
    ingestor.upsert_control_flow("A", "loop", "for", "i < n").unwrap();

    let flows = store
        .neighbors(
            &NodeKey::method("loop"),
            RelationshipType::Contains,
            Direction::Outgoing,
        )
        .unwrap();
    let conditions: Vec<&str> = flows
        .iter()
        .map(|f| f.property("condition").unwrap_or_default())
        .collect();
    assert_eq!(conditions, vec!["", "i < n"]);
}

#[test]
fn test_best_effort_records_failures_and_continues() {
    let (store, ingestor) = setup();
    let facts = vec![
        Fact::ClassDeclared {
            name: "A".to_string(),
        },
        Fact::Inherits {
            class: "A".to_string(),
            parent: " ".to_string(),
        },
        Fact::ClassDeclared {
            name: "B".to_string(),
        },
    ];

    let report = ingestor.ingest_all(&facts, IngestMode::BestEffort).unwrap();

    assert_eq!(report.facts_applied, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].fact, facts[1]);
    assert_eq!(store.nodes_of_kind(NodeKind::Class).unwrap().len(), 2);
}

#[test]
fn test_fail_fast_returns_fact_context() {
    let (store, ingestor) = setup();
    let facts = vec![
        Fact::Imports {
            class: "A".to_string(),
            imported: String::new(),
        },
        Fact::ClassDeclared {
            name: "B".to_string(),
        },
    ];

    let err = ingestor
        .ingest_all(&facts, IngestMode::FailFast)
        .unwrap_err();

    assert!(matches!(err, IngestError::Write { .. }));
    assert_eq!(err.fact(), Some(&facts[0]));
    // The failed transaction must not leave the class behind
    assert_eq!(store.counts().unwrap(), GraphCounts::default());
}

#[test]
fn test_fact_sink_pushes_into_graph() {
    let (store, ingestor) = setup();
    let mut sink = &ingestor;

    for fact in sample_facts() {
        sink.accept(fact).unwrap();
    }

    assert_eq!(store.counts().unwrap().nodes, 8);
}

/// Store whose backend is gone
struct OfflineStore;

impl GraphStore for OfflineStore {
    fn apply(&self, _tx: WriteTx) -> archgraph_graph::Result<WriteSummary> {
        Err(GraphError::Unavailable("connection refused".to_string()))
    }

    fn delete_all(&self) -> archgraph_graph::Result<()> {
        Err(GraphError::Unavailable("connection refused".to_string()))
    }

    fn node(&self, _key: &NodeKey) -> archgraph_graph::Result<Option<GraphNode>> {
        Ok(None)
    }

    fn nodes_of_kind(&self, _kind: NodeKind) -> archgraph_graph::Result<Vec<GraphNode>> {
        Ok(Vec::new())
    }

    fn neighbors(
        &self,
        _key: &NodeKey,
        _relationship: RelationshipType,
        _direction: Direction,
    ) -> archgraph_graph::Result<Vec<GraphNode>> {
        Ok(Vec::new())
    }

    fn degree(&self, _key: &NodeKey) -> archgraph_graph::Result<usize> {
        Ok(0)
    }

    fn most_connected(
        &self,
        _kind: NodeKind,
        _limit: usize,
    ) -> archgraph_graph::Result<Vec<(GraphNode, usize)>> {
        Ok(Vec::new())
    }

    fn counts(&self) -> archgraph_graph::Result<GraphCounts> {
        Ok(GraphCounts::default())
    }

    fn traverse(&self) -> archgraph_graph::Result<Vec<TraversalRow>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_connectivity_loss_aborts_best_effort_batch() {
    let ingestor = GraphIngestor::new(Arc::new(OfflineStore));

    let err = ingestor
        .ingest_all(&sample_facts(), IngestMode::BestEffort)
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(ingestor.reset().unwrap_err().is_fatal());
}
