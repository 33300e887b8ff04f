use crate::error::{IngestError, Result};
use crate::facts::{Fact, FactSink};
use archgraph_graph::{
    GraphStore, NodeKey, Properties, RelationshipType, WriteSummary, WriteTx,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How method nodes are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKeying {
    /// Bare method name; same-named methods of different classes share a node
    #[default]
    BareName,
    /// `Class.method`
    ClassQualified,
}

/// Batch behaviour of [`GraphIngestor::ingest_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestMode {
    /// Record per-fact failures and keep going
    #[default]
    BestEffort,
    /// Stop at the first failure
    FailFast,
}

/// A fact that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    pub fact: Fact,
    pub error: String,
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub facts_applied: usize,
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    fn record(&mut self, summary: WriteSummary) {
        self.facts_applied += 1;
        self.nodes_created += summary.nodes_created;
        self.relationships_created += summary.relationships_created;
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn props<const N: usize>(pairs: [(&str, &str); N]) -> Properties {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Turns facts into create-if-absent graph writes.
///
/// Every upsert is one [`WriteTx`]: endpoint nodes first, then the
/// relationship, committed in a single store call.
pub struct GraphIngestor {
    store: Arc<dyn GraphStore>,
    keying: MethodKeying,
}

impl GraphIngestor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            keying: MethodKeying::default(),
        }
    }

    #[must_use]
    pub fn with_method_keying(mut self, keying: MethodKeying) -> Self {
        self.keying = keying;
        self
    }

    #[must_use]
    pub const fn method_keying(&self) -> MethodKeying {
        self.keying
    }

    /// Key of the method node for `method` declared in `class`
    #[must_use]
    pub fn method_key(&self, class: &str, method: &str) -> NodeKey {
        match self.keying {
            MethodKeying::BareName => NodeKey::method(method),
            MethodKeying::ClassQualified => NodeKey::method(format!("{class}.{method}")),
        }
    }

    fn commit(&self, fact: &Fact, tx: WriteTx) -> Result<WriteSummary> {
        debug!("Ingesting {fact}");
        self.store
            .apply(tx)
            .map_err(|e| IngestError::from_store(fact, e))
    }

    pub fn upsert_class(&self, name: &str) -> Result<WriteSummary> {
        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(name), Properties::new());
        self.commit(
            &Fact::ClassDeclared {
                name: name.to_string(),
            },
            tx,
        )
    }

    pub fn upsert_method(&self, class: &str, method: &str) -> Result<WriteSummary> {
        self.write_method(class, method, None)
    }

    pub fn upsert_method_with_visibility(
        &self,
        class: &str,
        method: &str,
        visibility: &str,
    ) -> Result<WriteSummary> {
        self.write_method(class, method, Some(visibility))
    }

    fn write_method(
        &self,
        class: &str,
        method: &str,
        visibility: Option<&str>,
    ) -> Result<WriteSummary> {
        let key = self.method_key(class, method);
        let mut properties = props([("name", method)]);
        if let Some(visibility) = visibility {
            properties.insert("visibility".to_string(), visibility.to_string());
        }

        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(class), Properties::new())
            .merge_node(key.clone(), properties)
            .merge_relationship(NodeKey::class(class), RelationshipType::HasMethod, key);
        self.commit(
            &Fact::MethodDeclared {
                class: class.to_string(),
                name: method.to_string(),
                visibility: visibility.map(str::to_string),
            },
            tx,
        )
    }

    /// `class` is the caller's declaring class
    pub fn upsert_call(&self, class: &str, method: &str, callee: &str) -> Result<WriteSummary> {
        let caller = self.method_key(class, method);
        let target = NodeKey::method_call(callee);

        let mut tx = WriteTx::new();
        tx.merge_node(caller.clone(), props([("name", method)]))
            .merge_node(target.clone(), props([("name", callee)]))
            .merge_relationship(caller, RelationshipType::Calls, target);
        self.commit(
            &Fact::MethodCall {
                class: class.to_string(),
                caller: method.to_string(),
                callee: callee.to_string(),
            },
            tx,
        )
    }

    pub fn upsert_control_flow(
        &self,
        class: &str,
        method: &str,
        kind: &str,
        condition: &str,
    ) -> Result<WriteSummary> {
        let owner = self.method_key(class, method);
        let flow = NodeKey::control_flow(kind, condition);

        let mut tx = WriteTx::new();
        tx.merge_node(owner.clone(), props([("name", method)]))
            .merge_node(flow.clone(), props([("type", kind), ("condition", condition)]))
            .merge_relationship(owner, RelationshipType::Contains, flow);
        self.commit(
            &Fact::ControlFlow {
                class: class.to_string(),
                method: method.to_string(),
                kind: kind.to_string(),
                condition: condition.to_string(),
            },
            tx,
        )
    }

    /// Creates the parent class node if it is not declared anywhere
    pub fn upsert_inheritance(&self, class: &str, parent: &str) -> Result<WriteSummary> {
        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(class), Properties::new())
            .merge_node(NodeKey::class(parent), Properties::new())
            .merge_relationship(
                NodeKey::class(class),
                RelationshipType::Extends,
                NodeKey::class(parent),
            );
        self.commit(
            &Fact::Inherits {
                class: class.to_string(),
                parent: parent.to_string(),
            },
            tx,
        )
    }

    pub fn upsert_interface_impl(&self, class: &str, interface: &str) -> Result<WriteSummary> {
        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(class), Properties::new())
            .merge_node(NodeKey::interface(interface), props([("name", interface)]))
            .merge_relationship(
                NodeKey::class(class),
                RelationshipType::Implements,
                NodeKey::interface(interface),
            );
        self.commit(
            &Fact::Implements {
                class: class.to_string(),
                interface: interface.to_string(),
            },
            tx,
        )
    }

    pub fn upsert_field(
        &self,
        class: &str,
        name: &str,
        type_name: &str,
        visibility: &str,
    ) -> Result<WriteSummary> {
        let field = NodeKey::field(name, type_name, visibility);

        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(class), Properties::new())
            .merge_node(
                field.clone(),
                props([("name", name), ("type", type_name), ("visibility", visibility)]),
            )
            .merge_relationship(NodeKey::class(class), RelationshipType::HasField, field);
        self.commit(
            &Fact::FieldDeclared {
                class: class.to_string(),
                name: name.to_string(),
                type_name: type_name.to_string(),
                visibility: visibility.to_string(),
            },
            tx,
        )
    }

    pub fn upsert_import(&self, class: &str, import: &str) -> Result<WriteSummary> {
        let mut tx = WriteTx::new();
        tx.merge_node(NodeKey::class(class), Properties::new())
            .merge_node(NodeKey::import(import), props([("name", import)]))
            .merge_relationship(
                NodeKey::class(class),
                RelationshipType::Imports,
                NodeKey::import(import),
            );
        self.commit(
            &Fact::Imports {
                class: class.to_string(),
                imported: import.to_string(),
            },
            tx,
        )
    }

    /// Delete every node and relationship
    pub fn reset(&self) -> Result<()> {
        self.store.delete_all().map_err(IngestError::Connectivity)?;
        info!("Graph reset");
        Ok(())
    }

    /// Dispatch one fact to its upsert
    pub fn ingest(&self, fact: &Fact) -> Result<WriteSummary> {
        match fact {
            Fact::ClassDeclared { name } => self.upsert_class(name),
            Fact::MethodDeclared {
                class,
                name,
                visibility: Some(visibility),
            } => self.upsert_method_with_visibility(class, name, visibility),
            Fact::MethodDeclared {
                class,
                name,
                visibility: None,
            } => self.upsert_method(class, name),
            Fact::MethodCall {
                class,
                caller,
                callee,
            } => self.upsert_call(class, caller, callee),
            Fact::ControlFlow {
                class,
                method,
                kind,
                condition,
            } => self.upsert_control_flow(class, method, kind, condition),
            Fact::Inherits { class, parent } => self.upsert_inheritance(class, parent),
            Fact::Implements { class, interface } => self.upsert_interface_impl(class, interface),
            Fact::FieldDeclared {
                class,
                name,
                type_name,
                visibility,
            } => self.upsert_field(class, name, type_name, visibility),
            Fact::Imports { class, imported } => self.upsert_import(class, imported),
        }
    }

    /// Ingest a batch of facts.
    ///
    /// Connectivity loss aborts regardless of `mode`. In
    /// [`IngestMode::FailFast`] the first write failure is returned as the
    /// error; in [`IngestMode::BestEffort`] it is recorded in the report.
    pub fn ingest_all<'a, I>(&self, facts: I, mode: IngestMode) -> Result<IngestReport>
    where
        I: IntoIterator<Item = &'a Fact>,
    {
        let mut report = IngestReport::default();
        for fact in facts {
            match self.ingest(fact) {
                Ok(summary) => report.record(summary),
                Err(err) if err.is_fatal() || mode == IngestMode::FailFast => return Err(err),
                Err(err) => {
                    warn!("Skipping fact: {err}");
                    report.failures.push(IngestFailure {
                        fact: fact.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Ingested {} facts ({} nodes, {} relationships created, {} failed)",
            report.facts_applied,
            report.nodes_created,
            report.relationships_created,
            report.failures.len()
        );
        Ok(report)
    }
}

impl FactSink for &GraphIngestor {
    type Error = IngestError;

    fn accept(&mut self, fact: Fact) -> Result<()> {
        self.ingest(&fact).map(|_| ())
    }
}
