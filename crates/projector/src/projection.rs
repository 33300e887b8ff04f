use crate::error::Result;
use archgraph_graph::{Direction, GraphNode, GraphStore, NodeKey, NodeKind, RelationshipType};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which classes end up in the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Up to `n` classes with the most relationships
    MostSignificant(usize),
    /// Every class, ordered by name
    All,
}

/// Root of the projected JSON document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStructure {
    pub system_name: Option<String>,
    pub classes: Vec<ClassStructure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStructure {
    pub name: String,
    pub extended_classes: Vec<String>,
    pub implemented_interfaces: Vec<String>,
    pub methods: Vec<MethodStructure>,
    pub fields: Vec<FieldStructure>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodStructure {
    pub name: String,
    pub visibility: Option<String>,
    pub method_calls: Vec<String>,
    pub control_flow: Vec<ControlFlowStructure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControlFlowStructure {
    #[serde(rename = "type")]
    pub kind: String,
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldStructure {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub visibility: String,
}

/// Reads class structure back out of a [`GraphStore`]
pub struct GraphProjector {
    store: Arc<dyn GraphStore>,
    system_name: Option<String>,
}

impl GraphProjector {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            system_name: None,
        }
    }

    #[must_use]
    pub fn with_system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = Some(name.into());
        self
    }

    pub fn project(&self, mode: ProjectionMode) -> Result<SystemStructure> {
        let classes: Vec<GraphNode> = match mode {
            ProjectionMode::MostSignificant(limit) => self
                .store
                .most_connected(NodeKind::Class, limit)?
                .into_iter()
                .map(|(node, degree)| {
                    debug!("Selected class {} (degree {degree})", node.key.key);
                    node
                })
                .collect(),
            ProjectionMode::All => {
                let mut nodes = self.store.nodes_of_kind(NodeKind::Class)?;
                nodes.sort_by(|a, b| a.key.key.cmp(&b.key.key));
                nodes
            }
        };

        let classes = classes
            .iter()
            .map(|node| self.class_structure(&node.key))
            .collect::<Result<Vec<_>>>()?;
        info!("Projected {} classes ({mode:?})", classes.len());

        Ok(SystemStructure {
            system_name: self.system_name.clone(),
            classes,
        })
    }

    /// [`Self::project`] rendered as indented JSON
    pub fn project_json(&self, mode: ProjectionMode) -> Result<String> {
        let structure = self.project(mode)?;
        Ok(serde_json::to_string_pretty(&structure)?)
    }

    fn class_structure(&self, class: &NodeKey) -> Result<ClassStructure> {
        let mut methods = self
            .outgoing(class, RelationshipType::HasMethod)?
            .iter()
            .map(|method| self.method_structure(method))
            .collect::<Result<Vec<_>>>()?;
        methods.sort_by(|a, b| a.name.cmp(&b.name));

        let mut fields: Vec<FieldStructure> = self
            .outgoing(class, RelationshipType::HasField)?
            .iter()
            .map(field_structure)
            .collect();
        fields.sort();

        Ok(ClassStructure {
            name: class.key.clone(),
            extended_classes: self.names(class, RelationshipType::Extends)?,
            implemented_interfaces: self.names(class, RelationshipType::Implements)?,
            methods,
            fields,
            imports: self.names(class, RelationshipType::Imports)?,
        })
    }

    fn method_structure(&self, method: &GraphNode) -> Result<MethodStructure> {
        let mut control_flow: Vec<ControlFlowStructure> = self
            .outgoing(&method.key, RelationshipType::Contains)?
            .iter()
            .map(control_flow_structure)
            .collect();
        control_flow.sort();

        Ok(MethodStructure {
            name: method.name().to_string(),
            visibility: method.property("visibility").map(str::to_string),
            method_calls: self.names(&method.key, RelationshipType::Calls)?,
            control_flow,
        })
    }

    fn outgoing(&self, key: &NodeKey, relationship: RelationshipType) -> Result<Vec<GraphNode>> {
        Ok(self
            .store
            .neighbors(key, relationship, Direction::Outgoing)?)
    }

    fn names(&self, key: &NodeKey, relationship: RelationshipType) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .outgoing(key, relationship)?
            .iter()
            .map(|node| node.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn control_flow_structure(node: &GraphNode) -> ControlFlowStructure {
    let parts = node.key.components();
    ControlFlowStructure {
        kind: node
            .property("type")
            .or_else(|| parts.first().copied())
            .unwrap_or_default()
            .to_string(),
        condition: node
            .property("condition")
            .or_else(|| parts.get(1).copied())
            .unwrap_or_default()
            .to_string(),
    }
}

fn field_structure(node: &GraphNode) -> FieldStructure {
    let parts = node.key.components();
    let attribute = |name: &str, index: usize| {
        node.property(name)
            .or_else(|| parts.get(index).copied())
            .unwrap_or_default()
            .to_string()
    };
    FieldStructure {
        name: attribute("name", 0),
        type_name: attribute("type", 1),
        visibility: attribute("visibility", 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_graph::Properties;

    #[test]
    fn test_field_structure_falls_back_to_key() {
        let node = GraphNode::new(NodeKey::field("items", "List<Item>", "private"), Properties::new());
        assert_eq!(
            field_structure(&node),
            FieldStructure {
                name: "items".to_string(),
                type_name: "List<Item>".to_string(),
                visibility: "private".to_string(),
            }
        );
    }

    #[test]
    fn test_control_flow_structure_keeps_empty_condition() {
        let node = GraphNode::new(NodeKey::control_flow("for", ""), Properties::new());
        let flow = control_flow_structure(&node);
        assert_eq!(flow.kind, "for");
        assert_eq!(flow.condition, "");
    }

    #[test]
    fn test_empty_lists_are_serialized() {
        let structure = SystemStructure {
            system_name: None,
            classes: vec![ClassStructure {
                name: "Empty".to_string(),
                ..ClassStructure::default()
            }],
        };
        let json = serde_json::to_value(&structure).unwrap();
        assert_eq!(json["systemName"], serde_json::Value::Null);
        assert_eq!(json["classes"][0]["methods"], serde_json::json!([]));
        assert_eq!(json["classes"][0]["extendedClasses"], serde_json::json!([]));
        assert_eq!(json["classes"][0]["imports"], serde_json::json!([]));
    }
}
