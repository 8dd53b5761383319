//! The workflow data model: `Workflow`, `NodeSpec`, and `Edge`.

use dagforge_core::{EdgeId, NodeId, NodeTypeKey, Timestamp, Value, WorkflowId};
use serde::{Deserialize, Serialize};

/// A single node declaration within a workflow.
///
/// Editor-only fields such as canvas position are accepted by the external
/// JSON schema but intentionally have no home here — the engine never
/// reads or stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub node_id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeTypeKey,
    #[serde(default)]
    pub config: Value,
}

impl NodeSpec {
    pub fn new(node_id: NodeId, node_type: NodeTypeKey) -> Self {
        Self {
            node_id,
            node_type,
            config: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// A directed dependency: `source` must complete before `target` is ready.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self { id, source, target }
    }
}

/// An immutable, validated directed acyclic graph of typed nodes.
///
/// Construction is the only place acyclicity and id-uniqueness are
/// checked; once built, a `Workflow` is never mutated. Use
/// [`crate::graph::DependencyGraph`] to reason about readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<Edge>,
    pub created_at: Timestamp,
}

/// The wire-format shape accepted by `create_workflow`, before an id or
/// `created_at` has been assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<Edge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_spec_defaults_to_empty_object_config() {
        let spec = NodeSpec::new(NodeId::new("A").unwrap(), NodeTypeKey::new("noop").unwrap());
        assert_eq!(spec.config, Value::Object(serde_json::Map::new()));
    }

    #[test]
    fn node_spec_serializes_type_field_as_type() {
        let spec = NodeSpec::new(NodeId::new("A").unwrap(), NodeTypeKey::new("http.request").unwrap());
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "http.request");
    }
}
