//! # Dagforge Workflow
//!
//! The workflow data model (`Workflow`, `NodeSpec`, `Edge`) plus
//! [`DependencyGraph`], the petgraph-backed view used to validate
//! acyclicity at creation time and to answer predecessor/successor
//! queries the scheduler needs on every readiness scan.

pub mod error;
pub mod graph;
pub mod spec;

pub use error::WorkflowError;
pub use graph::DependencyGraph;
pub use spec::{Edge, NodeSpec, Workflow, WorkflowSpec};

use chrono::Utc;
use dagforge_core::WorkflowId;

impl Workflow {
    /// Validate and materialize a [`WorkflowSpec`] into an immutable,
    /// acyclic `Workflow`. This is the only constructor — there is no
    /// way to obtain a `Workflow` value that has not passed validation.
    pub fn try_from_spec(spec: WorkflowSpec) -> Result<Self, WorkflowError> {
        if spec.nodes.is_empty() {
            return Err(WorkflowError::Empty);
        }
        let workflow = Self {
            id: WorkflowId::v4(),
            name: spec.name,
            nodes: spec.nodes,
            edges: spec.edges,
            created_at: Utc::now(),
        };
        // `from_workflow` performs id-uniqueness, dangling-edge, and
        // cycle checks; we only need the validation, not the graph here.
        DependencyGraph::from_workflow(&workflow)?;
        Ok(workflow)
    }

    pub fn graph(&self) -> Result<DependencyGraph, WorkflowError> {
        DependencyGraph::from_workflow(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagforge_core::{EdgeId, NodeId, NodeTypeKey};

    fn nid(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    #[test]
    fn valid_spec_produces_workflow_with_fresh_id() {
        let spec = WorkflowSpec {
            name: "pipeline".into(),
            nodes: vec![NodeSpec::new(nid("A"), NodeTypeKey::new("noop").unwrap())],
            edges: vec![],
        };
        let wf = Workflow::try_from_spec(spec).unwrap();
        assert_eq!(wf.name, "pipeline");
        assert!(!wf.id.is_nil());
    }

    #[test]
    fn cyclic_spec_is_rejected_at_creation() {
        let spec = WorkflowSpec {
            name: "cyclic".into(),
            nodes: vec![
                NodeSpec::new(nid("A"), NodeTypeKey::new("noop").unwrap()),
                NodeSpec::new(nid("B"), NodeTypeKey::new("noop").unwrap()),
            ],
            edges: vec![
                Edge::new(EdgeId::new("e1").unwrap(), nid("A"), nid("B")),
                Edge::new(EdgeId::new("e2").unwrap(), nid("B"), nid("A")),
            ],
        };
        assert!(matches!(Workflow::try_from_spec(spec), Err(WorkflowError::Cycle(_))));
    }

    #[test]
    fn empty_spec_is_rejected() {
        let spec = WorkflowSpec {
            name: "empty".into(),
            nodes: vec![],
            edges: vec![],
        };
        assert_eq!(Workflow::try_from_spec(spec).unwrap_err(), WorkflowError::Empty);
    }
}
