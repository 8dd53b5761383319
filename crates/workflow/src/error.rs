use dagforge_core::NodeId;
use thiserror::Error;

/// Validation failures raised while building a [`crate::Workflow`].
///
/// All variants surface synchronously from `create_workflow`; no execution
/// state is ever created for an invalid workflow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("duplicate node id `{0}` in workflow")]
    DuplicateNodeId(NodeId),

    #[error("edge references unknown node `{0}`")]
    DanglingEdge(NodeId),

    #[error("workflow graph contains a cycle through node `{0}`")]
    Cycle(NodeId),

    #[error("workflow must declare at least one node")]
    Empty,
}
