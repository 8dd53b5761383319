use dagforge_core::NodeId;
use thiserror::Error;

use crate::status::ExecutionStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("cannot transition execution from {from} to {to}")]
    InvalidTransition {
        from: ExecutionStatus,
        to: ExecutionStatus,
    },

    #[error("node `{0}` is already in node_results")]
    AlreadyResolved(NodeId),

    #[error("node `{0}` is already in node_errors")]
    AlreadyFailed(NodeId),

    #[error("node `{0}` not declared in this workflow")]
    NodeNotFound(NodeId),
}
