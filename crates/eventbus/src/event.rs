use chrono::Utc;
use dagforge_core::{ExecutionId, NodeId, Timestamp, Value, WorkflowId};
use serde::{Deserialize, Serialize};

/// A workflow or node lifecycle transition, emitted by the scheduler
/// after the durable state write that caused it — event emission is
/// ordered with respect to the mutation, never ahead of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "node:started")]
    NodeStarted,
    #[serde(rename = "node:completed")]
    NodeCompleted,
    /// A node failed but will be retried.
    #[serde(rename = "node:failed")]
    NodeFailed,
    /// A node failed terminally (retries exhausted or non-retryable).
    #[serde(rename = "node:error")]
    NodeError,
    #[serde(rename = "workflow:started")]
    WorkflowStarted,
    #[serde(rename = "workflow:completed")]
    WorkflowCompleted,
    #[serde(rename = "workflow:failed")]
    WorkflowFailed,
    #[serde(rename = "workflow:cancelled")]
    WorkflowCancelled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeStarted => "node:started",
            Self::NodeCompleted => "node:completed",
            Self::NodeFailed => "node:failed",
            Self::NodeError => "node:error",
            Self::WorkflowStarted => "workflow:started",
            Self::WorkflowCompleted => "workflow:completed",
            Self::WorkflowFailed => "workflow:failed",
            Self::WorkflowCancelled => "workflow:cancelled",
        }
    }
}

/// The envelope delivered to subscribers — this is the external JSON
/// shape consumers receive over a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub node_id: Option<NodeId>,
    pub payload: Value,
    pub timestamp: Timestamp,
}

impl Event {
    pub fn new(
        kind: EventKind,
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        node_id: Option<NodeId>,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            execution_id,
            workflow_id,
            node_id,
            payload,
            timestamp: Utc::now(),
        }
    }
}
