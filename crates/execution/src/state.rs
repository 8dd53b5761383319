use std::collections::{HashMap, HashSet};

use chrono::Utc;
use dagforge_core::{ErrorRecord, ExecutionId, NodeId, Timestamp, Value, WorkflowId};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::status::ExecutionStatus;
use crate::transition::validate_transition;

/// A single run of a workflow. Mutated exclusively through the methods
/// here, which enforce the disjointness of `node_results`/`node_errors`
/// and the `completed ⇔ all nodes resolved` invariant.
///
/// `version` increments on every mutation; the Scheduler uses it purely
/// for diagnostics (detecting a stale in-memory read against the durable
/// copy), not for optimistic-concurrency retries — all mutation already
/// happens under the State Store's per-execution lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub status: ExecutionStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub initial_input: Value,
    pub node_results: HashMap<NodeId, Value>,
    pub node_errors: HashMap<NodeId, ErrorRecord>,
    pub fatal_error: Option<String>,
    pub version: u64,
    /// The complete set of node ids declared by the workflow, fixed at
    /// creation time. Needed to evaluate completeness without a
    /// back-reference to the (immutable, separately-stored) `Workflow`.
    node_universe: HashSet<NodeId>,
    /// Insertion order of `node_results`, preserved separately from the
    /// `HashMap` to keep the topological order of completion.
    result_order: Vec<NodeId>,
}

impl Execution {
    pub fn new(
        id: ExecutionId,
        workflow_id: WorkflowId,
        initial_input: Value,
        node_universe: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            ended_at: None,
            initial_input,
            node_results: HashMap::new(),
            node_errors: HashMap::new(),
            fatal_error: None,
            version: 0,
            node_universe: node_universe.into_iter().collect(),
            result_order: Vec::new(),
        }
    }

    pub fn total_nodes(&self) -> usize {
        self.node_universe.len()
    }

    pub fn is_complete(&self) -> bool {
        self.node_results.len() == self.node_universe.len()
    }

    /// Order in which nodes completed — a topological order of the
    /// executed subgraph, since a node can only complete after every
    /// predecessor already has.
    pub fn result_order(&self) -> &[NodeId] {
        &self.result_order
    }

    /// Record a successful node result. Returns `Ok(false)` without
    /// mutating anything if the execution is already in a terminal state —
    /// a node finishing after `cancel_execution` must not resurrect
    /// `node_results`.
    pub fn record_result(&mut self, node_id: NodeId, value: Value) -> Result<bool, ExecutionError> {
        if self.status.is_terminal() {
            return Ok(false);
        }
        if self.node_errors.contains_key(&node_id) {
            return Err(ExecutionError::AlreadyFailed(node_id));
        }
        if self.node_results.contains_key(&node_id) {
            return Err(ExecutionError::AlreadyResolved(node_id));
        }
        self.result_order.push(node_id.clone());
        self.node_results.insert(node_id, value);
        self.version += 1;
        Ok(true)
    }

    /// Record a terminally-failed node. Same discard-on-terminal-status
    /// behavior as `record_result`.
    pub fn record_error(&mut self, node_id: NodeId, record: ErrorRecord) -> Result<bool, ExecutionError> {
        if self.status.is_terminal() {
            return Ok(false);
        }
        if self.node_results.contains_key(&node_id) {
            return Err(ExecutionError::AlreadyResolved(node_id));
        }
        if self.node_errors.contains_key(&node_id) {
            return Err(ExecutionError::AlreadyFailed(node_id));
        }
        self.node_errors.insert(node_id, record);
        self.version += 1;
        Ok(true)
    }

    /// Move to a new status, validating the transition and stamping
    /// `ended_at` when the new status is terminal.
    pub fn transition_to(&mut self, status: ExecutionStatus) -> Result<(), ExecutionError> {
        validate_transition(self.status, status)?;
        if self.status == status {
            return Ok(());
        }
        self.status = status;
        if status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nid(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn exec(nodes: &[&str]) -> Execution {
        Execution::new(
            ExecutionId::v4(),
            WorkflowId::v4(),
            Value::Null,
            nodes.iter().map(|n| nid(n)),
        )
    }

    #[test]
    fn new_execution_starts_pending_with_no_results() {
        let e = exec(&["A"]);
        assert_eq!(e.status, ExecutionStatus::Pending);
        assert!(e.node_results.is_empty());
        assert_eq!(e.version, 0);
    }

    #[test]
    fn recording_all_results_makes_is_complete_true() {
        let mut e = exec(&["A", "B"]);
        assert!(!e.is_complete());
        e.record_result(nid("A"), Value::from(1)).unwrap();
        assert!(!e.is_complete());
        e.record_result(nid("B"), Value::from(2)).unwrap();
        assert!(e.is_complete());
    }

    #[test]
    fn result_order_reflects_insertion_order() {
        let mut e = exec(&["A", "B", "C"]);
        e.record_result(nid("B"), Value::Null).unwrap();
        e.record_result(nid("A"), Value::Null).unwrap();
        e.record_result(nid("C"), Value::Null).unwrap();
        assert_eq!(e.result_order(), &[nid("B"), nid("A"), nid("C")]);
    }

    #[test]
    fn double_result_for_same_node_is_rejected() {
        let mut e = exec(&["A"]);
        e.record_result(nid("A"), Value::Null).unwrap();
        let err = e.record_result(nid("A"), Value::Null).unwrap_err();
        assert_eq!(err, ExecutionError::AlreadyResolved(nid("A")));
    }

    #[test]
    fn node_cannot_be_both_result_and_error() {
        let mut e = exec(&["A"]);
        e.record_result(nid("A"), Value::Null).unwrap();
        let err = e
            .record_error(nid("A"), ErrorRecord::new("boom", 1))
            .unwrap_err();
        assert_eq!(err, ExecutionError::AlreadyResolved(nid("A")));

        let mut e2 = exec(&["A"]);
        e2.record_error(nid("A"), ErrorRecord::new("boom", 1)).unwrap();
        let err2 = e2.record_result(nid("A"), Value::Null).unwrap_err();
        assert_eq!(err2, ExecutionError::AlreadyFailed(nid("A")));
    }

    #[test]
    fn results_after_cancellation_are_discarded_not_errors() {
        let mut e = exec(&["A"]);
        e.transition_to(ExecutionStatus::Running).unwrap();
        e.transition_to(ExecutionStatus::Cancelled).unwrap();
        let recorded = e.record_result(nid("A"), Value::from(1)).unwrap();
        assert!(!recorded);
        assert!(e.node_results.is_empty());
    }

    #[test]
    fn transition_to_sets_ended_at_on_terminal_state() {
        let mut e = exec(&["A"]);
        assert!(e.ended_at.is_none());
        e.transition_to(ExecutionStatus::Running).unwrap();
        assert!(e.ended_at.is_none());
        e.transition_to(ExecutionStatus::Completed).unwrap();
        assert!(e.ended_at.is_some());
    }

    #[test]
    fn invalid_transition_is_rejected_and_does_not_mutate() {
        let mut e = exec(&["A"]);
        let version_before = e.version;
        let err = e.transition_to(ExecutionStatus::Completed).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidTransition { .. }));
        assert_eq!(e.version, version_before);
        assert_eq!(e.status, ExecutionStatus::Pending);
    }
}
