use std::collections::HashMap;

use chrono::Utc;
use dagforge_core::{ExecutionId, NodeId, Timestamp, Value};
use serde::{Deserialize, Serialize};

/// A unit of queued work: run one node of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobItem {
    pub execution_id: ExecutionId,
    pub node_id: NodeId,
    pub input: Value,
    pub predecessor_results: HashMap<NodeId, Value>,
    /// 1-indexed attempt number this delivery represents.
    pub attempt: u32,
    pub attempts_remaining: u32,
    pub enqueued_at: Timestamp,
    /// Earliest time this item may be dequeued — implements the backoff
    /// delay after a retryable failure.
    pub not_before: Timestamp,
}

impl JobItem {
    pub fn first_attempt(
        execution_id: ExecutionId,
        node_id: NodeId,
        input: Value,
        predecessor_results: HashMap<NodeId, Value>,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            execution_id,
            node_id,
            input,
            predecessor_results,
            attempt: 1,
            attempts_remaining: max_attempts,
            enqueued_at: now,
            not_before: now,
        }
    }

    /// Build the follow-up item after a retryable failure: attempt count
    /// up, one fewer attempt remaining, delayed by `delay`.
    pub fn retry_after(&self, delay: std::time::Duration) -> Self {
        let now = Utc::now();
        Self {
            execution_id: self.execution_id,
            node_id: self.node_id.clone(),
            input: self.input.clone(),
            predecessor_results: self.predecessor_results.clone(),
            attempt: self.attempt + 1,
            attempts_remaining: self.attempts_remaining - 1,
            enqueued_at: now,
            not_before: now + chrono::Duration::from_std(delay).unwrap_or_default(),
        }
    }

    pub fn is_ready(&self, now: Timestamp) -> bool {
        self.not_before <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_ready_immediately() {
        let job = JobItem::first_attempt(
            ExecutionId::v4(),
            NodeId::new("A").unwrap(),
            Value::Null,
            HashMap::new(),
            3,
        );
        assert_eq!(job.attempt, 1);
        assert_eq!(job.attempts_remaining, 3);
        assert!(job.is_ready(Utc::now()));
    }

    #[test]
    fn retry_after_increments_attempt_and_decrements_remaining() {
        let job = JobItem::first_attempt(
            ExecutionId::v4(),
            NodeId::new("A").unwrap(),
            Value::Null,
            HashMap::new(),
            3,
        );
        let retried = job.retry_after(std::time::Duration::from_millis(50));
        assert_eq!(retried.attempt, 2);
        assert_eq!(retried.attempts_remaining, 2);
        assert!(retried.not_before > job.enqueued_at);
    }

    #[test]
    fn delayed_job_is_not_ready_before_its_delay_elapses() {
        let job = JobItem::first_attempt(
            ExecutionId::v4(),
            NodeId::new("A").unwrap(),
            Value::Null,
            HashMap::new(),
            3,
        )
        .retry_after(std::time::Duration::from_secs(3600));
        assert!(!job.is_ready(Utc::now()));
    }
}
