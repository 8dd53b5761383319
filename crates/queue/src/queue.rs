//! The at-least-once job queue itself: a time-ordered pending set backed
//! by the durable journal, dispatched to a bounded worker pool.
//!
//! Bounded concurrency is a `Semaphore` permit per in-flight job, mirroring
//! how a worker pool is sized elsewhere in the stack: acquire a permit
//! before dispatch, release it when the job's outcome is recorded.

use std::collections::BinaryHeap;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;
use dagforge_core::{ExecutionId, NodeId};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tracing::{debug, warn};

use crate::backoff::backoff_delay;
use crate::error::QueueError;
use crate::journal::Journal;
use crate::job::JobItem;

/// Outcome a worker reports back after attempting a job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded,
    RetryableFailure,
    TerminalFailure,
}

#[derive(Debug, Clone)]
struct Scheduled(JobItem);

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.0.not_before == other.0.not_before
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest `not_before` sorts first.
        other.0.not_before.cmp(&self.0.not_before)
    }
}

struct Inner {
    pending: BinaryHeap<Scheduled>,
}

/// Configuration governing backpressure and retry behavior.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_concurrency: usize,
    pub max_backlog: usize,
    pub max_attempts: u32,
    pub backoff_base: std::time::Duration,
    pub backoff_max: std::time::Duration,
    pub journal_path: PathBuf,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            max_backlog: 10_000,
            max_attempts: 5,
            backoff_base: std::time::Duration::from_millis(200),
            backoff_max: std::time::Duration::from_secs(30),
            journal_path: PathBuf::from("dagforge-queue.jsonl"),
        }
    }
}

/// A persistent, at-least-once job queue with bounded concurrency.
pub struct JobQueue {
    inner: Mutex<Inner>,
    journal: Mutex<Journal>,
    semaphore: Arc<Semaphore>,
    config: QueueConfig,
    shutting_down: AtomicBool,
    ready_tx: mpsc::UnboundedSender<()>,
    ready_rx: AsyncMutex<mpsc::UnboundedReceiver<()>>,
}

impl JobQueue {
    /// Open (or create) the queue, replaying any unacknowledged work left
    /// behind by a prior process.
    pub fn open(config: QueueConfig) -> Result<Self, QueueError> {
        let recovered = Journal::replay(&config.journal_path)?;
        let journal = Journal::open(&config.journal_path)?;
        let mut pending = BinaryHeap::new();
        for job in recovered {
            debug!(node_id = %job.node_id, attempt = job.attempt, "redelivering job recovered from journal");
            pending.push(Scheduled(job));
        }
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();
        for _ in 0..pending.len() {
            let _ = ready_tx.send(());
        }
        Ok(Self {
            inner: Mutex::new(Inner { pending }),
            journal: Mutex::new(journal),
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
            shutting_down: AtomicBool::new(false),
            ready_tx,
            ready_rx: AsyncMutex::new(ready_rx),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue a brand-new piece of work. Rejected once the backlog limit
    /// is reached or shutdown has begun.
    pub fn enqueue(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        input: dagforge_core::Value,
        predecessor_results: std::collections::HashMap<NodeId, dagforge_core::Value>,
    ) -> Result<(), QueueError> {
        if self.shutting_down.load(AtomicOrdering::SeqCst) {
            return Err(QueueError::ShuttingDown);
        }
        if self.len() >= self.config.max_backlog {
            return Err(QueueError::BacklogExceeded(self.config.max_backlog));
        }
        let job = JobItem::first_attempt(execution_id, node_id, input, predecessor_results, self.config.max_attempts);
        self.push(job)
    }

    fn push(&self, job: JobItem) -> Result<(), QueueError> {
        self.journal.lock().record_enqueue(&job)?;
        self.inner.lock().pending.push(Scheduled(job));
        let _ = self.ready_tx.send(());
        Ok(())
    }

    /// Acquire a concurrency permit and pop the earliest ready job, waiting
    /// for one to become due if the head of the queue is delayed.
    pub async fn acquire(self: &Arc<Self>) -> Option<(tokio::sync::OwnedSemaphorePermit, JobItem)> {
        loop {
            if self.shutting_down.load(AtomicOrdering::SeqCst) && self.is_empty() {
                return None;
            }
            let next_due = {
                let guard = self.inner.lock();
                guard.pending.peek().map(|s| s.0.not_before)
            };
            let Some(due) = next_due else {
                // Nothing pending yet; wait for an enqueue.
                self.ready_rx.lock().await.recv().await?;
                continue;
            };
            let now = Utc::now();
            if due > now {
                let wait = (due - now).to_std().unwrap_or(std::time::Duration::from_millis(10));
                tokio::time::sleep(wait.min(std::time::Duration::from_secs(1))).await;
                continue;
            }
            let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
            let job = {
                let mut guard = self.inner.lock();
                guard.pending.pop().map(|s| s.0)
            };
            match job {
                Some(job) => return Some((permit, job)),
                None => continue,
            }
        }
    }

    /// Record the outcome of a dispatched job: success and terminal
    /// failure both ack the journal entry; a retryable failure
    /// re-enqueues with exponential backoff, or acks as exhausted once
    /// attempts run out.
    pub fn complete(&self, job: JobItem, outcome: JobOutcome) -> Result<(), QueueError> {
        match outcome {
            JobOutcome::Succeeded | JobOutcome::TerminalFailure => {
                self.journal.lock().record_ack(job.execution_id, job.node_id.clone())
            }
            JobOutcome::RetryableFailure => {
                if job.attempts_remaining <= 1 {
                    warn!(node_id = %job.node_id, "retry budget exhausted, giving up");
                    return self.journal.lock().record_ack(job.execution_id, job.node_id.clone());
                }
                let delay = backoff_delay(job.attempt, self.config.backoff_base, self.config.backoff_max);
                let retried = job.retry_after(delay);
                self.push(retried)
            }
        }
    }

    /// Stop accepting new work. Already-pending and in-flight jobs still
    /// drain via `acquire`/`complete`.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, AtomicOrdering::SeqCst);
        let _ = self.ready_tx.send(());
    }
}
