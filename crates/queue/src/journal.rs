//! Durable append-only journal backing the queue's crash-safety guarantee:
//! items in flight at process death must be redelivered on restart. Every
//! enqueue is appended before the item is handed to a
//! worker; every terminal outcome (success or non-retryable failure)
//! appends a tombstone. Replaying the journal at startup yields exactly
//! the set of items with an enqueue record but no matching tombstone.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use dagforge_core::{ExecutionId, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::job::JobItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
enum Record {
    Enqueue { job: JobItem },
    Ack { execution_id: ExecutionId, node_id: NodeId },
}

/// An append-only JSON-lines file plus the in-memory index of records
/// replayed from it.
pub struct Journal {
    path: PathBuf,
    file: std::fs::File,
}

impl Journal {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let path = path.into();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| QueueError::JournalWrite(e.to_string()))?;
        Ok(Self { path, file })
    }

    fn append(&mut self, record: &Record) -> Result<(), QueueError> {
        let mut line = serde_json::to_string(record).map_err(|e| QueueError::JournalWrite(e.to_string()))?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .map_err(|e| QueueError::JournalWrite(e.to_string()))?;
        self.file.flush().map_err(|e| QueueError::JournalWrite(e.to_string()))
    }

    pub fn record_enqueue(&mut self, job: &JobItem) -> Result<(), QueueError> {
        self.append(&Record::Enqueue { job: job.clone() })
    }

    pub fn record_ack(&mut self, execution_id: ExecutionId, node_id: NodeId) -> Result<(), QueueError> {
        self.append(&Record::Ack { execution_id, node_id })
    }

    /// Replay the journal, returning every job whose most recent enqueue
    /// has no subsequent ack — the work a restarted process must
    /// redeliver. Superseded enqueues for the same `(execution_id,
    /// node_id)` (a retry re-enqueue) are collapsed to the latest one.
    pub fn replay(path: &Path) -> Result<Vec<JobItem>, QueueError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| QueueError::JournalReplay(e.to_string()))?;
        let mut pending: HashMap<(ExecutionId, NodeId), JobItem> = HashMap::new();

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(line).map_err(|e| QueueError::JournalReplay(e.to_string()))?;
            match record {
                Record::Enqueue { job } => {
                    pending.insert((job.execution_id, job.node_id.clone()), job);
                }
                Record::Ack { execution_id, node_id } => {
                    pending.remove(&(execution_id, node_id));
                }
            }
        }
        Ok(pending.into_values().collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
