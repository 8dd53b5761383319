//! Append-only durable backing for the state store: every
//! `put_workflow` and every `patch_execution` outcome is appended here
//! before the in-memory map advances, so a process restart can rebuild
//! identical state by replaying these records in order.

use std::io::Write;
use std::path::{Path, PathBuf};

use dagforge_execution::Execution;
use dagforge_workflow::Workflow;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
enum Record {
    Workflow { workflow: Workflow },
    Execution { execution: Execution },
}

pub struct Journal {
    file: std::fs::File,
}

impl Journal {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.into())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(Self { file })
    }

    fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let mut line = serde_json::to_string(record).map_err(|e| StorageError::Write(e.to_string()))?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        self.file.flush().map_err(|e| StorageError::Write(e.to_string()))
    }

    pub fn record_workflow(&mut self, workflow: &Workflow) -> Result<(), StorageError> {
        self.append(&Record::Workflow { workflow: workflow.clone() })
    }

    pub fn record_execution(&mut self, execution: &Execution) -> Result<(), StorageError> {
        self.append(&Record::Execution { execution: execution.clone() })
    }

    /// Replay every record in the journal in order, returning the latest
    /// version of every workflow and execution seen. Later records for the
    /// same id supersede earlier ones, since both are always journaled in
    /// full rather than as deltas.
    pub fn replay(path: &Path) -> Result<(Vec<Workflow>, Vec<Execution>), StorageError> {
        if !path.exists() {
            return Ok((Vec::new(), Vec::new()));
        }
        let contents = std::fs::read_to_string(path).map_err(|e| StorageError::Replay(e.to_string()))?;
        let mut workflows = indexmap::IndexMap::new();
        let mut executions = indexmap::IndexMap::new();

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line).map_err(|e| StorageError::Replay(e.to_string()))?;
            match record {
                Record::Workflow { workflow } => {
                    workflows.insert(workflow.id, workflow);
                }
                Record::Execution { execution } => {
                    executions.insert(execution.id, execution);
                }
            }
        }
        Ok((workflows.into_values().collect(), executions.into_values().collect()))
    }
}
