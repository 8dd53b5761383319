//! Two-layer state store: an in-memory authoritative map,
//! write-through to the durable [`Journal`]. `patch_execution` is the
//! single serialization point for execution mutations — it locks the one
//! execution record, lets the caller mutate it, journals the result, and
//! only then lets the in-memory copy advance.

use std::sync::Arc;

use dagforge_core::{ExecutionId, WorkflowId};
use dagforge_execution::{Execution, ExecutionError};
use dagforge_workflow::Workflow;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::journal::Journal;

pub struct StateStore {
    workflows: DashMap<WorkflowId, Workflow>,
    executions: DashMap<ExecutionId, Arc<Mutex<Execution>>>,
    journal: Mutex<Journal>,
}

impl StateStore {
    pub fn open(journal_path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let path = journal_path.into();
        let (workflows, executions) = Journal::replay(&path)?;
        let journal = Journal::open(&path)?;

        let store = Self {
            workflows: DashMap::new(),
            executions: DashMap::new(),
            journal: Mutex::new(journal),
        };
        for workflow in workflows {
            store.workflows.insert(workflow.id, workflow);
        }
        for execution in executions {
            store.executions.insert(execution.id, Arc::new(Mutex::new(execution)));
        }
        Ok(store)
    }

    pub fn put_workflow(&self, workflow: Workflow) -> Result<(), StorageError> {
        self.journal.lock().record_workflow(&workflow)?;
        self.workflows.insert(workflow.id, workflow);
        Ok(())
    }

    pub fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, StorageError> {
        self.workflows
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::WorkflowNotFound(id))
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn put_execution(&self, execution: Execution) -> Result<(), StorageError> {
        self.journal.lock().record_execution(&execution)?;
        self.executions.insert(execution.id, Arc::new(Mutex::new(execution)));
        Ok(())
    }

    pub fn get_execution(&self, id: ExecutionId) -> Result<Execution, StorageError> {
        self.executions
            .get(&id)
            .map(|entry| entry.value().lock().clone())
            .ok_or(StorageError::ExecutionNotFound(id))
    }

    pub fn list_executions(&self, workflow_id: Option<WorkflowId>) -> Vec<Execution> {
        self.executions
            .iter()
            .map(|entry| entry.value().lock().clone())
            .filter(|execution| workflow_id.is_none_or(|id| execution.workflow_id == id))
            .collect()
    }

    /// Run `mutator` against the current state of one execution under its
    /// per-execution lock, journal the result, and only then let readers
    /// observe it. The mutator sees a fresh read — no caller can race this
    /// with another `patch_execution` on the same id.
    pub fn patch_execution<T>(
        &self,
        id: ExecutionId,
        mutator: impl FnOnce(&mut Execution) -> Result<T, ExecutionError>,
    ) -> Result<T, StorageError> {
        let entry = self
            .executions
            .get(&id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(StorageError::ExecutionNotFound(id))?;
        let mut guard = entry.lock();
        let result = mutator(&mut guard)?;
        self.journal.lock().record_execution(&guard)?;
        Ok(result)
    }
}
