use dagforge_core::{ExecutionId, WorkflowId};
use dagforge_execution::ExecutionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("execution {0} not found")]
    ExecutionNotFound(ExecutionId),

    #[error("failed to persist durable record: {0}")]
    Write(String),

    #[error("failed to replay durable journal: {0}")]
    Replay(String),

    #[error(transparent)]
    Mutation(#[from] ExecutionError),
}
