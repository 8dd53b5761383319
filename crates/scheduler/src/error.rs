use dagforge_core::NodeId;
use dagforge_execution::ExecutionError;
use dagforge_queue::QueueError;
use dagforge_registry::RegistryError;
use dagforge_storage::StorageError;
use dagforge_workflow::WorkflowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("node `{0}` declared in the dependency graph has no matching node spec")]
    UnknownNode(NodeId),
}
