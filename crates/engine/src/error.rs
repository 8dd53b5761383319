use dagforge_queue::QueueError;
use dagforge_registry::RegistryError;
use dagforge_scheduler::SchedulerError;
use dagforge_storage::StorageError;
use dagforge_workflow::WorkflowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidWorkflow(#[from] WorkflowError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
