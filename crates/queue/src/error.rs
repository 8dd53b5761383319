use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backlog limit exceeded ({0} items pending)")]
    BacklogExceeded(usize),

    #[error("failed to persist job to durable journal: {0}")]
    JournalWrite(String),

    #[error("failed to replay durable journal: {0}")]
    JournalReplay(String),

    #[error("queue is shutting down, no new work accepted")]
    ShuttingDown,
}
