mod backoff;
mod error;
mod job;
mod journal;
mod queue;

pub use backoff::backoff_delay;
pub use error::QueueError;
pub use job::JobItem;
pub use journal::Journal;
pub use queue::{JobOutcome, JobQueue, QueueConfig};
