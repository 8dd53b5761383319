//! # Dagforge Core
//!
//! Identifiers and the handful of plain-old-data types shared by every
//! other crate in the workspace: workflow/execution/node identifiers and
//! the dynamic `Value` payload type. Validation errors live in the
//! crates that own the thing being validated (`dagforge-workflow`'s
//! `WorkflowError`, `dagforge-execution`'s `ExecutionError`, ...), so
//! this crate carries no error type of its own.

pub mod id;
pub mod types;

pub use id::{EdgeId, ExecutionId, KeyParseError, NodeId, NodeTypeKey, SubscriberId, UuidParseError, WorkflowId};
pub use types::{ErrorRecord, Timestamp, Value};
