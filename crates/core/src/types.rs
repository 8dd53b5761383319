//! Common value and timestamp types shared by every crate in the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque payload exchanged between nodes. Node configs, inputs, and
/// outputs are all dynamic JSON — the engine never inspects their shape,
/// only routes them.
pub type Value = serde_json::Value;

/// Wall-clock timestamp used on every timestamped record in the system.
pub type Timestamp = DateTime<Utc>;

/// A terminal node failure recorded on an execution once its retries are
/// exhausted (or the error was classified non-retryable on first attempt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub attempts: u32,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>, attempts: u32) -> Self {
        Self {
            message: message.into(),
            attempts,
        }
    }
}
