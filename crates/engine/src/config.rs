use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one engine instance. A `dagforge-config`-layered loader produces
/// one of these from compiled-in defaults, an optional TOML file, and
/// `DAGFORGE_*` environment overrides; the engine itself only consumes
/// the already-validated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_concurrency: usize,
    pub default_retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub node_default_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
    pub queue_backlog_limit: usize,
    pub event_bus_capacity: usize,
    pub state_journal_path: PathBuf,
    pub queue_journal_path: PathBuf,
}

impl EngineConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn node_default_timeout(&self) -> Duration {
        Duration::from_millis(self.node_default_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            default_retry_attempts: 5,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 30_000,
            node_default_timeout_ms: 30_000,
            shutdown_grace_ms: 10_000,
            queue_backlog_limit: 10_000,
            event_bus_capacity: 1024,
            state_journal_path: PathBuf::from("dagforge-state.jsonl"),
            queue_journal_path: PathBuf::from("dagforge-queue.jsonl"),
        }
    }
}
