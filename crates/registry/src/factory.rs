use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dagforge_core::{NodeId, Value};
use thiserror::Error;

/// Error a node instance raises from `execute`. The scheduler consults
/// `is_retryable()` to decide whether to re-enqueue with backoff or record
/// the failure in `node_errors` immediately.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    /// Transient failure — e.g. upstream 5xx, connection reset. The
    /// scheduler will retry with backoff until attempts are exhausted.
    #[error("transient: {message}")]
    Transient {
        message: String,
        backoff_hint: Option<Duration>,
    },

    /// Permanent failure — e.g. 4xx, a syntax error in a script. Never
    /// retried; recorded in `node_errors` on first occurrence.
    #[error("terminal: {message}")]
    Terminal { message: String },
}

impl NodeError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            backoff_hint: None,
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transient { message, .. } | Self::Terminal { message } => message,
        }
    }
}

/// A live, configured node ready to execute. Produced by
/// [`NodeFactory::instantiate`].
#[async_trait]
pub trait NodeInstance: Send + Sync + std::fmt::Debug + 'static {
    /// Run the node to completion (or failure). `input` follows the
    /// scheduler's input-assembly rule: `initial_input` for source nodes,
    /// otherwise `{predecessor_node_id: result}`. `predecessor_results`
    /// carries the same map again for nodes that need to distinguish "my
    /// assembled input" from "the raw upstream results" (they are
    /// identical except for source nodes, where `predecessor_results` is
    /// empty).
    async fn execute(
        &self,
        input: Value,
        predecessor_results: HashMap<NodeId, Value>,
    ) -> Result<Value, NodeError>;
}

/// A node type's constructor: validates `config` and produces a
/// [`NodeInstance`]. Implemented once per node type and registered under a
/// type tag via [`crate::NodeRegistry::register`].
pub trait NodeFactory: Send + Sync + 'static {
    fn instantiate(&self, config: Value) -> Result<std::sync::Arc<dyn NodeInstance>, String>;
}

/// Adapts a plain closure into a [`NodeFactory`], for node types that don't
/// need a dedicated struct.
impl<F> NodeFactory for F
where
    F: Fn(Value) -> Result<std::sync::Arc<dyn NodeInstance>, String> + Send + Sync + 'static,
{
    fn instantiate(&self, config: Value) -> Result<std::sync::Arc<dyn NodeInstance>, String> {
        self(config)
    }
}
