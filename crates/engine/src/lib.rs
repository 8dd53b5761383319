mod config;
mod engine;
mod error;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;

pub use dagforge_eventbus::{Event, EventKind, Filter, Subscription};
pub use dagforge_execution::{Execution, ExecutionStatus};
pub use dagforge_registry::{NodeError, NodeFactory, NodeInstance, NodeMetadata};
pub use dagforge_workflow::{Edge, NodeSpec, Workflow, WorkflowSpec};
