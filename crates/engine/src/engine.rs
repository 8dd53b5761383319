//! The engine facade: the one type application code talks to.
//! It wires the registry, state store, job queue, scheduler, and event
//! bus together and exposes the public operations as plain async/sync
//! methods — no component above this layer is reachable directly.

use std::sync::Arc;

use dagforge_core::{ExecutionId, Value, WorkflowId};
use dagforge_eventbus::{EventBus, Filter, Subscription};
use dagforge_execution::Execution;
use dagforge_queue::{JobQueue, QueueConfig};
use dagforge_registry::{NodeFactory, NodeMetadata, NodeRegistry};
use dagforge_scheduler::{Scheduler, SchedulerConfig};
use dagforge_storage::StateStore;
use dagforge_workflow::{Workflow, WorkflowSpec};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;

pub struct Engine {
    registry: Arc<NodeRegistry>,
    store: Arc<StateStore>,
    queue: Arc<JobQueue>,
    events: Arc<EventBus>,
    scheduler: Arc<Scheduler>,
    config: EngineConfig,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let registry = Arc::new(NodeRegistry::new());
        let store = Arc::new(StateStore::open(config.state_journal_path.clone())?);
        let queue = Arc::new(JobQueue::open(QueueConfig {
            max_concurrency: config.max_concurrency,
            max_backlog: config.queue_backlog_limit,
            max_attempts: config.default_retry_attempts,
            backoff_base: config.retry_base_delay(),
            backoff_max: config.retry_max_delay(),
            journal_path: config.queue_journal_path.clone(),
        })?);
        let events = Arc::new(EventBus::new(config.event_bus_capacity));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&events),
            SchedulerConfig { node_timeout: config.node_default_timeout() },
        ));

        Ok(Self {
            registry,
            store,
            queue,
            events,
            scheduler,
            config,
            worker_handle: Mutex::new(None),
        })
    }

    /// Replay durable state and begin pulling jobs. Call once after every
    /// node type the workload needs has been registered.
    pub fn start(&self) -> Result<(), EngineError> {
        self.scheduler.recover()?;
        let scheduler = Arc::clone(&self.scheduler);
        let handle = tokio::spawn(scheduler.run());
        *self.worker_handle.lock() = Some(handle);
        Ok(())
    }

    pub fn register_node(&self, factory: impl NodeFactory, metadata: NodeMetadata) -> Result<(), EngineError> {
        self.registry.register(factory, metadata).map_err(Into::into)
    }

    pub fn create_workflow(&self, spec: WorkflowSpec) -> Result<Workflow, EngineError> {
        let workflow = Workflow::try_from_spec(spec)?;
        self.store.put_workflow(workflow.clone())?;
        Ok(workflow)
    }

    pub fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, EngineError> {
        self.store.get_workflow(id).map_err(Into::into)
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.store.list_workflows()
    }

    pub fn execute_workflow(&self, workflow_id: WorkflowId, initial_input: Value) -> Result<ExecutionId, EngineError> {
        self.scheduler.start_execution(workflow_id, initial_input).map_err(Into::into)
    }

    pub fn get_execution(&self, id: ExecutionId) -> Result<Execution, EngineError> {
        self.store.get_execution(id).map_err(Into::into)
    }

    pub fn list_executions(&self, workflow_id: Option<WorkflowId>) -> Vec<Execution> {
        self.store.list_executions(workflow_id)
    }

    pub fn cancel_execution(&self, id: ExecutionId) -> Result<(), EngineError> {
        self.scheduler.cancel_execution(id).map_err(Into::into)
    }

    pub fn subscribe(&self, filter: Filter) -> Subscription {
        self.events.subscribe(filter)
    }

    /// Unsubscribing is just dropping the handle; this exists so callers
    /// have an explicit verb to pair with `subscribe` at call sites.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Stop accepting new work and wait for in-flight jobs to drain, up to
    /// `shutdown_grace_ms`; force-abort the worker loop past that deadline.
    pub async fn shutdown(&self) {
        self.queue.begin_shutdown();
        let handle = self.worker_handle.lock().take();
        let Some(handle) = handle else {
            return;
        };
        match tokio::time::timeout(self.config.shutdown_grace(), handle).await {
            Ok(Ok(())) => info!("engine shut down cleanly"),
            Ok(Err(join_err)) => warn!(error = %join_err, "worker loop task panicked during shutdown"),
            Err(_elapsed) => warn!("shutdown grace period elapsed with jobs still in flight"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dagforge_core::{EdgeId, NodeId, NodeTypeKey};
    use dagforge_execution::ExecutionStatus;
    use dagforge_registry::{NodeError, NodeInstance};
    use dagforge_workflow::{Edge, NodeSpec};
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct EchoNode;
    #[async_trait]
    impl NodeInstance for EchoNode {
        async fn execute(&self, input: Value, _pred: HashMap<NodeId, Value>) -> Result<Value, NodeError> {
            Ok(input)
        }
    }

    fn nid(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn engine_in(dir: &std::path::Path) -> Engine {
        let config = EngineConfig {
            state_journal_path: dir.join("state.jsonl"),
            queue_journal_path: dir.join("queue.jsonl"),
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        engine
            .register_node(
                |_c: Value| Ok(Arc::new(EchoNode) as Arc<dyn NodeInstance>),
                NodeMetadata::new(NodeTypeKey::new("echo").unwrap(), "Echo"),
            )
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn end_to_end_single_node_workflow_completes() {
        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path());
        engine.start().unwrap();

        let workflow = engine
            .create_workflow(WorkflowSpec {
                name: "single".into(),
                nodes: vec![NodeSpec::new(nid("A"), NodeTypeKey::new("echo").unwrap())],
                edges: Vec::new(),
            })
            .unwrap();

        let execution_id = engine.execute_workflow(workflow.id, Value::from(42)).unwrap();

        let mut execution = engine.get_execution(execution_id).unwrap();
        for _ in 0..50 {
            if execution.status == ExecutionStatus::Completed {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            execution = engine.get_execution(execution_id).unwrap();
        }
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.node_results.get(&nid("A")), Some(&Value::from(42)));

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn chained_workflow_propagates_results_through_fan_out() {
        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path());
        engine.start().unwrap();

        let workflow = engine
            .create_workflow(WorkflowSpec {
                name: "chain".into(),
                nodes: vec![
                    NodeSpec::new(nid("A"), NodeTypeKey::new("echo").unwrap()),
                    NodeSpec::new(nid("B"), NodeTypeKey::new("echo").unwrap()),
                    NodeSpec::new(nid("C"), NodeTypeKey::new("echo").unwrap()),
                ],
                edges: vec![
                    Edge::new(EdgeId::new("A-B").unwrap(), nid("A"), nid("B")),
                    Edge::new(EdgeId::new("A-C").unwrap(), nid("A"), nid("C")),
                ],
            })
            .unwrap();

        let execution_id = engine.execute_workflow(workflow.id, Value::from(1)).unwrap();

        let mut execution = engine.get_execution(execution_id).unwrap();
        for _ in 0..50 {
            if execution.status == ExecutionStatus::Completed {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            execution = engine.get_execution(execution_id).unwrap();
        }
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.node_results.len(), 3);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_workflow_create_with_empty_nodes_is_rejected() {
        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path());
        let err = engine
            .create_workflow(WorkflowSpec { name: "empty".into(), nodes: Vec::new(), edges: Vec::new() })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidWorkflow(_)));
    }
}
