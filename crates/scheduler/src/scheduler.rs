//! The per-execution DAG scheduler: readiness detection, input assembly,
//! lifecycle transitions, and termination evaluation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dagforge_core::{ErrorRecord, ExecutionId, NodeId, Value, WorkflowId};
use dagforge_eventbus::{Event, EventBus, EventKind};
use dagforge_execution::ExecutionStatus;
use dagforge_queue::{JobItem, JobOutcome, JobQueue};
use dagforge_registry::NodeRegistry;
use dagforge_storage::StateStore;
use dagforge_workflow::{DependencyGraph, Workflow};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, info, instrument, warn};

use crate::error::SchedulerError;
use crate::runtime::RuntimeState;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub node_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { node_timeout: Duration::from_secs(30) }
    }
}

/// Owns the live coordination state for every execution in flight:
/// cached dependency graphs, per-execution runtime bookkeeping, and the
/// collaborators (registry, store, queue, bus) it drives.
pub struct Scheduler {
    registry: Arc<NodeRegistry>,
    store: Arc<StateStore>,
    queue: Arc<JobQueue>,
    events: Arc<EventBus>,
    graphs: DashMap<WorkflowId, DependencyGraph>,
    runtime: DashMap<ExecutionId, Mutex<RuntimeState>>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        registry: Arc<NodeRegistry>,
        store: Arc<StateStore>,
        queue: Arc<JobQueue>,
        events: Arc<EventBus>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            store,
            queue,
            events,
            graphs: DashMap::new(),
            runtime: DashMap::new(),
            config,
        }
    }

    fn graph_for(&self, workflow: &Workflow) -> Result<DependencyGraph, SchedulerError> {
        if let Some(graph) = self.graphs.get(&workflow.id) {
            return Ok(graph.clone());
        }
        let graph = DependencyGraph::from_workflow(workflow)?;
        self.graphs.insert(workflow.id, graph.clone());
        Ok(graph)
    }

    /// Create a new execution, enqueue its source nodes, and transition it
    /// to `running`. Backs the engine facade's `execute_workflow`.
    #[instrument(skip(self, initial_input), fields(workflow_id = %workflow_id))]
    pub fn start_execution(
        &self,
        workflow_id: WorkflowId,
        initial_input: Value,
    ) -> Result<ExecutionId, SchedulerError> {
        let workflow = self.store.get_workflow(workflow_id)?;
        let graph = self.graph_for(&workflow)?;

        let execution = dagforge_execution::Execution::new(
            ExecutionId::v4(),
            workflow_id,
            initial_input.clone(),
            graph.all_nodes(),
        );
        let execution_id = execution.id;
        self.store.put_execution(execution)?;
        self.runtime.insert(execution_id, Mutex::new(RuntimeState::default()));

        self.store
            .patch_execution(execution_id, |e| e.transition_to(ExecutionStatus::Running))?;
        self.events.publish(Event::new(
            EventKind::WorkflowStarted,
            execution_id,
            workflow_id,
            None,
            Value::Null,
        ));

        let mut sources = graph.source_nodes();
        sources.sort();
        for node_id in sources {
            self.enqueue_node(execution_id, &node_id, initial_input.clone(), HashMap::new())?;
        }
        Ok(execution_id)
    }

    fn enqueue_node(
        &self,
        execution_id: ExecutionId,
        node_id: &NodeId,
        input: Value,
        predecessor_results: HashMap<NodeId, Value>,
    ) -> Result<(), SchedulerError> {
        if let Some(runtime) = self.runtime.get(&execution_id) {
            runtime.lock().mark_in_flight(node_id.clone());
        }
        self.queue.enqueue(execution_id, node_id.clone(), input, predecessor_results)?;
        Ok(())
    }

    /// Assemble a node's input: the raw initial input for source nodes,
    /// otherwise a map keyed by predecessor node id.
    fn assemble_input(
        graph: &DependencyGraph,
        node_id: &NodeId,
        initial_input: &Value,
        node_results: &HashMap<NodeId, Value>,
    ) -> Value {
        let predecessors = graph.predecessors(node_id);
        if predecessors.is_empty() {
            return initial_input.clone();
        }
        let map: serde_json::Map<String, Value> = predecessors
            .into_iter()
            .filter_map(|p| node_results.get(&p).map(|v| (p.as_str().to_string(), v.clone())))
            .collect();
        Value::Object(map)
    }

    /// Run a dispatched job to completion against its node type, then
    /// feed the outcome back through the scheduler.
    #[instrument(skip(self, job), fields(execution_id = %job.execution_id, node_id = %job.node_id))]
    pub async fn execute_job(&self, job: JobItem) {
        let execution_id = job.execution_id;
        let node_id = job.node_id.clone();

        let outcome = self.run_node(&job).await;
        match outcome {
            Ok(value) => {
                if let Err(err) = self.on_node_success(job, value) {
                    error!(%execution_id, %node_id, error = %err, "failed to record node success");
                }
            }
            Err(node_error) => {
                if let Err(err) = self.on_node_failure(job, node_error) {
                    error!(%execution_id, %node_id, error = %err, "failed to record node failure");
                }
            }
        }
    }

    async fn run_node(&self, job: &JobItem) -> Result<Value, dagforge_registry::NodeError> {
        let execution = self
            .store
            .get_execution(job.execution_id)
            .map_err(|e| dagforge_registry::NodeError::terminal(e.to_string()))?;
        let workflow = self
            .store
            .get_workflow(execution.workflow_id)
            .map_err(|e| dagforge_registry::NodeError::terminal(e.to_string()))?;
        let spec = workflow
            .nodes
            .iter()
            .find(|n| n.node_id == job.node_id)
            .ok_or_else(|| dagforge_registry::NodeError::terminal(format!("unknown node `{}`", job.node_id)))?;

        let instance = self
            .registry
            .instantiate(&spec.node_type, spec.config.clone())
            .map_err(|e| dagforge_registry::NodeError::terminal(e.to_string()))?;

        self.events.publish(Event::new(
            EventKind::NodeStarted,
            job.execution_id,
            execution.workflow_id,
            Some(job.node_id.clone()),
            Value::Null,
        ));

        match tokio::time::timeout(
            self.config.node_timeout,
            instance.execute(job.input.clone(), job.predecessor_results.clone()),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(dagforge_registry::NodeError::transient("node execution timed out")),
        }
    }

    fn on_node_success(&self, job: JobItem, value: Value) -> Result<(), SchedulerError> {
        let recorded = self
            .store
            .patch_execution(job.execution_id, |e| e.record_result(job.node_id.clone(), value.clone()))?;
        self.queue.complete(job.clone(), JobOutcome::Succeeded)?;
        if !recorded {
            // Execution was already cancelled; discard without advancing.
            return Ok(());
        }
        if let Some(runtime) = self.runtime.get(&job.execution_id) {
            runtime.lock().clear_in_flight(&job.node_id);
        }
        let execution = self.store.get_execution(job.execution_id)?;
        self.events.publish(Event::new(
            EventKind::NodeCompleted,
            job.execution_id,
            execution.workflow_id,
            Some(job.node_id.clone()),
            value,
        ));
        self.advance(job.execution_id)
    }

    fn on_node_failure(&self, job: JobItem, err: dagforge_registry::NodeError) -> Result<(), SchedulerError> {
        let exhausted = job.attempts_remaining <= 1;
        let execution = self.store.get_execution(job.execution_id)?;

        if err.is_retryable() && !exhausted {
            self.events.publish(Event::new(
                EventKind::NodeFailed,
                job.execution_id,
                execution.workflow_id,
                Some(job.node_id.clone()),
                Value::String(err.message().to_string()),
            ));
            self.queue.complete(job, JobOutcome::RetryableFailure)?;
            return Ok(());
        }

        warn!(execution_id = %job.execution_id, node_id = %job.node_id, "node failed terminally");
        let record = ErrorRecord::new(err.message(), job.attempt);
        let recorded = self
            .store
            .patch_execution(job.execution_id, |e| e.record_error(job.node_id.clone(), record))?;
        self.queue.complete(job.clone(), JobOutcome::TerminalFailure)?;
        if !recorded {
            return Ok(());
        }
        if let Some(runtime) = self.runtime.get(&job.execution_id) {
            let workflow = self.store.get_workflow(execution.workflow_id)?;
            let graph = self.graph_for(&workflow)?;
            let mut guard = runtime.lock();
            guard.clear_in_flight(&job.node_id);
            guard.mark_unreachable(graph.transitive_successors(&job.node_id));
        }
        self.events.publish(Event::new(
            EventKind::NodeError,
            job.execution_id,
            execution.workflow_id,
            Some(job.node_id.clone()),
            Value::String(err.message().to_string()),
        ));
        self.advance(job.execution_id)
    }

    /// Re-evaluate readiness and termination for one execution after a
    /// node transition.
    fn advance(&self, execution_id: ExecutionId) -> Result<(), SchedulerError> {
        let execution = self.store.get_execution(execution_id)?;
        if execution.status.is_terminal() {
            return Ok(());
        }
        let workflow = self.store.get_workflow(execution.workflow_id)?;
        let graph = self.graph_for(&workflow)?;

        let Some(runtime_entry) = self.runtime.get(&execution_id) else {
            return Ok(());
        };

        // Readiness is determined and claimed (mark_in_flight) under the same
        // lock acquisition: two predecessors of a join node can complete
        // concurrently, each in its own spawned task, so releasing the lock
        // between "is it ready" and "mark it in-flight" lets both see the
        // join node as ready and enqueue it twice.
        let mut ready = Vec::new();
        {
            let mut guard = runtime_entry.lock();
            for node_id in graph.all_nodes() {
                if execution.node_results.contains_key(&node_id)
                    || execution.node_errors.contains_key(&node_id)
                    || guard.in_flight.contains(&node_id)
                    || guard.unreachable.contains(&node_id)
                {
                    continue;
                }
                let predecessors = graph.predecessors(&node_id);
                if predecessors.iter().all(|p| execution.node_results.contains_key(p)) {
                    ready.push(node_id);
                }
            }
            ready.sort();
            for node_id in &ready {
                guard.mark_in_flight(node_id.clone());
            }
        }

        for node_id in &ready {
            let input = Self::assemble_input(&graph, node_id, &execution.initial_input, &execution.node_results);
            let predecessor_results: HashMap<NodeId, Value> = graph
                .predecessors(node_id)
                .into_iter()
                .filter_map(|p| execution.node_results.get(&p).map(|v| (p, v.clone())))
                .collect();
            self.queue.enqueue(execution_id, node_id.clone(), input, predecessor_results)?;
        }

        if execution.is_complete() {
            self.store.patch_execution(execution_id, |e| e.transition_to(ExecutionStatus::Completed))?;
            self.events.publish(Event::new(
                EventKind::WorkflowCompleted,
                execution_id,
                execution.workflow_id,
                None,
                Value::Null,
            ));
            info!(%execution_id, "execution completed");
            return Ok(());
        }

        let in_flight_empty = runtime_entry.lock().in_flight.is_empty();
        let stuck = !execution.node_errors.is_empty() || !runtime_entry.lock().unreachable.is_empty();
        if in_flight_empty && ready.is_empty() && stuck {
            self.store.patch_execution(execution_id, |e| e.transition_to(ExecutionStatus::Failed))?;
            self.events.publish(Event::new(
                EventKind::WorkflowFailed,
                execution_id,
                execution.workflow_id,
                None,
                Value::Null,
            ));
            warn!(%execution_id, "execution failed: no ready nodes and at least one permanent failure");
        }
        Ok(())
    }

    /// Mark an execution cancelled. In-flight results observe the
    /// cancelled status and are discarded without mutating state
    /// (`Execution::record_result`/`record_error` return `Ok(false)`).
    pub fn cancel_execution(&self, execution_id: ExecutionId) -> Result<(), SchedulerError> {
        let changed = self
            .store
            .patch_execution(execution_id, |e| {
                let was_terminal = e.status.is_terminal();
                e.transition_to(ExecutionStatus::Cancelled)?;
                Ok(!was_terminal)
            })?;
        if changed {
            let execution = self.store.get_execution(execution_id)?;
            self.events.publish(Event::new(
                EventKind::WorkflowCancelled,
                execution_id,
                execution.workflow_id,
                None,
                Value::Null,
            ));
        }
        Ok(())
    }

    /// Drive the worker loop: pull jobs from the queue as permits and
    /// ready items become available, dispatching each to its own task.
    pub async fn run(self: Arc<Self>) {
        while let Some((permit, job)) = self.queue.acquire().await {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                scheduler.execute_job(job).await;
                drop(permit);
            });
        }
    }

    /// Replay recovery: for every non-terminal
    /// execution, reconstruct runtime bookkeeping from durable state and
    /// re-enqueue any node whose predecessors are complete but which has
    /// no recorded outcome.
    pub fn recover(&self) -> Result<(), SchedulerError> {
        for execution in self.store.list_executions(None) {
            if execution.status.is_terminal() {
                continue;
            }
            self.runtime.entry(execution.id).or_insert_with(|| Mutex::new(RuntimeState::default()));
            self.advance(execution.id)?;
        }
        Ok(())
    }
}
