use std::collections::HashSet;

use dagforge_core::NodeId;

/// Ephemeral, scheduler-only bookkeeping for one execution. Deliberately
/// not part of the persisted `Execution` record: `in_flight` and
/// `unreachable` are reconstructed at recovery by diffing the durable
/// `node_results`/`node_errors` against the workflow graph, not read
/// back from storage.
#[derive(Debug, Default)]
pub struct RuntimeState {
    /// Nodes in the `enqueued` or `running` states.
    pub in_flight: HashSet<NodeId>,
    /// Nodes whose predecessors can never all complete because an
    /// ancestor failed terminally.
    pub unreachable: HashSet<NodeId>,
}

impl RuntimeState {
    pub fn mark_in_flight(&mut self, node: NodeId) {
        self.in_flight.insert(node);
    }

    pub fn clear_in_flight(&mut self, node: &NodeId) {
        self.in_flight.remove(node);
    }

    pub fn mark_unreachable(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.unreachable.extend(nodes);
    }
}
