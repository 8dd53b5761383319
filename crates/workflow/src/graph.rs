//! `DependencyGraph` — the petgraph-backed view over a [`Workflow`] used to
//! validate acyclicity and to answer predecessor/successor/topological
//! queries the scheduler needs on every readiness scan.

use dagforge_core::NodeId;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::WorkflowError;
use crate::spec::Workflow;

/// A directed graph over a workflow's nodes, built once at creation time.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<NodeId, ()>,
    index_of: IndexMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    /// Build a graph from a workflow, rejecting dangling edges and cycles.
    pub fn from_workflow(workflow: &Workflow) -> Result<Self, WorkflowError> {
        let mut graph = DiGraph::new();
        let mut index_of = IndexMap::new();

        for node in &workflow.nodes {
            if index_of.contains_key(&node.node_id) {
                return Err(WorkflowError::DuplicateNodeId(node.node_id.clone()));
            }
            let idx = graph.add_node(node.node_id.clone());
            index_of.insert(node.node_id.clone(), idx);
        }

        for edge in &workflow.edges {
            let source = *index_of
                .get(&edge.source)
                .ok_or_else(|| WorkflowError::DanglingEdge(edge.source.clone()))?;
            let target = *index_of
                .get(&edge.target)
                .ok_or_else(|| WorkflowError::DanglingEdge(edge.target.clone()))?;
            graph.add_edge(source, target, ());
        }

        let built = Self { graph, index_of };
        built.check_acyclic()?;
        Ok(built)
    }

    fn check_acyclic(&self) -> Result<(), WorkflowError> {
        toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|cycle| WorkflowError::Cycle(self.graph[cycle.node_id()].clone()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.index_of.contains_key(node)
    }

    /// Direct predecessors of `node`, in no particular order.
    pub fn predecessors(&self, node: &NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index_of.get(node) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Direct successors of `node`, in no particular order.
    pub fn successors(&self, node: &NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index_of.get(node) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Nodes with no predecessors — ready as soon as an execution starts.
    pub fn source_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// All node ids, in insertion order.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        self.index_of.keys().cloned().collect()
    }

    /// Every node reachable (transitively) from `node`, not including
    /// `node` itself — used to mark downstream nodes `unreachable` once a
    /// node fails terminally.
    pub fn transitive_successors(&self, node: &NodeId) -> Vec<NodeId> {
        let mut seen = std::collections::HashSet::new();
        let mut stack = self.successors(node);
        let mut out = Vec::new();
        while let Some(n) = stack.pop() {
            if seen.insert(n.clone()) {
                stack.extend(self.successors(&n));
                out.push(n);
            }
        }
        out
    }

    /// Parallel topological levels — nodes in the same level have no edge
    /// between them and may execute concurrently. Used only for the
    /// diagnostic/planning view; the live scheduler drives off per-node
    /// readiness rather than precomputed levels.
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let mut remaining: std::collections::HashSet<NodeIndex> = self.graph.node_indices().collect();
        let mut levels = Vec::new();

        while !remaining.is_empty() {
            let mut level: Vec<NodeIndex> = remaining
                .iter()
                .copied()
                .filter(|&idx| {
                    self.graph
                        .neighbors_directed(idx, Direction::Incoming)
                        .all(|p| !remaining.contains(&p))
                })
                .collect();
            level.sort_by_key(|&idx| self.graph[idx].clone());
            for idx in &level {
                remaining.remove(idx);
            }
            levels.push(level.into_iter().map(|idx| self.graph[idx].clone()).collect());
        }
        levels
    }
}
