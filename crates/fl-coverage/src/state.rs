//! Snapshot of an in-progress coverage rollout.
//!
//! # State machine
//!
//! ```text
//!   Active ──step──▶ Active
//!     │
//!     └──step──▶ Done   (no uncovered edges left, or step budget spent)
//! ```
//!
//! Uncovered bits only ever clear.  A `CoverageState` belongs to one
//! rollout and is never shared between requests.

use fl_core::{CoverageConfig, NodeId};

use crate::graph::{pair, CoverageGraph};
use crate::{EdgeBitset, TabuQueue};

/// Rollout phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Active,
    Done,
}

#[derive(Clone, Debug)]
pub struct CoverageState {
    start:      NodeId,
    current:    NodeId,
    previous:   Option<NodeId>,
    unplowed:   EdgeBitset,
    node_tabu:  TabuQueue<NodeId>,
    edge_tabu:  TabuQueue<(NodeId, NodeId)>,
    steps:      u32,
    step_limit: u32,
}

impl CoverageState {
    /// Fresh rollout at `start`: every edge uncovered, `start` already in
    /// the node tabu queue.
    pub fn new(graph: &CoverageGraph<'_>, start: NodeId, config: &CoverageConfig) -> Self {
        let mut node_tabu = TabuQueue::new(config.node_tabu_capacity);
        node_tabu.push(start);
        Self {
            start,
            current:    start,
            previous:   None,
            unplowed:   EdgeBitset::full(graph.edge_count()),
            node_tabu,
            edge_tabu:  TabuQueue::new(config.edge_tabu_capacity),
            steps:      0,
            step_limit: config.step_limit,
        }
    }

    /// Move to `next`.
    ///
    /// Clears the bit of the road between the current node and `next` if
    /// one is indexed (already-clear bits stay clear).  Position, tabu
    /// queues and the step counter advance either way.
    pub fn step(&mut self, graph: &CoverageGraph<'_>, next: NodeId) -> Phase {
        if let Some(bit) = graph.bit_of(self.current, next) {
            self.unplowed.clear(bit as usize);
        }

        self.previous = Some(self.current);
        self.edge_tabu.push(pair(self.current, next));
        self.current = next;
        self.node_tabu.push(next);
        self.steps += 1;

        self.phase()
    }

    pub fn phase(&self) -> Phase {
        if self.unplowed.none() || self.steps >= self.step_limit {
            Phase::Done
        } else {
            Phase::Active
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.phase() == Phase::Done
    }

    /// Number of `node`'s incident roads still uncovered.
    pub fn frontier(&self, graph: &CoverageGraph<'_>, node: NodeId) -> usize {
        graph
            .incident_bits(node)
            .iter()
            .filter(|&&bit| self.unplowed.get(bit as usize))
            .count()
    }

    pub fn start(&self) -> NodeId { self.start }
    pub fn current(&self) -> NodeId { self.current }
    pub fn previous(&self) -> Option<NodeId> { self.previous }
    pub fn unplowed(&self) -> &EdgeBitset { &self.unplowed }
    pub fn node_tabu(&self) -> &TabuQueue<NodeId> { &self.node_tabu }
    pub fn edge_tabu(&self) -> &TabuQueue<(NodeId, NodeId)> { &self.edge_tabu }
    pub fn steps(&self) -> u32 { self.steps }
    pub fn step_limit(&self) -> u32 { self.step_limit }

    /// Roads covered so far.
    pub fn covered(&self) -> usize {
        self.unplowed.len() - self.unplowed.count_ones()
    }
}
