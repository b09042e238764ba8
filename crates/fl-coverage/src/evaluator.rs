//! The `CoveragePolicy` trait and the table-driven `PolicyEvaluator`.

use fl_core::NodeId;

use crate::{CoverageGraph, CoverageState, PolicyTable};

/// Picks the next node of a coverage rollout.
///
/// Called once per step with a read-only view of the working graph and the
/// rollout's current state.  Returning `None` ends the rollout.
///
/// # Thread safety
///
/// One policy may serve concurrent rollouts, so implementations must be
/// `Send + Sync` and keep no per-rollout state.
///
/// # Example
///
/// ```rust,ignore
/// struct FirstNeighbour;
///
/// impl CoveragePolicy for FirstNeighbour {
///     fn select_action(&self, graph: &CoverageGraph<'_>, state: &CoverageState) -> Option<NodeId> {
///         graph.neighbors(state.current()).first().copied()
///     }
/// }
/// ```
pub trait CoveragePolicy: Send + Sync {
    fn select_action(&self, graph: &CoverageGraph<'_>, state: &CoverageState) -> Option<NodeId>;
}

/// Greedy one-step lookahead over a pretrained value table.
///
/// Each candidate neighbour `a` scores
/// `table[(current, unplowed), a] + frontier_weight × frontier(a)`, where
/// `frontier(a)` counts `a`'s roads still uncovered.  Neighbours in the
/// node tabu queue are skipped unless no other neighbour exists.  The
/// first candidate in neighbour order wins ties.
pub struct PolicyEvaluator<'p> {
    table:           &'p PolicyTable,
    frontier_weight: f64,
}

impl<'p> PolicyEvaluator<'p> {
    pub fn new(table: &'p PolicyTable, frontier_weight: f64) -> Self {
        Self { table, frontier_weight }
    }

    pub fn table(&self) -> &'p PolicyTable {
        self.table
    }

    /// Score of moving to `action` from `state`.
    pub fn score(&self, graph: &CoverageGraph<'_>, state: &CoverageState, action: NodeId) -> f64 {
        let q = self.table.get(
            graph.ext_id(state.current()),
            state.unplowed().trimmed_words(),
            graph.ext_id(action),
        );
        q + self.frontier_weight * state.frontier(graph, action) as f64
    }
}

impl CoveragePolicy for PolicyEvaluator<'_> {
    fn select_action(&self, graph: &CoverageGraph<'_>, state: &CoverageState) -> Option<NodeId> {
        let neighbors = graph.neighbors(state.current());
        let fresh: Vec<NodeId> = neighbors
            .iter()
            .copied()
            .filter(|n| !state.node_tabu().contains(n))
            .collect();
        let candidates: &[NodeId] = if fresh.is_empty() { neighbors } else { &fresh };

        let mut best: Option<NodeId> = None;
        let mut best_score = f64::NEG_INFINITY;
        for &a in candidates {
            let s = self.score(graph, state, a);
            if best.is_none() || s > best_score {
                best = Some(a);
                best_score = s;
            }
        }
        best
    }
}
