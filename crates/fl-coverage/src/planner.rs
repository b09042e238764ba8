//! Coverage route planning: policy rollout plus the way back to the depot.

use fl_core::{CoverageConfig, EdgeId, NodeId};
use fl_spatial::{shortest_path, RoadNetwork, SpatialError};

use crate::{
    CoverageError, CoverageGraph, CoveragePolicy, CoverageResult, CoverageState, PolicyEvaluator,
    PolicyTable,
};

/// A planned plow route.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoveragePlan {
    /// `[lat, lng]` points in driving order, starting at the start node.
    pub path:              Vec<[f64; 2]>,
    /// Rollout steps taken (the return leg is not counted).
    pub steps:             u32,
    /// Roads covered by the rollout.
    pub covered_edges:     usize,
    /// Coverable roads in the working graph.
    pub total_edges:       usize,
    /// `false` when the route ends away from the start because no way back
    /// exists.
    pub returned_to_start: bool,
}

impl CoveragePlan {
    /// Covered share of the working graph's roads, `1.0` for a graph with
    /// none.
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_edges == 0 {
            1.0
        } else {
            self.covered_edges as f64 / self.total_edges as f64
        }
    }
}

pub struct CoverageRoutePlanner {
    config: CoverageConfig,
}

impl CoverageRoutePlanner {
    pub fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Plan a coverage route from `start` guided by a pretrained table.
    ///
    /// Without a table nothing is attempted and the result is
    /// [`CoverageError::ModelUnavailable`].
    pub fn plan_coverage(
        &self,
        network: &RoadNetwork,
        start:   NodeId,
        policy:  Option<&PolicyTable>,
    ) -> CoverageResult<CoveragePlan> {
        let table = policy.ok_or(CoverageError::ModelUnavailable { subdivision: None })?;
        let evaluator = PolicyEvaluator::new(table, self.config.frontier_weight);
        self.plan_with(network, start, &evaluator)
    }

    /// Plan a coverage route from `start` with any [`CoveragePolicy`].
    pub fn plan_with(
        &self,
        network: &RoadNetwork,
        start:   NodeId,
        policy:  &dyn CoveragePolicy,
    ) -> CoverageResult<CoveragePlan> {
        if !network.contains_node(start) {
            return Err(CoverageError::NodeNotFound(start));
        }

        let graph = CoverageGraph::new(network);
        let mut state = CoverageState::new(&graph, start, &self.config);
        let mut path = vec![network.node_pos[start.index()].lat_lng()];

        while !state.is_done() {
            let Some(next) = policy.select_action(&graph, &state) else {
                log::debug!("rollout stuck at {} after {} steps", state.current(), state.steps());
                break;
            };
            if !graph.contains_node(next) {
                return Err(CoverageError::NodeNotFound(next));
            }
            state.step(&graph, next);
            path.push(network.node_pos[next.index()].lat_lng());
        }
        log::debug!(
            "rollout finished: {} steps, {}/{} roads covered",
            state.steps(),
            state.covered(),
            graph.edge_count()
        );

        let end = state.current();
        let returned_to_start = if end == start {
            true
        } else {
            let length = |e: EdgeId| network.edge_length_m[e.index()];
            match shortest_path(network, end, start, length) {
                Ok(back) => {
                    path.extend(back.nodes(network).into_iter().skip(1).map(|n| {
                        network.node_pos[n.index()].lat_lng()
                    }));
                    true
                }
                Err(SpatialError::NoRoute { .. }) => {
                    log::warn!("no way back from {end} to start {start}; plan ends away from start");
                    false
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(CoveragePlan {
            path,
            steps: state.steps(),
            covered_edges: state.covered(),
            total_edges: graph.edge_count(),
            returned_to_start,
        })
    }
}

impl Default for CoverageRoutePlanner {
    fn default() -> Self {
        Self::new(CoverageConfig::default())
    }
}
