//! Routing trait, the Dijkstra primitive, and the risk-aware router.
//!
//! # Cost model
//!
//! Costs are `f64` metres, possibly inflated by the safe-mode penalty:
//!
//! | Mode   | Edge cost                                                   |
//! |--------|-------------------------------------------------------------|
//! | `Fast` | `length_m`                                                  |
//! | `Safe` | `length_m × penalty(risk)`: 1000× danger, 100× warning      |
//!
//! The penalty never removes an edge, so a hazardous road is still used
//! when it is the only connection.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use fl_core::{EdgeId, GeoPoint, NodeId, RiskThresholds};

use crate::network::RoadNetwork;
use crate::report::RouteReport;
use crate::{SpatialError, SpatialResult};

// ── TravelMode ────────────────────────────────────────────────────────────────

/// Edge-weighting mode of a point-to-point query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TravelMode {
    /// Shortest by length.
    #[default]
    Fast,
    /// Shortest by risk-penalised length.
    Safe,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TravelMode::Fast => "fast",
            TravelMode::Safe => "safe",
        })
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(TravelMode::Fast),
            "safe" => Ok(TravelMode::Safe),
            other  => Err(format!("invalid travel mode {other:?}: expected \"fast\" or \"safe\"")),
        }
    }
}

/// Cost of traversing `edge` under `mode`.
#[inline]
pub fn edge_weight(
    network:    &RoadNetwork,
    edge:       EdgeId,
    mode:       TravelMode,
    thresholds: &RiskThresholds,
) -> f64 {
    let length = network.edge_length_m[edge.index()];
    match mode {
        TravelMode::Fast => length,
        TravelMode::Safe => length * thresholds.penalty(network.edge_risk[edge.index()].risk),
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a shortest-path search: the exact edges traversed, in
/// order, and their summed cost under the weight function used.
#[derive(Debug, Clone)]
pub struct Route {
    pub from:  NodeId,
    pub to:    NodeId,
    /// Edges to traverse in order, from source to destination.
    pub edges: Vec<EdgeId>,
    /// Summed edge cost.
    pub cost:  f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Physical length in metres, independent of the weighting used.
    pub fn length_m(&self, network: &RoadNetwork) -> f64 {
        self.edges.iter().map(|e| network.edge_length_m[e.index()]).sum()
    }

    /// Visited nodes, source and destination included.
    pub fn nodes(&self, network: &RoadNetwork) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(self.edges.len() + 1);
        nodes.push(self.from);
        nodes.extend(self.edges.iter().map(|e| network.edge_to[e.index()]));
        nodes
    }
}

// ── Dijkstra primitive ────────────────────────────────────────────────────────

/// Totally ordered `f64` for the heap.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Single-source shortest path from `from` to `to` under `weight`.
///
/// `weight` must return non-negative costs.  Fails with
/// [`SpatialError::NoRoute`] when `to` is unreachable and
/// [`SpatialError::NodeNotFound`] for ids outside the network.
pub fn shortest_path<W>(
    network: &RoadNetwork,
    from:    NodeId,
    to:      NodeId,
    weight:  W,
) -> SpatialResult<Route>
where
    W: Fn(EdgeId) -> f64,
{
    for n in [from, to] {
        if !network.contains_node(n) {
            return Err(SpatialError::NodeNotFound(n));
        }
    }
    if from == to {
        return Ok(Route { from, to, edges: vec![], cost: 0.0 });
    }

    let n = network.node_count();
    // dist[v] = best known cost to reach v.
    let mut dist      = vec![f64::INFINITY; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0.0;

    // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as min-heap.
    // Secondary key NodeId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost + weight(edge);

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(
    network:   &RoadNetwork,
    prev_edge: &[EdgeId],
    from:      NodeId,
    to:        NodeId,
    cost:      f64,
) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    Route { from, to, edges, cost }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable node-to-node routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: one router serves all concurrent
/// requests and holds no per-call state.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to` under `mode`.
    ///
    /// `from == to` yields an empty route, not an error.
    fn route(
        &self,
        network: &RoadNetwork,
        from:    NodeId,
        to:      NodeId,
        mode:    TravelMode,
    ) -> SpatialResult<Route>;
}

/// Plain Dijkstra over [`edge_weight`].
#[derive(Clone, Debug, Default)]
pub struct DijkstraRouter {
    pub thresholds: RiskThresholds,
}

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        from:    NodeId,
        to:      NodeId,
        mode:    TravelMode,
    ) -> SpatialResult<Route> {
        shortest_path(network, from, to, |e| edge_weight(network, e, mode, &self.thresholds))
    }
}

// ── RiskAwareRouter ───────────────────────────────────────────────────────────

/// A coordinate-to-coordinate query for [`RiskAwareRouter::find_paths`].
#[derive(Copy, Clone, Debug)]
pub struct RouteQuery {
    pub start: GeoPoint,
    pub end:   GeoPoint,
    pub mode:  TravelMode,
}

/// Point-to-point navigation: snapping, search, and hazard reporting.
pub struct RiskAwareRouter<R: Router = DijkstraRouter> {
    router:     R,
    thresholds: RiskThresholds,
}

impl RiskAwareRouter<DijkstraRouter> {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { router: DijkstraRouter { thresholds }, thresholds }
    }
}

impl Default for RiskAwareRouter<DijkstraRouter> {
    fn default() -> Self {
        Self::new(RiskThresholds::default())
    }
}

impl<R: Router> RiskAwareRouter<R> {
    /// Use a custom node-to-node router; `thresholds` still drive the report.
    pub fn with_router(router: R, thresholds: RiskThresholds) -> Self {
        Self { router, thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Route between two coordinates.
    ///
    /// Both endpoints are snapped with [`RoadNetwork::snap_endpoint`].  An
    /// unreachable destination is reported as [`SpatialError::NoRoute`].
    pub fn find_path(
        &self,
        network: &RoadNetwork,
        start:   GeoPoint,
        end:     GeoPoint,
        mode:    TravelMode,
    ) -> SpatialResult<RouteReport> {
        let origin      = network.snap_endpoint(start).ok_or(SpatialError::EmptyNetwork)?;
        let destination = network.snap_endpoint(end).ok_or(SpatialError::EmptyNetwork)?;

        let route = self.router.route(network, origin, destination, mode)?;
        log::debug!(
            "{mode} route {origin} -> {destination}: {} edges, cost {:.1}",
            route.edges.len(),
            route.cost
        );
        Ok(RouteReport::from_route(network, &route, &self.thresholds))
    }

    /// Answer a batch of queries, one result per query in input order.
    ///
    /// With the `parallel` feature the batch is spread over Rayon's pool;
    /// each query is still computed single-threaded.
    pub fn find_paths(
        &self,
        network: &RoadNetwork,
        queries: &[RouteQuery],
    ) -> Vec<SpatialResult<RouteReport>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            queries
                .par_iter()
                .map(|q| self.find_path(network, q.start, q.end, q.mode))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            queries
                .iter()
                .map(|q| self.find_path(network, q.start, q.end, q.mode))
                .collect()
        }
    }
}
