//! Route geometry, aggregate risk statistics, and hazard flags.
//!
//! Serialized shape (with the `serde` feature):
//!
//! ```json
//! {
//!   "path": [[37.56, 126.97], ...],
//!   "stats": {
//!     "average": 42.5, "max": 85.0, "risk_level": "Danger", "danger_count": 1,
//!     "env_details": {"avg_slope": 3.1, "max_slope": 9.0, "avg_freeze": 40.0,
//!                     "avg_accident": 5.0, "avg_population": 12.0, "avg_raw": 60.2}
//!   },
//!   "danger_segments": [{"lat": 37.56, "lng": 126.97, "score": 85.0, "road_name": "..."}]
//! }
//! ```

use fl_core::{EdgeId, RiskLevel, RiskScores, RiskThresholds};

use crate::network::RoadNetwork;
use crate::router::Route;

/// Display name for edges without any name alias.
pub const UNKNOWN_ROAD: &str = "unknown road";

/// Round to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ── DangerSegment ─────────────────────────────────────────────────────────────

/// A traversed edge whose risk reached the reporting threshold.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DangerSegment {
    /// Start-node latitude.
    pub lat:       f64,
    /// Start-node longitude.
    pub lng:       f64,
    pub score:     f64,
    pub road_name: String,
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Environmental sub-score summary.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvDetails {
    pub avg_slope:      f64,
    pub max_slope:      f64,
    pub avg_freeze:     f64,
    pub avg_accident:   f64,
    pub avg_population: f64,
    pub avg_raw:        f64,
}

/// Aggregate risk statistics of a route.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStats {
    /// Mean composite risk, one decimal.
    pub average:      f64,
    /// Maximum composite risk, one decimal.
    pub max:          f64,
    pub risk_level:   RiskLevel,
    pub danger_count: usize,
    pub env_details:  EnvDetails,

    /// Unrounded per-category means.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub mean_scores:  RiskScores,
    /// Unrounded per-category maxima.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub max_scores:   RiskScores,
}

impl RouteStats {
    /// Aggregate over the traversed edges.  No edges → all-zero, `Safe`.
    pub fn from_edges(
        network:      &RoadNetwork,
        edges:        &[EdgeId],
        danger_count: usize,
        thresholds:   &RiskThresholds,
    ) -> Self {
        if edges.is_empty() {
            return RouteStats::default();
        }

        let mut sum  = RiskScores::ZERO;
        let mut peak = RiskScores::ZERO;
        for e in edges {
            let r = network.edge_risk[e.index()];
            sum  = sum.add(r);
            peak = peak.max_with(r);
        }
        let mean = sum.div(edges.len());

        RouteStats {
            average:      round1(mean.risk),
            max:          round1(peak.risk),
            risk_level:   thresholds.level(peak.risk),
            danger_count,
            env_details:  EnvDetails {
                avg_slope:      round1(mean.slope),
                max_slope:      round1(peak.slope),
                avg_freeze:     round1(mean.freeze),
                avg_accident:   round1(mean.accident),
                avg_population: round1(mean.population),
                avg_raw:        round1(mean.raw),
            },
            mean_scores:  mean,
            max_scores:   peak,
        }
    }
}

// ── RouteReport ───────────────────────────────────────────────────────────────

/// Everything returned for a successful point-to-point query.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteReport {
    /// `[lat, lng]` points in travel order.
    pub path:            Vec<[f64; 2]>,
    pub stats:           RouteStats,
    pub danger_segments: Vec<DangerSegment>,

    /// Traversed edges, in order.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub edges:           Vec<EdgeId>,
    /// Search cost under the mode's weighting.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cost:            f64,
}

impl RouteReport {
    /// Build geometry, statistics, and hazard flags for `route`.
    ///
    /// Each edge contributes its stored geometry (or just its start node
    /// when it has none); the destination node closes the path.
    pub fn from_route(network: &RoadNetwork, route: &Route, thresholds: &RiskThresholds) -> Self {
        let mut path = Vec::with_capacity(route.edges.len() * 2 + 1);
        let mut danger_segments = Vec::new();

        for &e in &route.edges {
            let start = network.node_pos[network.edge_from[e.index()].index()];
            match network.edge_geometry(e) {
                Some(g) => path.extend(g.iter().map(|p| p.lat_lng())),
                None => path.push(start.lat_lng()),
            }

            let risk = network.edge_risk[e.index()].risk;
            if thresholds.is_flagged(risk) {
                danger_segments.push(DangerSegment {
                    lat:       start.lat,
                    lng:       start.lon,
                    score:     risk,
                    road_name: network.edge_display_name(e).unwrap_or(UNKNOWN_ROAD).to_owned(),
                });
            }
        }
        path.push(network.node_pos[route.to.index()].lat_lng());

        let stats = RouteStats::from_edges(network, &route.edges, danger_segments.len(), thresholds);

        RouteReport {
            path,
            stats,
            danger_segments,
            edges: route.edges.clone(),
            cost:  route.cost,
        }
    }
}
