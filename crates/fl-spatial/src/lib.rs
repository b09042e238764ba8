//! `fl-spatial` — road network, risk mapping, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`network`]  | `RoadNetwork` (CSR + R-trees), `RoadNetworkBuilder`, `EdgeAttrs` |
//! | [`subgraph`] | `RoadNetwork::subgraph_within` (radius-bounded working graph) |
//! | [`risk`]     | `RiskRecord`, `RiskTable`, CSV loaders, `RoadNetwork::apply_risk` |
//! | [`router`]   | `TravelMode`, `shortest_path`, `Router` trait, `DijkstraRouter`, `RiskAwareRouter` |
//! | [`report`]   | `RouteReport`, `RouteStats`, `EnvDetails`, `DangerSegment`   |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `serde`    | Derives `Serialize`/`Deserialize` on public types.        |
//! | `parallel` | `RiskAwareRouter::find_paths` runs on Rayon.              |

pub mod error;
pub mod network;
pub mod report;
pub mod risk;
pub mod router;
pub mod subgraph;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use network::{EdgeAttrs, RoadNetwork, RoadNetworkBuilder};
pub use report::{DangerSegment, EnvDetails, RouteReport, RouteStats, UNKNOWN_ROAD};
pub use risk::{load_risk_csv, load_risk_or_empty, load_risk_reader, RiskRecord, RiskTable};
pub use router::{
    edge_weight, shortest_path, DijkstraRouter, RiskAwareRouter, Route, RouteQuery, Router,
    TravelMode,
};
