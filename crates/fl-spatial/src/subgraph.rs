//! Radius-bounded working subgraphs.
//!
//! Coverage rollouts run on the streets around a depot, not on the whole
//! city.  [`RoadNetwork::subgraph_within`] cuts out the induced subgraph on
//! every node within a great-circle radius of a centre point.

use fl_core::{GeoPoint, NodeId, EARTH_RADIUS_M};

use crate::network::{EdgeAttrs, RoadNetwork, RoadNetworkBuilder};

/// Slack on the R-tree search radius.  Longitude spans grow with latitude
/// across the search window, so the centre's cosine alone is slightly short.
const SEARCH_PAD: f64 = 1.01;

impl RoadNetwork {
    /// Extract the induced subgraph on all nodes within `radius_m` metres of
    /// `center`.
    ///
    /// Nodes keep their relative order, external ids, and positions; edges
    /// keep their order, parallel keys, and all attributes including risk.
    /// The result is densely re-indexed, so `NodeId`s differ from `self`'s;
    /// use [`node_by_ext_id`](Self::node_by_ext_id) to translate.
    pub fn subgraph_within(&self, center: GeoPoint, radius_m: f64) -> RoadNetwork {
        // Degree radius wide enough for longitude at this latitude, on the
        // same sphere as `distance_m`; the R-tree hit list is then filtered
        // with the exact haversine test.
        let cos_lat = center.lat.to_radians().cos().abs().max(0.01);
        let deg = (radius_m / EARTH_RADIUS_M).to_degrees() / cos_lat * SEARCH_PAD;

        let mut keep: Vec<NodeId> = self
            .node_idx
            .locate_within_distance([center.lat, center.lon], deg * deg)
            .filter(|e| self.node_pos[e.id.index()].distance_m(center) <= radius_m)
            .map(|e| e.id)
            .collect();
        keep.sort_unstable();

        let mut remap = vec![NodeId::INVALID; self.node_count()];
        let mut b = RoadNetworkBuilder::with_capacity(keep.len(), keep.len() * 2);
        for &old in &keep {
            remap[old.index()] = b.add_node(self.node_ext_id[old.index()], self.node_pos[old.index()]);
        }

        for i in 0..self.edge_count() {
            let from = remap[self.edge_from[i].index()];
            let to   = remap[self.edge_to[i].index()];
            if from == NodeId::INVALID || to == NodeId::INVALID {
                continue;
            }
            let attrs = EdgeAttrs {
                length_m: self.edge_length_m[i],
                geometry: self.edge_geometry[i].as_ref().map(|g| g.to_vec()),
                names:    self.edge_names[i].to_vec(),
                segments: self.edge_segments[i].to_vec(),
                risk:     self.edge_risk[i],
            };
            b.add_edge(from, to, attrs);
        }

        b.build()
    }
}
