//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node and indexed by `EdgeId`.  The
//! sort is stable, so a node's outgoing edges keep the order in which they
//! were added; coverage rollouts rely on that order for deterministic
//! tie-breaking.
//!
//! Several physical roads may join the same node pair.  Each directed edge
//! is therefore keyed by `(from, to, key)`, where `key` counts the earlier
//! edges added for the same ordered pair.
//!
//! # Spatial indexes
//!
//! Two R-trees (via `rstar`), both in `[lat, lon]` degree space:
//!
//! - nodes, for nearest-node snapping;
//! - edge polyline pieces, for nearest-edge lookup during endpoint snapping.

use rstar::primitives::{GeomWithData, Line};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use fl_core::{EdgeId, GeoPoint, NodeId, RiskScores, SegmentId};

// ── R-tree entries ────────────────────────────────────────────────────────────

/// Entry stored in the node R-tree: a 2-D `[lat, lon]` point with the
/// associated `NodeId`.
#[derive(Clone)]
pub(crate) struct NodeEntry {
    pub(crate) point: [f64; 2], // [lat, lon]
    pub(crate) id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Sufficient for
    /// nearest-node queries within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// One straight piece of an edge's polyline, tagged with its edge.
type EdgePiece = GeomWithData<Line<[f64; 2]>, EdgeId>;

// ── EdgeAttrs ─────────────────────────────────────────────────────────────────

/// Attributes of a road edge as supplied to the builder.
#[derive(Clone, Debug, Default)]
pub struct EdgeAttrs {
    /// Physical length in metres.  Used directly as the `fast` routing cost.
    pub length_m: f64,
    /// Intermediate shape of the road, endpoints included.  `None` means a
    /// straight line between the two nodes.
    pub geometry: Option<Vec<GeoPoint>>,
    /// Road name aliases; the first one is shown to users.
    pub names: Vec<String>,
    /// External segment ids this edge was built from.  Risk records are
    /// matched through these.
    pub segments: Vec<SegmentId>,
    /// Hazard scores.  Normally filled by [`RoadNetwork::apply_risk`].
    pub risk: RiskScores,
}

impl EdgeAttrs {
    pub fn new(length_m: f64) -> Self {
        Self { length_m, ..Self::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_segment(mut self, segment: SegmentId) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn with_risk(mut self, risk: RiskScores) -> Self {
        self.risk = risk;
        self
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road multigraph in CSR format plus spatial indexes.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].  Once built the network is
/// only read (risk mapping happens before it is shared), so it can be
/// handed to any number of concurrent requests behind an `Arc`.
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// External (OSM) id of each node.  Policy artifacts refer to nodes by
    /// this id, so it must survive subgraph extraction.
    pub node_ext_id: Vec<u64>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Parallel-edge key within the ordered `(from, to)` pair.
    pub edge_key: Vec<u32>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f64>,

    /// Hazard scores of each edge.
    pub edge_risk: Vec<RiskScores>,

    /// Source segment ids of each edge.
    pub edge_segments: Vec<Box<[SegmentId]>>,

    /// Optional polyline of each edge.
    pub edge_geometry: Vec<Option<Box<[GeoPoint]>>>,

    /// Name aliases of each edge.
    pub edge_names: Vec<Box<[String]>>,

    // ── Indexes ───────────────────────────────────────────────────────────
    pub(crate) node_idx: RTree<NodeEntry>,
    edge_idx: RTree<EdgePiece>,
    ext_index: FxHashMap<u64, NodeId>,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Any routing request against an empty network fails with
    /// [`SpatialError::EmptyNetwork`](crate::SpatialError::EmptyNetwork).
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range, no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges, parallels included).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Distinct out-neighbours of `node`, in CSR order.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.out_degree(node));
        for e in self.out_edges(node) {
            let to = self.edge_to[e.index()];
            if !out.contains(&to) {
                out.push(to);
            }
        }
        out
    }

    /// The lowest-key edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from)
            .filter(|e| self.edge_to[e.index()] == to)
            .min_by_key(|e| self.edge_key[e.index()])
    }

    /// Look up a node by its external id.
    pub fn node_by_ext_id(&self, ext_id: u64) -> Option<NodeId> {
        self.ext_index.get(&ext_id).copied()
    }

    // ── Edge attributes ───────────────────────────────────────────────────

    /// Stored geometry of `edge`, if it has one.
    #[inline]
    pub fn edge_geometry(&self, edge: EdgeId) -> Option<&[GeoPoint]> {
        self.edge_geometry[edge.index()].as_deref()
    }

    /// Polyline of `edge`: its geometry, or the two endpoint positions.
    pub fn edge_polyline(&self, edge: EdgeId) -> Vec<GeoPoint> {
        match self.edge_geometry(edge) {
            Some(g) if g.len() >= 2 => g.to_vec(),
            _ => vec![
                self.node_pos[self.edge_from[edge.index()].index()],
                self.node_pos[self.edge_to[edge.index()].index()],
            ],
        }
    }

    /// First name alias of `edge`.
    #[inline]
    pub fn edge_display_name(&self, edge: EdgeId) -> Option<&str> {
        self.edge_names[edge.index()].first().map(String::as_str)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `NodeId` of the nearest road node to `pos`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.node_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }

    /// Return up to `k` nearest nodes to `pos`, sorted by ascending distance.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.node_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// Return the edge whose polyline passes closest to `pos`.
    ///
    /// Returns `None` if the network has no edges.
    pub fn nearest_edge(&self, pos: GeoPoint) -> Option<EdgeId> {
        self.edge_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|piece| piece.data)
    }

    /// Snap a coordinate to a routing endpoint.
    ///
    /// Finds the nearest edge and takes whichever of its two endpoints is
    /// closer in squared-coordinate distance; on a tie the edge's
    /// destination wins.  Falls back to the nearest node when there is no
    /// edge to look up (isolated points).
    pub fn snap_endpoint(&self, pos: GeoPoint) -> Option<NodeId> {
        match self.nearest_edge(pos) {
            Some(edge) => {
                let u = self.edge_from[edge.index()];
                let v = self.edge_to[edge.index()];
                let du = self.node_pos[u.index()].dist2(pos);
                let dv = self.node_pos[v.index()].dist2(pos);
                Some(if du < dv { u } else { v })
            }
            None => self.snap_to_node(pos),
        }
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node, constructs the CSR arrays, and bulk-loads the
/// R-trees.
///
/// # Example
///
/// ```
/// use fl_core::GeoPoint;
/// use fl_spatial::{EdgeAttrs, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(1001, GeoPoint::new(37.566, 126.978));
/// let c = b.add_node(1002, GeoPoint::new(37.570, 126.982));
/// b.add_road(a, c, EdgeAttrs::new(560.0).with_name("Sejong-daero"));
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:      Vec<GeoPoint>,
    ext_ids:    Vec<u64>,
    raw_edges:  Vec<RawEdge>,
    pair_count: FxHashMap<(NodeId, NodeId), u32>,
}

struct RawEdge {
    from:  NodeId,
    to:    NodeId,
    key:   u32,
    attrs: EdgeAttrs,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      Vec::new(),
            ext_ids:    Vec::new(),
            raw_edges:  Vec::new(),
            pair_count: FxHashMap::default(),
        }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:      Vec::with_capacity(nodes),
            ext_ids:    Vec::with_capacity(nodes),
            raw_edges:  Vec::with_capacity(edges),
            pair_count: FxHashMap::default(),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    ///
    /// `ext_id` should be unique; if it repeats, external lookups resolve to
    /// the node added last.
    pub fn add_node(&mut self, ext_id: u64, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.ext_ids.push(ext_id);
        id
    }

    /// Add a **directed** edge from `from` to `to` and return its parallel
    /// key within that ordered pair.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) -> u32 {
        let count = self.pair_count.entry((from, to)).or_insert(0);
        let key = *count;
        *count += 1;
        self.raw_edges.push(RawEdge { from, to, key, attrs });
        key
    }

    /// Convenience: add edges in **both directions** for a two-way road.
    ///
    /// The reverse edge gets the geometry reversed so that each direction's
    /// polyline starts at its own source node.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, attrs: EdgeAttrs) {
        let mut reverse = attrs.clone();
        if let Some(g) = reverse.geometry.as_mut() {
            g.reverse();
        }
        self.add_edge(a, b, attrs);
        self.add_edge(b, a, reverse);
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// loads, where N = nodes, E = edges.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps insertion order among a node's edges.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        // Build CSR row pointer (node_out_start).
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let mut edge_from     = Vec::with_capacity(edge_count);
        let mut edge_to       = Vec::with_capacity(edge_count);
        let mut edge_key      = Vec::with_capacity(edge_count);
        let mut edge_length_m = Vec::with_capacity(edge_count);
        let mut edge_risk     = Vec::with_capacity(edge_count);
        let mut edge_segments = Vec::with_capacity(edge_count);
        let mut edge_geometry = Vec::with_capacity(edge_count);
        let mut edge_names    = Vec::with_capacity(edge_count);
        let mut pieces: Vec<EdgePiece> = Vec::with_capacity(edge_count);

        for (i, e) in raw.into_iter().enumerate() {
            let id = EdgeId(i as u32);
            let attrs = e.attrs;

            let shape: Vec<[f64; 2]> = match attrs.geometry.as_deref() {
                Some(g) if g.len() >= 2 => g.iter().map(|p| [p.lat, p.lon]).collect(),
                _ => {
                    let a = self.nodes[e.from.index()];
                    let b = self.nodes[e.to.index()];
                    vec![[a.lat, a.lon], [b.lat, b.lon]]
                }
            };
            for w in shape.windows(2) {
                pieces.push(GeomWithData::new(Line::new(w[0], w[1]), id));
            }

            edge_from.push(e.from);
            edge_to.push(e.to);
            edge_key.push(e.key);
            edge_length_m.push(attrs.length_m);
            edge_risk.push(attrs.risk);
            edge_segments.push(attrs.segments.into_boxed_slice());
            edge_geometry.push(attrs.geometry.map(Vec::into_boxed_slice));
            edge_names.push(attrs.names.into_boxed_slice());
        }

        // Bulk-load R-trees for O(N log N) construction (faster than N inserts).
        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: [pos.lat, pos.lon],
                id: NodeId(i as u32),
            })
            .collect();
        let node_idx = RTree::bulk_load(entries);
        let edge_idx = RTree::bulk_load(pieces);

        let ext_index = self
            .ext_ids
            .iter()
            .enumerate()
            .map(|(i, &ext)| (ext, NodeId(i as u32)))
            .collect();

        RoadNetwork {
            node_pos: self.nodes,
            node_ext_id: self.ext_ids,
            node_out_start,
            edge_from,
            edge_to,
            edge_key,
            edge_length_m,
            edge_risk,
            edge_segments,
            edge_geometry,
            edge_names,
            node_idx,
            edge_idx,
            ext_index,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
