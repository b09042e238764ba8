//! Undirected edge index over a road network.
//!
//! A plow covers a street by driving it in either direction, so coverage
//! tracks unordered node pairs: the two directions of a two-way road, and
//! any parallel roads between the same pair, share one bit.  Bits are
//! assigned in first-seen `EdgeId` order, which makes the index (and hence
//! policy state encodings) a pure function of the network.

use rustc_hash::FxHashMap;

use fl_core::NodeId;
use fl_spatial::RoadNetwork;

/// Unordered node pair, smaller id first.
#[inline]
pub fn pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Read-only view of a network prepared for coverage rollouts.
pub struct CoverageGraph<'a> {
    network:    &'a RoadNetwork,
    pair_index: FxHashMap<(NodeId, NodeId), u32>,
    pairs:      Vec<(NodeId, NodeId)>,
    /// Distinct out-neighbours per node, CSR order.
    neighbors:  Vec<Vec<NodeId>>,
    /// Bits of the pairs joining each node to its out-neighbours.
    incident:   Vec<Vec<u32>>,
}

impl<'a> CoverageGraph<'a> {
    pub fn new(network: &'a RoadNetwork) -> Self {
        let mut pair_index = FxHashMap::default();
        let mut pairs = Vec::new();
        for i in 0..network.edge_count() {
            let p = pair(network.edge_from[i], network.edge_to[i]);
            pair_index.entry(p).or_insert_with(|| {
                pairs.push(p);
                (pairs.len() - 1) as u32
            });
        }

        let mut neighbors = Vec::with_capacity(network.node_count());
        let mut incident  = Vec::with_capacity(network.node_count());
        for n in 0..network.node_count() {
            let node = NodeId(n as u32);
            let nbs = network.neighbors(node);
            incident.push(
                nbs.iter()
                    .filter_map(|&nb| pair_index.get(&pair(node, nb)).copied())
                    .collect(),
            );
            neighbors.push(nbs);
        }

        Self { network, pair_index, pairs, neighbors, incident }
    }

    pub fn network(&self) -> &'a RoadNetwork {
        self.network
    }

    /// Number of coverable edges (bits in a rollout's bitset).
    pub fn edge_count(&self) -> usize {
        self.pairs.len()
    }

    /// Bit index of the road joining `a` and `b`, in either direction.
    #[inline]
    pub fn bit_of(&self, a: NodeId, b: NodeId) -> Option<u32> {
        self.pair_index.get(&pair(a, b)).copied()
    }

    /// Endpoints of the road at bit `bit`.
    pub fn pair_at(&self, bit: u32) -> Option<(NodeId, NodeId)> {
        self.pairs.get(bit as usize).copied()
    }

    #[inline]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.neighbors.get(node.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn incident_bits(&self, node: NodeId) -> &[u32] {
        self.incident.get(node.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.network.contains_node(node)
    }

    /// External id of `node`, the key policy artifacts use.
    #[inline]
    pub fn ext_id(&self, node: NodeId) -> u64 {
        self.network.node_ext_id[node.index()]
    }
}
