//! Unit tests for fl-spatial.
//!
//! All tests use hand-crafted networks so they run without any map data.

#[cfg(test)]
mod helpers {
    use fl_core::{GeoPoint, NodeId, RiskScores};
    use crate::{EdgeAttrs, RoadNetwork, RoadNetworkBuilder};

    pub fn risk(r: f64) -> RiskScores {
        RiskScores { risk: r, ..RiskScores::ZERO }
    }

    /// Build a small grid network for testing.
    ///
    /// Nodes (lat, lon):
    ///   0:(0,0)  1:(0,1)  2:(0,2)
    ///   3:(1,0)           4:(1,2)
    ///
    /// Undirected roads (length m):
    ///   0-1 100, 1-2 100, 2-4 100   (short northern detour, icy 1-2 = 85)
    ///   0-3 250, 3-4 100            (longer but clean)
    ///
    /// Fast 0→4: 0→1→2→4 = 300.  Safe 0→4: 0→3→4 = 350 beats 300 + 100×999.
    pub fn grid_network() -> (RoadNetwork, [NodeId; 5]) {
        let mut b = RoadNetworkBuilder::new();

        let n0 = b.add_node(10, GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(11, GeoPoint::new(0.0, 1.0));
        let n2 = b.add_node(12, GeoPoint::new(0.0, 2.0));
        let n3 = b.add_node(13, GeoPoint::new(1.0, 0.0));
        let n4 = b.add_node(14, GeoPoint::new(1.0, 2.0));

        b.add_road(n0, n1, EdgeAttrs::new(100.0).with_name("North Rd"));
        b.add_road(n1, n2, EdgeAttrs::new(100.0).with_name("Ridge Hill").with_risk(risk(85.0)));
        b.add_road(n2, n4, EdgeAttrs::new(100.0).with_name("East Ave"));
        b.add_road(n0, n3, EdgeAttrs::new(250.0).with_name("West Ave"));
        b.add_road(n3, n4, EdgeAttrs::new(100.0).with_name("South Rd"));

        (b.build(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use fl_core::{GeoPoint, SegmentId};
    use crate::{EdgeAttrs, RoadNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn single_road_is_bidirectional() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(37.0, 127.0));
        let c = b.add_node(2, GeoPoint::new(37.1, 127.0));
        b.add_road(a, c, EdgeAttrs::new(1_000.0));
        let net = b.build();
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 2);
        assert!(net.find_edge(a, c).is_some());
        assert!(net.find_edge(c, a).is_some());
    }

    #[test]
    fn csr_degrees() {
        let (net, [n0, n1, n2, n3, n4]) = super::helpers::grid_network();
        assert_eq!(net.out_degree(n0), 2);
        assert_eq!(net.out_degree(n1), 2);
        assert_eq!(net.out_degree(n2), 2);
        assert_eq!(net.out_degree(n3), 2);
        assert_eq!(net.out_degree(n4), 2);
        for e in net.out_edges(n0) {
            assert_eq!(net.edge_from[e.index()], n0);
        }
    }

    #[test]
    fn neighbors_keep_insertion_order() {
        let (net, [n0, n1, _, n3, _]) = super::helpers::grid_network();
        assert_eq!(net.neighbors(n0), vec![n1, n3]);
    }

    #[test]
    fn parallel_edges_get_keys() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        assert_eq!(b.add_edge(a, c, EdgeAttrs::new(300.0)), 0);
        assert_eq!(b.add_edge(a, c, EdgeAttrs::new(120.0)), 1);
        assert_eq!(b.add_edge(c, a, EdgeAttrs::new(120.0)), 0);
        let net = b.build();

        // Two parallel edges, but a single distinct neighbour.
        assert_eq!(net.out_degree(a), 2);
        assert_eq!(net.neighbors(a), vec![c]);
        let e = net.find_edge(a, c).unwrap();
        assert_eq!(net.edge_key[e.index()], 0);
        assert_eq!(net.edge_length_m[e.index()], 300.0);
    }

    #[test]
    fn ext_id_lookup() {
        let (net, [_, _, n2, ..]) = super::helpers::grid_network();
        assert_eq!(net.node_by_ext_id(12), Some(n2));
        assert_eq!(net.node_by_ext_id(99), None);
    }

    #[test]
    fn polyline_falls_back_to_endpoints() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let bend = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.2, 0.5),
            GeoPoint::new(0.0, 1.0),
        ];
        b.add_edge(a, c, EdgeAttrs::new(120.0).with_geometry(bend.clone()));
        b.add_edge(c, a, EdgeAttrs::new(100.0).with_segment(SegmentId(7)));
        let net = b.build();

        let fwd = net.find_edge(a, c).unwrap();
        let back = net.find_edge(c, a).unwrap();
        assert_eq!(net.edge_polyline(fwd), bend);
        assert_eq!(net.edge_polyline(back), vec![GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 0.0)]);
        assert!(net.edge_display_name(back).is_none());
    }

    #[test]
    fn add_road_reverses_geometry() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let shape = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.1, 0.5), GeoPoint::new(0.0, 1.0)];
        b.add_road(a, c, EdgeAttrs::new(110.0).with_geometry(shape));
        let net = b.build();
        let back = net.find_edge(c, a).unwrap();
        assert_eq!(net.edge_geometry(back).unwrap()[0], GeoPoint::new(0.0, 1.0));
    }
}

// ── Spatial snap ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use fl_core::GeoPoint;
    use crate::{EdgeAttrs, RoadNetworkBuilder};

    #[test]
    fn snap_exact_position() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        assert_eq!(net.snap_to_node(GeoPoint::new(0.0, 0.0)), Some(n0));
    }

    #[test]
    fn snap_nearest() {
        let (net, [n0, n1, ..]) = super::helpers::grid_network();
        assert_eq!(net.snap_to_node(GeoPoint::new(0.0, 0.4)), Some(n0));
        assert_eq!(net.snap_to_node(GeoPoint::new(0.0, 0.6)), Some(n1));
    }

    #[test]
    fn empty_network_returns_none() {
        let net = RoadNetworkBuilder::new().build();
        assert!(net.snap_to_node(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(net.nearest_edge(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(net.snap_endpoint(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn k_nearest_order() {
        let (net, nodes) = super::helpers::grid_network();
        let nearest = net.k_nearest_nodes(GeoPoint::new(0.0, 0.0), 2);
        assert_eq!(nearest[0], nodes[0]);
        // n1 and n3 are equidistant in lat/lon; either is valid.
        assert!(nearest[1] == nodes[1] || nearest[1] == nodes[3]);
    }

    #[test]
    fn endpoint_snaps_to_closer_end_of_nearest_edge() {
        let (net, [n0, n1, ..]) = super::helpers::grid_network();
        // Just off the 0-1 road, nearer node 1.
        assert_eq!(net.snap_endpoint(GeoPoint::new(0.01, 0.8)), Some(n1));
        // Just off the 0-1 road, nearer node 0.
        assert_eq!(net.snap_endpoint(GeoPoint::new(-0.01, 0.2)), Some(n0));
    }

    #[test]
    fn endpoint_uses_edge_not_nearest_node() {
        // A node sits close to the query but has no roads; the snap must land
        // on the road network instead.
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let _isolated = b.add_node(3, GeoPoint::new(0.3, 0.5));
        b.add_road(a, c, EdgeAttrs::new(100.0));
        let net = b.build();

        let snapped = net.snap_endpoint(GeoPoint::new(0.25, 0.45)).unwrap();
        assert!(snapped == a || snapped == c);
    }

    #[test]
    fn endpoint_falls_back_to_node_without_edges() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let _c = b.add_node(2, GeoPoint::new(5.0, 5.0));
        let net = b.build();
        assert_eq!(net.snap_endpoint(GeoPoint::new(0.1, 0.1)), Some(a));
    }
}

// ── Risk table ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod risk {
    use std::io::{Cursor, Write};

    use fl_core::{GeoPoint, SegmentId};
    use crate::{load_risk_or_empty, load_risk_reader, EdgeAttrs, RoadNetworkBuilder, SpatialError};

    const RISK_CSV: &str = "\
segment_id,final_risk_score,slope_score,freeze_score,accident_score,population_score,raw_score\n\
100,40.0,10.0,50.0,5.0,20.0,70.0\n\
100,65.0,30.0,20.0,1.0,2.0,90.0\n\
100,50.0,99.0,99.0,99.0,99.0,99.0\n\
200,85.0,5.0,95.0,0.0,0.0,110.0\n\
";

    #[test]
    fn duplicates_keep_highest_risk_row() {
        let table = load_risk_reader(Cursor::new(RISK_CSV)).unwrap();
        assert_eq!(table.len(), 2);
        let s = table.get(SegmentId(100)).unwrap();
        // The whole 65.0 row survives, not a per-field blend.
        assert_eq!(s.risk, 65.0);
        assert_eq!(s.slope, 30.0);
        assert_eq!(s.raw, 90.0);
    }

    #[test]
    fn accepts_freezing_index_column_names() {
        let csv = "\
road_id,final_risk_score,norm_slope_score,norm_freezing_weak_score,norm_accident_score,norm_population_risk,original_raw_score\n\
7,72.5,11.0,88.0,3.0,4.0,50.0\n";
        let table = load_risk_reader(Cursor::new(csv)).unwrap();
        let s = table.get(SegmentId(7)).unwrap();
        assert_eq!(s.risk, 72.5);
        assert_eq!(s.freeze, 88.0);
        assert_eq!(s.population, 4.0);
    }

    #[test]
    fn blank_sub_score_cells_read_as_zero() {
        let csv = "\
segment_id,final_risk_score,slope_score,freeze_score,accident_score,population_score,raw_score\n\
1,85.0,,91.0,12.0,NaN,120.0\n\
2,40.0,5.0,,,,\n";
        let table = load_risk_reader(Cursor::new(csv)).unwrap();
        assert_eq!(table.len(), 2);

        let s = table.get(SegmentId(1)).unwrap();
        assert_eq!(s.risk, 85.0);
        assert_eq!(s.slope, 0.0);
        assert_eq!(s.freeze, 91.0);
        assert_eq!(s.population, 0.0);
        assert_eq!(s.raw, 120.0);

        let s = table.get(SegmentId(2)).unwrap();
        assert_eq!((s.slope, s.freeze, s.raw), (5.0, 0.0, 0.0));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let csv = "segment_id,final_risk_score\nabc,10\n";
        let err = load_risk_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(err, SpatialError::RiskData(_)));
    }

    #[test]
    fn edge_takes_fieldwise_max_over_segments() {
        let table = load_risk_reader(Cursor::new(RISK_CSV)).unwrap();

        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let d = b.add_node(3, GeoPoint::new(0.0, 2.0));
        // Edge merged from two segments.
        b.add_edge(a, c, EdgeAttrs::new(100.0).with_segment(SegmentId(100)).with_segment(SegmentId(200)));
        // Edge with an unknown segment.
        b.add_edge(c, d, EdgeAttrs::new(100.0).with_segment(SegmentId(999)));
        let mut net = b.build();

        assert_eq!(net.apply_risk(&table), 1);

        let merged = net.edge_risk[net.find_edge(a, c).unwrap().index()];
        assert_eq!(merged.risk, 85.0);
        assert_eq!(merged.slope, 30.0);
        assert_eq!(merged.freeze, 95.0);
        assert_eq!(merged.raw, 110.0);

        let unknown = net.edge_risk[net.find_edge(c, d).unwrap().index()];
        assert_eq!(unknown.risk, 0.0);
    }

    #[test]
    fn missing_dataset_degrades_to_empty() {
        assert!(load_risk_or_empty(None).unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("final_freezing_score.csv");
        assert!(load_risk_or_empty(Some(&missing)).unwrap().is_empty());
    }

    #[test]
    fn present_dataset_loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RISK_CSV.as_bytes()).unwrap();
        let table = load_risk_or_empty(Some(file.path())).unwrap();
        assert_eq!(table.len(), 2);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use fl_core::{GeoPoint, RiskLevel, RiskThresholds};
    use crate::{
        edge_weight, shortest_path, DijkstraRouter, EdgeAttrs, RiskAwareRouter, RoadNetworkBuilder,
        RouteQuery, Router, SpatialError, TravelMode,
    };

    #[test]
    fn trivial_same_node() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let r = DijkstraRouter::default().route(&net, n0, n0, TravelMode::Fast).unwrap();
        assert!(r.is_trivial());
        assert_eq!(r.cost, 0.0);
    }

    #[test]
    fn fast_mode_is_plain_shortest_length() {
        let (net, [n0, n1, n2, _, n4]) = super::helpers::grid_network();
        let route = DijkstraRouter::default().route(&net, n0, n4, TravelMode::Fast).unwrap();

        assert_eq!(route.cost, 300.0);
        assert_eq!(route.cost, route.length_m(&net));
        assert_eq!(route.nodes(&net), vec![n0, n1, n2, n4]);
    }

    #[test]
    fn safe_mode_detours_around_penalised_edge() {
        let (net, [n0, _, _, n3, n4]) = super::helpers::grid_network();
        let route = DijkstraRouter::default().route(&net, n0, n4, TravelMode::Safe).unwrap();
        assert_eq!(route.nodes(&net), vec![n0, n3, n4]);
        assert_eq!(route.cost, 350.0);
    }

    #[test]
    fn safe_weights_follow_thresholds() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        b.add_edge(a, c, EdgeAttrs::new(10.0).with_risk(super::helpers::risk(59.9)));
        b.add_edge(a, c, EdgeAttrs::new(10.0).with_risk(super::helpers::risk(60.0)));
        b.add_edge(a, c, EdgeAttrs::new(10.0).with_risk(super::helpers::risk(80.0)));
        let net = b.build();
        let t = RiskThresholds::default();

        let weights: Vec<f64> = net
            .out_edges(a)
            .map(|e| edge_weight(&net, e, TravelMode::Safe, &t))
            .collect();
        assert_eq!(weights, vec![10.0, 1_000.0, 10_000.0]);

        let fast: Vec<f64> = net
            .out_edges(a)
            .map(|e| edge_weight(&net, e, TravelMode::Fast, &t))
            .collect();
        assert_eq!(fast, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn parallel_edges_route_over_cheapest() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        b.add_edge(a, c, EdgeAttrs::new(50.0).with_risk(super::helpers::risk(90.0)));
        b.add_edge(a, c, EdgeAttrs::new(400.0));
        let net = b.build();

        let fast = DijkstraRouter::default().route(&net, a, c, TravelMode::Fast).unwrap();
        assert_eq!(net.edge_key[fast.edges[0].index()], 0);
        let safe = DijkstraRouter::default().route(&net, a, c, TravelMode::Safe).unwrap();
        assert_eq!(net.edge_key[safe.edges[0].index()], 1);
        assert_eq!(safe.cost, 400.0);
    }

    #[test]
    fn no_route_disconnected() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(1.0, 0.0));
        let net = b.build();
        let result = DijkstraRouter::default().route(&net, a, c, TravelMode::Fast);
        assert!(matches!(result, Err(SpatialError::NoRoute { .. })));
    }

    #[test]
    fn directed_one_way_blocks_return() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        b.add_edge(a, c, EdgeAttrs::new(100.0));
        let net = b.build();

        assert!(shortest_path(&net, a, c, |_| 1.0).is_ok());
        assert!(matches!(
            shortest_path(&net, c, a, |_| 1.0),
            Err(SpatialError::NoRoute { .. })
        ));
    }

    #[test]
    fn unknown_node_is_rejected() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let bogus = fl_core::NodeId(99);
        assert!(matches!(
            shortest_path(&net, n0, bogus, |_| 1.0),
            Err(SpatialError::NodeNotFound(n)) if n == bogus
        ));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("safe".parse::<TravelMode>().unwrap(), TravelMode::Safe);
        assert_eq!(" FAST ".parse::<TravelMode>().unwrap(), TravelMode::Fast);
        assert!("scenic".parse::<TravelMode>().is_err());
    }

    #[test]
    fn report_geometry_and_flags() {
        let (net, _) = super::helpers::grid_network();
        let router = RiskAwareRouter::default();
        let report = router
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 2.0), TravelMode::Fast)
            .unwrap();

        // Three edges without geometry → three start nodes + destination.
        assert_eq!(
            report.path,
            vec![[0.0, 0.0], [0.0, 1.0], [0.0, 2.0], [1.0, 2.0]]
        );
        assert_eq!(report.danger_segments.len(), 1);
        let seg = &report.danger_segments[0];
        assert_eq!((seg.lat, seg.lng), (0.0, 1.0));
        assert_eq!(seg.road_name, "Ridge Hill");
        assert_eq!(report.stats.risk_level, RiskLevel::Danger);
        assert_eq!(report.stats.max, 85.0);
        assert_eq!(report.stats.average, 28.3); // 85 / 3
        assert_eq!(report.stats.danger_count, 1);

        // Unrounded aggregates behind the one-decimal figures.
        assert_eq!(report.stats.mean_scores.risk, 85.0 / 3.0);
        assert_eq!(report.stats.max_scores.risk, 85.0);
        assert_eq!(report.stats.max_scores.slope, 0.0);
    }

    #[test]
    fn custom_router_drives_find_path() {
        use fl_core::NodeId;
        use crate::{Route, RoadNetwork, SpatialResult};

        /// Fewest roads, whatever their length or risk.
        struct HopRouter;

        impl Router for HopRouter {
            fn route(
                &self,
                network: &RoadNetwork,
                from:    NodeId,
                to:      NodeId,
                _mode:   TravelMode,
            ) -> SpatialResult<Route> {
                shortest_path(network, from, to, |_| 1.0)
            }
        }

        let (net, _) = super::helpers::grid_network();
        let router = RiskAwareRouter::with_router(HopRouter, RiskThresholds::default());
        let report = router
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 2.0), TravelMode::Fast)
            .unwrap();

        // Two hops via West Ave beat the three-hop northern road.
        assert_eq!(report.path, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 2.0]]);
        assert_eq!(report.cost, 2.0);
        assert!(report.danger_segments.is_empty());
        assert_eq!(router.thresholds().danger, RiskThresholds::default().danger);
    }

    #[test]
    fn report_concatenates_stored_geometry() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let d = b.add_node(3, GeoPoint::new(0.0, 2.0));
        let shape = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.1, 0.5), GeoPoint::new(0.0, 1.0)];
        b.add_edge(a, c, EdgeAttrs::new(120.0).with_geometry(shape));
        b.add_edge(c, d, EdgeAttrs::new(100.0));
        let net = b.build();

        let report = RiskAwareRouter::default()
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 2.0), TravelMode::Fast)
            .unwrap();
        assert_eq!(
            report.path,
            vec![[0.0, 0.0], [0.1, 0.5], [0.0, 1.0], [0.0, 1.0], [0.0, 2.0]]
        );
    }

    #[test]
    fn unnamed_danger_edge_gets_placeholder() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let c = b.add_node(2, GeoPoint::new(0.0, 1.0));
        b.add_road(a, c, EdgeAttrs::new(100.0).with_risk(super::helpers::risk(70.0)));
        let net = b.build();

        let report = RiskAwareRouter::default()
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0), TravelMode::Safe)
            .unwrap();
        assert_eq!(report.danger_segments[0].road_name, crate::UNKNOWN_ROAD);
        assert_eq!(report.stats.risk_level, RiskLevel::Warning);
    }

    #[test]
    fn sole_hazardous_path_is_still_returned() {
        // A — B — C where B-C is the only link and has risk 85.
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let m = b.add_node(2, GeoPoint::new(0.0, 1.0));
        let c = b.add_node(3, GeoPoint::new(0.0, 2.0));
        b.add_road(a, m, EdgeAttrs::new(100.0).with_name("Valley Rd"));
        b.add_road(m, c, EdgeAttrs::new(200.0).with_name("Ice Pass").with_risk(super::helpers::risk(85.0)));
        let net = b.build();

        let report = RiskAwareRouter::default()
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 2.0), TravelMode::Safe)
            .unwrap();

        assert_eq!(report.cost, 100.0 + 200.0 * 1_000.0);
        assert_eq!(report.path.len(), 3);
        assert_eq!(report.stats.risk_level, RiskLevel::Danger);
        assert_eq!(report.danger_segments.len(), 1);
        assert_eq!(report.danger_segments[0].score, 85.0);
        assert_eq!(report.danger_segments[0].road_name, "Ice Pass");
    }

    #[test]
    fn identical_endpoints_give_single_point_and_zero_stats() {
        let (net, _) = super::helpers::grid_network();
        let report = RiskAwareRouter::default()
            .find_path(&net, GeoPoint::new(0.0, 2.0), GeoPoint::new(0.0, 2.0), TravelMode::Safe)
            .unwrap();

        assert_eq!(report.path, vec![[0.0, 2.0]]);
        assert_eq!(report.stats.average, 0.0);
        assert_eq!(report.stats.max, 0.0);
        assert_eq!(report.stats.risk_level, RiskLevel::Safe);
        assert_eq!(report.stats.danger_count, 0);
        assert!(report.danger_segments.is_empty());
    }

    #[test]
    fn empty_network_cannot_route() {
        let net = RoadNetworkBuilder::new().build();
        let err = RiskAwareRouter::default()
            .find_path(&net, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0), TravelMode::Fast)
            .unwrap_err();
        assert!(matches!(err, SpatialError::EmptyNetwork));
    }

    #[test]
    fn batch_preserves_query_order() {
        let (net, _) = super::helpers::grid_network();
        let queries = [
            RouteQuery { start: GeoPoint::new(0.0, 0.0), end: GeoPoint::new(1.0, 2.0), mode: TravelMode::Fast },
            RouteQuery { start: GeoPoint::new(0.0, 0.0), end: GeoPoint::new(1.0, 2.0), mode: TravelMode::Safe },
        ];
        let results = RiskAwareRouter::default().find_paths(&net, &queries);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().cost, 300.0);
        assert_eq!(results[1].as_ref().unwrap().cost, 350.0);
    }
}

// ── Routing over random graphs ────────────────────────────────────────────────

#[cfg(test)]
mod routing_properties {
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;

    use fl_core::{GeoPoint, NodeId, RiskThresholds};
    use crate::{
        edge_weight, DijkstraRouter, EdgeAttrs, RoadNetwork, RoadNetworkBuilder, Router,
        SpatialError, TravelMode,
    };

    /// `(from, to, length_m, risk)`, directed.
    type Road = (usize, usize, u32, u8);

    fn arb_graph() -> impl Strategy<Value = (usize, Vec<Road>)> {
        (2usize..8).prop_flat_map(|n| {
            let road = (0..n, 0..n, 1u32..500, 0u8..=100);
            (Just(n), prop::collection::vec(road, 0..20))
        })
    }

    fn build(n: usize, roads: &[Road]) -> (RoadNetwork, Vec<NodeId>) {
        let mut b = RoadNetworkBuilder::new();
        let ids: Vec<NodeId> = (0..n)
            .map(|i| b.add_node(i as u64, GeoPoint::new(i as f64 * 0.01, 0.0)))
            .collect();
        for &(a, z, len, risk) in roads.iter().filter(|r| r.0 != r.1) {
            b.add_edge(
                ids[a],
                ids[z],
                EdgeAttrs::new(f64::from(len)).with_risk(super::helpers::risk(f64::from(risk))),
            );
        }
        (b.build(), ids)
    }

    /// Floyd-Warshall reference distances under `weight(length, risk)`.
    fn all_pairs(n: usize, roads: &[Road], weight: impl Fn(f64, f64) -> f64) -> Vec<Vec<f64>> {
        let mut d = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for &(a, z, len, risk) in roads.iter().filter(|r| r.0 != r.1) {
            let w = weight(f64::from(len), f64::from(risk));
            if w < d[a][z] {
                d[a][z] = w;
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if d[i][k] + d[k][j] < d[i][j] {
                        d[i][j] = d[i][k] + d[k][j];
                    }
                }
            }
        }
        d
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            failure_persistence: None,
            .. ProptestConfig::default()
        })]

        #[test]
        fn fast_cost_is_shortest_length(
            (n, roads) in arb_graph(),
            from in 0usize..8,
            to in 0usize..8,
        ) {
            let (from, to) = (from % n, to % n);
            let (net, ids) = build(n, &roads);
            let best = all_pairs(n, &roads, |len, _| len)[from][to];

            match DijkstraRouter::default().route(&net, ids[from], ids[to], TravelMode::Fast) {
                Ok(route) => {
                    prop_assert_eq!(route.cost, best);
                    prop_assert_eq!(route.length_m(&net), best);
                    let nodes = route.nodes(&net);
                    prop_assert_eq!(nodes.first(), Some(&ids[from]));
                    prop_assert_eq!(nodes.last(), Some(&ids[to]));
                }
                Err(SpatialError::NoRoute { .. }) => prop_assert!(best.is_infinite()),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }

        #[test]
        fn safe_cost_applies_hazard_multipliers(
            (n, roads) in arb_graph(),
            from in 0usize..8,
            to in 0usize..8,
        ) {
            let (from, to) = (from % n, to % n);
            let (net, ids) = build(n, &roads);
            let t = RiskThresholds::default();

            for e in (0..net.edge_count()).map(|i| fl_core::EdgeId(i as u32)) {
                let len = net.edge_length_m[e.index()];
                let risk = net.edge_risk[e.index()].risk;
                let factor = if risk >= 80.0 { 1_000.0 } else if risk >= 60.0 { 100.0 } else { 1.0 };
                prop_assert_eq!(edge_weight(&net, e, TravelMode::Safe, &t), len * factor);
                prop_assert_eq!(edge_weight(&net, e, TravelMode::Fast, &t), len);
            }

            let best = all_pairs(n, &roads, |len, risk| len * t.penalty(risk))[from][to];
            match DijkstraRouter::default().route(&net, ids[from], ids[to], TravelMode::Safe) {
                Ok(route) => {
                    prop_assert_eq!(route.cost, best);
                    let summed: f64 = route
                        .edges
                        .iter()
                        .map(|&e| edge_weight(&net, e, TravelMode::Safe, &t))
                        .sum();
                    prop_assert_eq!(summed, best);
                }
                Err(SpatialError::NoRoute { .. }) => prop_assert!(best.is_infinite()),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
    }
}

// ── Subgraph extraction ───────────────────────────────────────────────────────

#[cfg(test)]
mod subgraph {
    use fl_core::GeoPoint;

    #[test]
    fn keeps_only_nodes_within_radius() {
        let (net, _) = super::helpers::grid_network();
        // 1 degree ≈ 111 km; 150 km around (0,0) covers nodes 0, 1, 3 only
        // ((0,2) is 222 km away, (1,1)-diagonal nodes are farther).
        let sub = net.subgraph_within(GeoPoint::new(0.0, 0.0), 150_000.0);
        assert_eq!(sub.node_count(), 3);
        let ext: Vec<u64> = sub.node_ext_id.clone();
        assert_eq!(ext, vec![10, 11, 13]);
        // Induced edges: 0-1 and 0-3 in both directions.
        assert_eq!(sub.edge_count(), 4);
    }

    #[test]
    fn carries_attributes_and_risk() {
        let (net, _) = super::helpers::grid_network();
        let sub = net.subgraph_within(GeoPoint::new(0.0, 1.0), 120_000.0);
        let n1 = sub.node_by_ext_id(11).unwrap();
        let n2 = sub.node_by_ext_id(12).unwrap();
        let e = sub.find_edge(n1, n2).unwrap();
        assert_eq!(sub.edge_risk[e.index()].risk, 85.0);
        assert_eq!(sub.edge_display_name(e), Some("Ridge Hill"));
        assert_eq!(sub.edge_length_m[e.index()], 100.0);
    }

    #[test]
    fn equatorial_node_just_inside_radius_is_kept() {
        let mut b = crate::RoadNetworkBuilder::new();
        let depot = b.add_node(1, GeoPoint::new(0.0, 0.0));
        let edge = b.add_node(2, GeoPoint::new(0.03146, 0.0));
        b.add_road(depot, edge, crate::EdgeAttrs::new(3_498.0));
        let net = b.build();

        let d = GeoPoint::new(0.0, 0.0).distance_m(GeoPoint::new(0.03146, 0.0));
        assert!(d < 3_500.0, "got {d}");
        let sub = net.subgraph_within(GeoPoint::new(0.0, 0.0), 3_500.0);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 2);
    }

    #[test]
    fn high_latitude_east_west_reach() {
        // At 60°N a degree of longitude is about half as long.
        let center = GeoPoint::new(60.0, 10.0);
        let east = GeoPoint::new(60.0, 10.0627);
        let far = GeoPoint::new(60.0, 10.0650);
        assert!(center.distance_m(east) < 3_500.0);
        assert!(center.distance_m(far) > 3_500.0);

        let mut b = crate::RoadNetworkBuilder::new();
        b.add_node(1, center);
        b.add_node(2, east);
        b.add_node(3, far);
        let sub = b.build().subgraph_within(center, 3_500.0);
        assert_eq!(sub.node_ext_id, vec![1, 2]);
    }

    #[test]
    fn empty_when_nothing_nearby() {
        let (net, _) = super::helpers::grid_network();
        let sub = net.subgraph_within(GeoPoint::new(45.0, 45.0), 1_000.0);
        assert!(sub.is_empty());
        assert_eq!(sub.edge_count(), 0);
    }
}
