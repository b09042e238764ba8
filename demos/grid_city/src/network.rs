//! Synthetic street grid used by the demo.
//!
//! A 4 × 4 block grid laid over the Teheran-ro area of Gangnam, Seoul.
//! Every street between two neighbouring intersections is its own road
//! segment; segment ids are listed in [`RISK_CSV`].

use fl_core::{GeoPoint, NodeId, SegmentId};
use fl_spatial::{EdgeAttrs, RoadNetworkBuilder};

pub const ROWS: usize = 4;
pub const COLS: usize = 4;

const ORIGIN:   (f64, f64) = (37.5000, 127.0300);
const LAT_STEP: f64        = 0.0012;
const LON_STEP: f64        = 0.0015;

const ROW_NAMES: [&str; ROWS] = ["Yeoksam-ro", "Teheran-ro", "Bongeunsa-ro", "Hakdong-ro"];
const COL_NAMES: [&str; COLS] = ["Gangnam-daero", "Nonhyeon-ro", "Eonju-ro", "Seolleung-ro"];

/// Per-segment risk scores for the demo grid.  Segment `100 + k` is the
/// `k`-th east–west street, `200 + k` the `k`-th north–south one.
pub const RISK_CSV: &str = "\
segment_id,final_risk_score,slope_score,freeze_score,accident_score,population_score,raw_score\n\
104,88.0,72.0,91.0,35.0,20.0,131.0\n\
205,64.0,40.0,70.0,22.0,18.0,96.0\n\
206,82.5,66.0,85.0,40.0,25.0,122.0\n\
101,12.0,3.0,15.0,8.0,30.0,24.0\n\
110,45.0,10.0,52.0,14.0,41.0,66.0\n\
";

pub fn intersection(row: usize, col: usize) -> GeoPoint {
    GeoPoint::new(
        ORIGIN.0 + row as f64 * LAT_STEP,
        ORIGIN.1 + col as f64 * LON_STEP,
    )
}

/// Build the grid.  Intersection `(r, c)` gets external id
/// `5000 + r * COLS + c`.
pub fn build_grid() -> RoadNetworkBuilder {
    let mut b = RoadNetworkBuilder::with_capacity(ROWS * COLS, 4 * ROWS * COLS);

    let mut nodes: Vec<NodeId> = Vec::with_capacity(ROWS * COLS);
    for r in 0..ROWS {
        for c in 0..COLS {
            let ext_id = 5_000 + (r * COLS + c) as u64;
            nodes.push(b.add_node(ext_id, intersection(r, c)));
        }
    }
    let at = |r: usize, c: usize| nodes[r * COLS + c];

    let mut seg = 100;
    for r in 0..ROWS {
        for c in 0..COLS - 1 {
            let (a, z) = (at(r, c), at(r, c + 1));
            let len = intersection(r, c).distance_m(intersection(r, c + 1));
            b.add_road(a, z, EdgeAttrs::new(len).with_name(ROW_NAMES[r]).with_segment(SegmentId(seg)));
            seg += 1;
        }
    }

    seg = 200;
    for c in 0..COLS {
        for r in 0..ROWS - 1 {
            let (a, z) = (at(r, c), at(r + 1, c));
            let len = intersection(r, c).distance_m(intersection(r + 1, c));
            b.add_road(a, z, EdgeAttrs::new(len).with_name(COL_NAMES[c]).with_segment(SegmentId(seg)));
            seg += 1;
        }
    }

    b
}
