//! Per-segment risk table and its mapping onto graph edges.
//!
//! # CSV format
//!
//! One row per road segment:
//!
//! ```csv
//! segment_id,final_risk_score,slope_score,freeze_score,accident_score,population_score,raw_score
//! 4012,85.0,40.2,91.0,12.5,33.0,120.4
//! 4013,22.1,5.0,30.0,0.0,10.0,18.7
//! ```
//!
//! The freezing-index export uses different column names (`road_id`,
//! `norm_slope_score`, `norm_freezing_weak_score`, `norm_accident_score`,
//! `norm_population_risk`, `original_raw_score`); both spellings are
//! accepted.  Missing sub-score columns and blank sub-score cells read
//! as 0; the composite `final_risk_score` is required on every row.
//!
//! # Aggregation
//!
//! - Duplicate `segment_id` rows: the row with the highest
//!   `final_risk_score` is kept, the rest are discarded whole.
//! - Edge mapping: an edge built from several segments takes the per-field
//!   maximum over all of their records.  An edge with no matching record
//!   gets all-zero scores.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use fl_core::{RiskScores, SegmentId};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── CSV record ────────────────────────────────────────────────────────────────

/// One row of the external risk dataset.
#[derive(Clone, Debug, Deserialize)]
pub struct RiskRecord {
    #[serde(alias = "road_id")]
    pub segment_id: u64,

    #[serde(rename = "final_risk_score")]
    pub risk: f64,

    #[serde(default, rename = "slope_score", alias = "norm_slope_score",
            deserialize_with = "csv::invalid_option")]
    pub slope: Option<f64>,

    #[serde(default, rename = "freeze_score", alias = "norm_freezing_weak_score",
            deserialize_with = "csv::invalid_option")]
    pub freeze: Option<f64>,

    #[serde(default, rename = "accident_score", alias = "norm_accident_score",
            deserialize_with = "csv::invalid_option")]
    pub accident: Option<f64>,

    #[serde(default, rename = "population_score", alias = "norm_population_risk",
            deserialize_with = "csv::invalid_option")]
    pub population: Option<f64>,

    #[serde(default, rename = "raw_score", alias = "original_raw_score",
            deserialize_with = "csv::invalid_option")]
    pub raw: Option<f64>,
}

/// Blank, unparseable, and `NaN` sub-score cells read as 0.
fn sub_score(v: Option<f64>) -> f64 {
    v.filter(|x| !x.is_nan()).unwrap_or(0.0)
}

impl RiskRecord {
    pub fn scores(&self) -> RiskScores {
        RiskScores {
            risk:       self.risk,
            slope:      sub_score(self.slope),
            freeze:     sub_score(self.freeze),
            accident:   sub_score(self.accident),
            population: sub_score(self.population),
            raw:        sub_score(self.raw),
        }
    }
}

// ── RiskTable ─────────────────────────────────────────────────────────────────

/// Deduplicated risk scores keyed by segment.
#[derive(Clone, Debug, Default)]
pub struct RiskTable {
    by_segment: FxHashMap<SegmentId, RiskScores>,
}

impl RiskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, keeping whichever row for its segment has the higher
    /// composite risk.  On a tie the earlier row stays.
    pub fn insert(&mut self, record: &RiskRecord) {
        let scores = record.scores();
        self.by_segment
            .entry(SegmentId(record.segment_id))
            .and_modify(|kept| {
                if scores.risk > kept.risk {
                    *kept = scores;
                }
            })
            .or_insert(scores);
    }

    pub fn get(&self, segment: SegmentId) -> Option<&RiskScores> {
        self.by_segment.get(&segment)
    }

    pub fn len(&self) -> usize {
        self.by_segment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_segment.is_empty()
    }
}

impl<'a> FromIterator<&'a RiskRecord> for RiskTable {
    fn from_iter<I: IntoIterator<Item = &'a RiskRecord>>(iter: I) -> Self {
        let mut table = RiskTable::new();
        for r in iter {
            table.insert(r);
        }
        table
    }
}

// ── Loaders ───────────────────────────────────────────────────────────────────

/// Load a risk table from a CSV file.
pub fn load_risk_csv(path: &Path) -> SpatialResult<RiskTable> {
    let file = std::fs::File::open(path)?;
    load_risk_reader(file)
}

/// Like [`load_risk_csv`] but accepts any `Read` source.
pub fn load_risk_reader<R: Read>(reader: R) -> SpatialResult<RiskTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut table = RiskTable::new();
    let mut rows = 0usize;

    for result in csv_reader.deserialize::<RiskRecord>() {
        let row = result.map_err(|e| SpatialError::RiskData(e.to_string()))?;
        table.insert(&row);
        rows += 1;
    }

    log::debug!("risk table: {rows} rows, {} distinct segments", table.len());
    Ok(table)
}

/// Load the risk table, degrading to an empty one when the dataset is absent.
///
/// A missing path or file is not fatal: the engine keeps running with every
/// risk score at 0 and a warning is logged.  A file that exists but does not
/// parse is still an error.
pub fn load_risk_or_empty(path: Option<&Path>) -> SpatialResult<RiskTable> {
    let Some(path) = path else {
        log::warn!("no risk dataset configured; routing without hazard scores (degraded mode)");
        return Ok(RiskTable::new());
    };
    if !path.exists() {
        log::warn!(
            "risk dataset {} not found; routing without hazard scores (degraded mode)",
            path.display()
        );
        return Ok(RiskTable::new());
    }
    let table = load_risk_csv(path)?;
    log::info!("loaded {} segment risk scores from {}", table.len(), path.display());
    Ok(table)
}

// ── Edge mapping ──────────────────────────────────────────────────────────────

impl RoadNetwork {
    /// Overwrite every edge's risk scores from `table`.
    ///
    /// Returns the number of edges that matched at least one record.
    pub fn apply_risk(&mut self, table: &RiskTable) -> usize {
        let mut matched = 0;
        for (risk, segments) in self.edge_risk.iter_mut().zip(self.edge_segments.iter()) {
            let mut hit = false;
            let mut acc = RiskScores::ZERO;
            for s in segments.iter() {
                if let Some(scores) = table.get(*s) {
                    acc = acc.max_with(*scores);
                    hit = true;
                }
            }
            *risk = acc;
            if hit {
                matched += 1;
            }
        }
        log::info!("risk scores mapped onto {matched} of {} edges", self.edge_count());
        matched
    }
}
