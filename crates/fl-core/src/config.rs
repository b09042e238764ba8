//! Engine configuration.
//!
//! The application crate typically loads [`EngineConfig`] from a JSON file
//! (with the `serde` feature) and hands it to the engine at startup.  Every
//! field has a default, so a partial file only overrides what it names.

use std::path::PathBuf;

use crate::{CoreError, CoreResult, RiskThresholds};

// ── CoverageConfig ────────────────────────────────────────────────────────────

/// Parameters of a single coverage rollout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoverageConfig {
    /// Maximum number of moves in one rollout.  Default: 400.
    pub step_limit: u32,

    /// Recently visited nodes kept in the node tabu queue.  Default: 10.
    pub node_tabu_capacity: usize,

    /// Recently traversed edges kept in the edge tabu queue.  Default: 20.
    pub edge_tabu_capacity: usize,

    /// Score added per still-uncovered incident edge of a candidate.
    /// Default: 10.0.
    pub frontier_weight: f64,

    /// Radius (metres) of the working subgraph extracted around the depot.
    /// Default: 3 500.
    pub radius_m: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            step_limit:         400,
            node_tabu_capacity: 10,
            edge_tabu_capacity: 20,
            frontier_weight:    10.0,
            radius_m:           3_500.0,
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Per-segment risk CSV.  `None` (or a missing file) runs the engine
    /// in degraded mode with every risk score at 0.
    pub risk_csv: Option<PathBuf>,

    /// Directory holding `q_table_<subdivision>.json` policy artifacts.
    pub policy_dir: PathBuf,

    pub thresholds: RiskThresholds,

    pub coverage: CoverageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_csv:   None,
            policy_dir: PathBuf::from("models"),
            thresholds: RiskThresholds::default(),
            coverage:   CoverageConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings that would make routing or rollouts meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        let t = &self.thresholds;
        if !(t.warning <= t.danger) {
            return Err(CoreError::Config(format!(
                "warning threshold {} exceeds danger threshold {}",
                t.warning, t.danger
            )));
        }
        if t.warning_multiplier < 1.0 || t.danger_multiplier < t.warning_multiplier {
            return Err(CoreError::Config(format!(
                "penalty multipliers must satisfy 1 <= warning ({}) <= danger ({})",
                t.warning_multiplier, t.danger_multiplier
            )));
        }
        let c = &self.coverage;
        if c.step_limit == 0 {
            return Err(CoreError::Config("coverage step_limit must be positive".into()));
        }
        if c.node_tabu_capacity == 0 || c.edge_tabu_capacity == 0 {
            return Err(CoreError::Config("tabu capacities must be positive".into()));
        }
        if !(c.radius_m > 0.0) {
            return Err(CoreError::Config(format!(
                "coverage radius must be positive, got {}",
                c.radius_m
            )));
        }
        Ok(())
    }
}
