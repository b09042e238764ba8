//! Per-edge hazard scores and the thresholds that classify them.
//!
//! Every score is on the 0–100 scale produced by the upstream freezing-risk
//! model.  `risk` is the composite; the other five are the contributing
//! sub-scores, carried through so routes can report what made a road
//! dangerous.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

// ── RiskScores ────────────────────────────────────────────────────────────────

/// The six hazard sub-scores attached to a road edge.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskScores {
    pub risk:       f64,
    pub slope:      f64,
    pub freeze:     f64,
    pub accident:   f64,
    pub population: f64,
    pub raw:        f64,
}

impl RiskScores {
    pub const ZERO: RiskScores = RiskScores {
        risk:       0.0,
        slope:      0.0,
        freeze:     0.0,
        accident:   0.0,
        population: 0.0,
        raw:        0.0,
    };

    /// Field-wise maximum.  Each field is maximised independently, so the
    /// result may combine sub-scores from different source records.
    pub fn max_with(self, other: RiskScores) -> RiskScores {
        RiskScores {
            risk:       self.risk.max(other.risk),
            slope:      self.slope.max(other.slope),
            freeze:     self.freeze.max(other.freeze),
            accident:   self.accident.max(other.accident),
            population: self.population.max(other.population),
            raw:        self.raw.max(other.raw),
        }
    }

    /// Field-wise sum, used when averaging over a route.
    pub fn add(self, other: RiskScores) -> RiskScores {
        RiskScores {
            risk:       self.risk + other.risk,
            slope:      self.slope + other.slope,
            freeze:     self.freeze + other.freeze,
            accident:   self.accident + other.accident,
            population: self.population + other.population,
            raw:        self.raw + other.raw,
        }
    }

    /// Divide every field by `n`.  Returns [`ZERO`](Self::ZERO) for `n == 0`.
    pub fn div(self, n: usize) -> RiskScores {
        if n == 0 {
            return RiskScores::ZERO;
        }
        let n = n as f64;
        RiskScores {
            risk:       self.risk / n,
            slope:      self.slope / n,
            freeze:     self.freeze / n,
            accident:   self.accident / n,
            population: self.population / n,
            raw:        self.raw / n,
        }
    }
}

// ── RiskLevel ─────────────────────────────────────────────────────────────────

/// Route-level hazard classification, derived from the maximum edge risk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskLevel {
    #[default]
    Safe,
    Warning,
    Danger,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Safe    => "Safe",
            RiskLevel::Warning => "Warning",
            RiskLevel::Danger  => "Danger",
        })
    }
}

impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Safe"    => Ok(RiskLevel::Safe),
            "Warning" => Ok(RiskLevel::Warning),
            "Danger"  => Ok(RiskLevel::Danger),
            other     => Err(CoreError::Parse(format!("unknown risk level {other:?}"))),
        }
    }
}

// ── RiskThresholds ────────────────────────────────────────────────────────────

/// Score cut-offs and the safe-mode cost multipliers attached to them.
///
/// | Risk           | Level     | Safe-mode multiplier   |
/// |----------------|-----------|------------------------|
/// | `≥ danger`     | `Danger`  | `danger_multiplier`    |
/// | `≥ warning`    | `Warning` | `warning_multiplier`   |
/// | below          | `Safe`    | 1                      |
///
/// `warning` is also the reporting threshold for danger segments.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RiskThresholds {
    pub warning:            f64,
    pub danger:             f64,
    pub warning_multiplier: f64,
    pub danger_multiplier:  f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            warning:            60.0,
            danger:             80.0,
            warning_multiplier: 100.0,
            danger_multiplier:  1_000.0,
        }
    }
}

impl RiskThresholds {
    /// Classify a single risk score.
    #[inline]
    pub fn level(&self, risk: f64) -> RiskLevel {
        if risk >= self.danger {
            RiskLevel::Danger
        } else if risk >= self.warning {
            RiskLevel::Warning
        } else {
            RiskLevel::Safe
        }
    }

    /// Safe-mode cost multiplier for an edge with this risk score.
    #[inline]
    pub fn penalty(&self, risk: f64) -> f64 {
        match self.level(risk) {
            RiskLevel::Danger  => self.danger_multiplier,
            RiskLevel::Warning => self.warning_multiplier,
            RiskLevel::Safe    => 1.0,
        }
    }

    /// `true` if an edge with this score must be reported as a danger segment.
    #[inline]
    pub fn is_flagged(&self, risk: f64) -> bool {
        risk >= self.warning
    }
}
