//! `fl-core` — foundational types for the `frostline` routing engine.
//!
//! This crate is a dependency of every other `fl-*` crate.  It has no
//! `fl-*` dependencies and minimal external ones (only `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`, `SegmentId`                           |
//! | [`geo`]     | `GeoPoint`, haversine and squared-coordinate distances    |
//! | [`risk`]    | `RiskScores`, `RiskLevel`, `RiskThresholds`               |
//! | [`config`]  | `EngineConfig`, `CoverageConfig`                          |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod risk;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{CoverageConfig, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, EARTH_RADIUS_M};
pub use ids::{EdgeId, NodeId, SegmentId};
pub use risk::{RiskLevel, RiskScores, RiskThresholds};
