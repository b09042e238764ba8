//! `fl-coverage` — policy-guided coverage rollouts for a snow-plow vehicle.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`bitset`]    | `EdgeBitset` — growable uncovered-edge set, hex codec         |
//! | [`tabu`]      | `TabuQueue<T>` — bounded FIFO recency buffer                  |
//! | [`graph`]     | `CoverageGraph` — undirected edge index over a `RoadNetwork`  |
//! | [`state`]     | `CoverageState`, `Phase`                                      |
//! | [`policy`]    | `PolicyTable`, `PolicyArtifact`, `PolicyStore`                |
//! | [`evaluator`] | `CoveragePolicy` trait, `PolicyEvaluator`                     |
//! | [`planner`]   | `CoverageRoutePlanner`, `CoveragePlan`                        |
//! | [`error`]     | `CoverageError`, `CoverageResult<T>`                          |
//!
//! # Rollout (summary)
//!
//! ```text
//! state = (start, all edges uncovered)
//! repeat up to step_limit:
//!     next = argmax over neighbours a of  Q[(state, a)] + w · frontier(a)
//!            (recently visited neighbours skipped unless nothing else is left)
//!     state.step(next)
//!     stop when every edge is covered
//! append the shortest way back to start
//! ```
//!
//! The rollout is greedy and bounded; it does not guarantee full coverage
//! or minimal re-traversal.

pub mod bitset;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod planner;
pub mod policy;
pub mod state;
pub mod tabu;


pub use bitset::EdgeBitset;
pub use error::{CoverageError, CoverageResult};
pub use evaluator::{CoveragePolicy, PolicyEvaluator};
pub use graph::CoverageGraph;
pub use planner::{CoveragePlan, CoverageRoutePlanner};
pub use policy::{PolicyArtifact, PolicyEntry, PolicyStore, PolicyTable, POLICY_FORMAT_VERSION};
pub use state::{CoverageState, Phase};
pub use tabu::TabuQueue;
