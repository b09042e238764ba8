//! `fl-engine` — request boundary of the frostline engine.
//!
//! Owns the served road model and turns the lower crates' results into
//! request outcomes:
//!
//! | Situation                            | Outcome                              |
//! |--------------------------------------|--------------------------------------|
//! | model still building                 | `EngineError::NotReady`              |
//! | model construction failed            | `EngineError::Failed`                |
//! | risk dataset absent                  | zero risk scores, warning logged     |
//! | no route between the endpoints       | `Ok(None)`                           |
//! | no policy for the subdivision        | `EngineError::ModelUnavailable`      |
//! | anything else, panics included       | `EngineError::Computation`, logged   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use fl_core::{EngineConfig, GeoPoint};
//! use fl_engine::Engine;
//! use fl_spatial::TravelMode;
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! engine.load(builder)?;
//! let report = engine.find_path(start, end, TravelMode::Safe)?;
//! let plan = engine.plan_coverage("gangnam", depot)?;
//! ```

pub mod engine;
pub mod error;


pub use engine::{Engine, Readiness};
pub use error::{EngineError, EngineResult};
