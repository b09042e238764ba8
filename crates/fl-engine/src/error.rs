use fl_core::CoreError;
use fl_coverage::CoverageError;
use fl_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine configuration error: {0}")]
    Config(#[from] CoreError),

    /// The road network is still being built.
    #[error("road network model is not ready yet")]
    NotReady,

    /// Model construction failed; the engine will not serve requests.
    #[error("road network model failed to load: {0}")]
    Failed(String),

    #[error("no policy model available for subdivision {subdivision:?}")]
    ModelUnavailable { subdivision: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request failed unexpectedly (including a contained panic).
    #[error("computation failed: {0}")]
    Computation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<SpatialError> for EngineError {
    fn from(e: SpatialError) -> Self {
        EngineError::Computation(e.to_string())
    }
}

impl From<CoverageError> for EngineError {
    fn from(e: CoverageError) -> Self {
        match e {
            CoverageError::ModelUnavailable { subdivision } => EngineError::ModelUnavailable {
                subdivision: subdivision.unwrap_or_default(),
            },
            CoverageError::InvalidSubdivision(name) => {
                EngineError::InvalidRequest(format!("invalid subdivision name {name:?}"))
            }
            other => EngineError::Computation(other.to_string()),
        }
    }
}
