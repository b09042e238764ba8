use fl_core::NodeId;
use fl_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverageError {
    /// No pretrained policy is loaded for the requested subdivision.  A
    /// reportable condition; no rollout is attempted.
    #[error("no policy model available for {}", .subdivision.as_deref().unwrap_or("the requested subdivision"))]
    ModelUnavailable { subdivision: Option<String> },

    #[error("invalid subdivision name {0:?}")]
    InvalidSubdivision(String),

    #[error("policy artifact error: {0}")]
    PolicyFormat(String),

    #[error("node {0} not found in coverage graph")]
    NodeNotFound(NodeId),

    #[error("routing failed: {0}")]
    Routing(#[from] SpatialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoverageResult<T> = Result<T, CoverageError>;
