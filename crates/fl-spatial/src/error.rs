//! Spatial-subsystem error type.

use thiserror::Error;

use fl_core::NodeId;

/// Errors produced by `fl-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Destination unreachable from origin.  A normal negative outcome of a
    /// routing query, not a fault.
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("network has no nodes to snap to")]
    EmptyNetwork,

    #[error("risk data error: {0}")]
    RiskData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
