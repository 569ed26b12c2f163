//! Error types for sequence analysis.

use hyperbevel_mesh::{EdgeId, VertId};
use thiserror::Error;

/// Errors that can occur while analyzing a vertex sequence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzeError {
    /// A sequence with fewer than two vertices, or a cycle shorter than three.
    #[error("sequence needs at least 2 vertices (3 when cyclic), got {0}")]
    EmptySequence(usize),

    /// Two consecutive sequence vertices are not connected.
    #[error("no edge between sequence vertices {0:?} and {1:?}")]
    MissingEdge(VertId, VertId),

    /// A sequence edge has no faces.
    #[error("sequence edge {0:?} has no faces")]
    WireEdge(EdgeId),

    /// A boundary edge whose only face runs against the walk direction.
    #[error("boundary edge {0:?} has no face corner along the walk direction")]
    ReversedBoundary(EdgeId),
}

/// Result type for analysis.
pub type Result<T> = std::result::Result<T, AnalyzeError>;
