//! Error types for cutter construction, reopen and edits.

use hyperbevel_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while building or editing a cutter.
///
/// The reopen variants print the short diagnostic strings shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutterError {
    /// No edge carries the center gizmo tag.
    #[error("no center edges")]
    NoCenterEdges,

    /// The center edges form more than one strip.
    #[error("multiple center-edge loops")]
    MultipleCenterLoops(usize),

    /// Some face is not bordered by a center edge, or a center edge does not
    /// have exactly two faces.
    #[error("face count mismatch")]
    FaceCountMismatch,

    /// The base ribbon contains a face that is not a quad.
    #[error("non-quad faces")]
    NonQuadFaces,

    /// An end extension moves past its limit.
    #[error("invalid extend {0}")]
    InvalidExtend(f64),

    /// A width that is not strictly positive, or would flip a rail.
    #[error("invalid width {0}")]
    InvalidWidth(f64),

    /// A custom profile needs at least two points.
    #[error("custom profile needs at least 2 points, got {0}")]
    InvalidProfile(usize),

    /// A sequence has fewer than two triples.
    #[error("sequence {0} has too few vertices for a ribbon")]
    TooShort(usize),

    /// Mesh editing failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Result type for cutter operations.
pub type Result<T> = std::result::Result<T, CutterError>;
