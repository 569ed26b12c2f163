//! Error types for mesh construction and editing.

use thiserror::Error;

use crate::{FaceId, VertId};

/// Errors that can occur while building or editing a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A face was given fewer than three vertices.
    #[error("face needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// A face lists the same vertex twice.
    #[error("face repeats vertex {0:?}")]
    RepeatedVertex(VertId),

    /// A vertex handle does not belong to this mesh.
    #[error("vertex {0:?} is not part of the mesh")]
    MissingVertex(VertId),

    /// A face handle does not belong to this mesh.
    #[error("face {0:?} is not part of the mesh")]
    MissingFace(FaceId),

    /// A polygon index points past the position list.
    #[error("vertex index {index} out of range ({len} positions)")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of positions available.
        len: usize,
    },

    /// The faces handed to a dissolve do not bound a single disk.
    #[error("faces do not form a single dissolvable region")]
    NotDissolvable,
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
