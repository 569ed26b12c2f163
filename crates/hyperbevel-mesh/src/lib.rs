#![warn(missing_docs)]

//! Half-edge mesh for the hyperbevel core.
//!
//! A BMesh-style polygon mesh: vertices, edges with a radial list of loops,
//! faces made of loops, and loops that know their vertex, edge, face and
//! their neighbours in the face cycle. Elements are addressed by slotmap keys
//! so removals never invalidate unrelated handles.
//!
//! Edges and faces carry an integer `gizmo` tag. The cutter builder marks
//! spine edges and end caps with it so an existing cutter can be re-parsed.

pub mod error;
pub mod ops;
pub mod polygon;
pub mod primitives;
pub mod query;
pub mod raycast;
pub mod topology;
pub mod weld;

pub use error::{MeshError, Result};
pub use ops::ExtrudeRegion;
pub use polygon::PolygonMesh;
pub use raycast::{Aabb3, MeshHit, RaycastCache, Ray};
pub use topology::{Edge, EdgeId, Face, FaceId, Loop, LoopId, Mesh, Vert, VertId};
pub use weld::{weld, Welded};
