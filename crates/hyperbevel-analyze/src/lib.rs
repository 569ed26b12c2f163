#![warn(missing_docs)]

//! Sweep direction analysis for the hyperbevel core.
//!
//! For every vertex of every selected edge sequence this crate works out the
//! directions a cutter ribbon may sweep towards on either side of the
//! sequence:
//!
//! - `FACE_DIR`: in the side face, perpendicular to the walk. Always present.
//! - `EDGE_DIR`: along a non-sequence edge leaving the vertex on that side.
//! - `CENTER_AIM_DIR`: towards the midpoint of two opposing side-edge
//!   carriers around a gap.
//! - `INBETWEEN_DIR`: a distance-weighted blend of the nearest side-edge
//!   directions around a gap.
//!
//! Each side also gets a default chosen by a handful of geometric rules.
//! Defaults within one gap run are kept consistent.

pub mod analyze;
pub mod error;
mod gaps;
pub mod options;
pub mod record;
mod scaffold;
mod sides;

pub use analyze::{analyze, AnalyzeOptions};
pub use error::{AnalyzeError, Result};
pub use options::{HostKind, Side, SweepOption, SweepOptions};
pub use record::{Analysis, GapInfo, GapNeighbour, Sequence, SideData, VertexRecord};
pub use sides::{END_EDGE_PARALLEL, NEIGHBOUR_PARALLEL};
pub use gaps::OPPOSING_DOT;
