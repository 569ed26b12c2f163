#![warn(missing_docs)]

//! Edge selection for the hyperbevel core.
//!
//! Picks the edge under the pointer, grows it into a loop by bend angle,
//! moves selections between a host mesh and its welded twin, and sorts the
//! final edge set into ordered vertex sequences.

pub mod partition;
pub mod pick;
pub mod selection;
pub mod walk;

pub use partition::{partition, VertSequence};
pub use pick::{best_edge_on_face, pick_active_edge, transfer, transfer_active, EdgeRecord, EdgeSource, Pick, SelectTarget};
pub use selection::{EdgeSelection, SelectMode};
pub use walk::{angle_between_edges, grow_loop};
