#![warn(missing_docs)]

//! Cutter construction for the hyperbevel core.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`build_base`] turns an [`Analysis`](hyperbevel_analyze::Analysis) into
//!    `(left, center, right)` triples per sequence vertex.
//! 2. [`build_ribbon`] stitches the triples into a two-strip quad ribbon with
//!    the spine edges tagged.
//! 3. [`finish`] extrudes the ribbon into a closed solid, caps open ends and
//!    fixes the winding for the host boolean.
//!
//! A committed solid can be taken apart again with [`reopen`], edited, and
//! finished once more. [`modifiers`] and [`stack`] describe what the host
//! should attach and where in its modifier stack it goes.

pub mod base;
pub mod error;
pub mod finish;
pub mod modifiers;
pub mod profile;
pub mod reopen;
pub mod ribbon;
pub mod stack;

pub use base::{build_base, sweep_co, Adjustments, BaseCutter, BaseParams, BaseSequence, SequenceEnd, SweepKey, Triple};
pub use error::{CutterError, Result};
pub use finish::{finish, FinishParams, FinishedCutter, CAP_PARALLEL};
pub use modifiers::{
    BevelRequest, BevelShape, BooleanOperation, BooleanRequest, BooleanSolver, ModifierRequest, ProfileType,
    WeldRequest, EDGE_BEVEL, HYPER_BEVEL, WELD,
};
pub use profile::{CustomProfile, ProfilePoint};
pub use reopen::{reopen, ReopenedCutter, EXTEND_LIMIT};
pub use ribbon::{build_ribbon, center_edges, BaseRibbon, CAP_FACE, CENTER_EDGE};
pub use stack::{Modifier, ModifierKind, ModifierStack, Prefix, StackDirection};
