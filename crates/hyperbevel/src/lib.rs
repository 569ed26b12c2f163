#![warn(missing_docs)]

//! Interactive sweep-cutter bevels.
//!
//! This crate ties the hyperbevel core together into a session a UI can
//! drive:
//!
//! - [`session`]: the [`Session`] state machine, from picking edges through
//!   the width drag and live adjustment to commit or cancel.
//! - [`scene`]: the host object, its modifier stack and the cutter objects.
//! - [`gizmo`]: sweep buttons, end extends and the width handle.
//! - [`edit`]: finishing hand-edited cutters and reopening committed ones.
//! - [`snap`] and [`preview`]: raycast helpers and draw streams.
//!
//! # Example
//!
//! ```no_run
//! use hyperbevel::{Command, HyperBevelConfig, BevelSettings, HostObject, Scene, Session};
//! use hyperbevel_math::{Point3, Vec3};
//! use hyperbevel_mesh::primitives;
//!
//! let (mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
//! let scene = Scene::new(HostObject::new("Cube", mesh));
//! let mut session = Session::new(scene, HyperBevelConfig::default(), BevelSettings::default());
//!
//! session.handle(Command::Begin);
//! session.handle(Command::PickEdge { origin: Point3::new(0.1, -0.9, 5.0), dir: -Vec3::z() });
//! session.handle(Command::BeginDrag);
//! session.handle(Command::EnterAdjust);
//! session.handle(Command::Commit);
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod gizmo;
pub mod preview;
pub mod scene;
pub mod session;
pub mod snap;

pub use config::{BevelSettings, HyperBevelConfig, SettingsStore};
pub use edit::{apply_reopened, finalize_cutter, reopen_cutter};
pub use error::{HyperBevelError, Result};
pub use gizmo::{GizmoEvent, GizmoState, Highlight, PushUpdate};
pub use preview::{LineLayer, Preview};
pub use scene::{CutterExport, CutterManifest, CutterObject, EditKeys, HostObject, Scene, CUTTER_NAME};
pub use session::{Command, Outcome, Phase, Session};
pub use snap::{SceneHit, SnapCache, SnapHit};
