//! Sweep option tags and sides.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One candidate sweep direction.
///
/// The declaration order is the tie-break and cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepOption {
    /// In the side face, perpendicular to the walk.
    #[default]
    FaceDir,
    /// Along the side edge.
    EdgeDir,
    /// Towards the midpoint of two opposing side-edge carriers.
    CenterAimDir,
    /// Blend of the nearest side-edge directions across a gap.
    InbetweenDir,
}

impl SweepOption {
    /// Every option, in cycling order.
    pub const ALL: [SweepOption; 4] = [
        SweepOption::FaceDir,
        SweepOption::EdgeDir,
        SweepOption::CenterAimDir,
        SweepOption::InbetweenDir,
    ];

    /// The flag for this option.
    pub fn flag(self) -> SweepOptions {
        match self {
            SweepOption::FaceDir => SweepOptions::FACE_DIR,
            SweepOption::EdgeDir => SweepOptions::EDGE_DIR,
            SweepOption::CenterAimDir => SweepOptions::CENTER_AIM_DIR,
            SweepOption::InbetweenDir => SweepOptions::INBETWEEN_DIR,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            SweepOption::FaceDir => "FACE_DIR",
            SweepOption::EdgeDir => "EDGE_DIR",
            SweepOption::CenterAimDir => "CENTER_AIM_DIR",
            SweepOption::InbetweenDir => "INBETWEEN_DIR",
        }
    }
}

bitflags! {
    /// The set of sweep options available on one side of a vertex.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SweepOptions: u8 {
        /// Face direction. Always present.
        const FACE_DIR = 0b0001;
        /// Side-edge direction.
        const EDGE_DIR = 0b0010;
        /// Center-aim direction.
        const CENTER_AIM_DIR = 0b0100;
        /// Inbetween direction.
        const INBETWEEN_DIR = 0b1000;
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions::FACE_DIR
    }
}

impl SweepOptions {
    /// Whether `option` is available.
    pub fn has(self, option: SweepOption) -> bool {
        self.contains(option.flag())
    }

    /// Available options in cycling order.
    pub fn options(self) -> impl Iterator<Item = SweepOption> {
        SweepOption::ALL.into_iter().filter(move |o| self.has(*o))
    }

    /// The option after `current`, wrapping around.
    ///
    /// If `current` is not available the first available option is returned.
    pub fn step(self, current: SweepOption) -> SweepOption {
        let available: Vec<SweepOption> = self.options().collect();
        match available.iter().position(|&o| o == current) {
            Some(i) => available[(i + 1) % available.len()],
            None => available.first().copied().unwrap_or_default(),
        }
    }
}

/// Side of a sequence, relative to the walk direction and surface normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Along `normal x dir`.
    Left,
    /// Along `-(normal x dir)`.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// The other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// What kind of object the host mesh is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostKind {
    /// Any mesh.
    #[default]
    Mesh,
    /// A cylinder primitive. Inbetween directions never become the default.
    Cylinder,
}
