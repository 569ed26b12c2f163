//! Analysis output: per-side data, per-vertex records and sequences.

use hyperbevel_math::{Point3, Vec3};
use hyperbevel_mesh::{EdgeId, FaceId, LoopId, VertId};
use serde::Serialize;

use crate::options::{Side, SweepOption, SweepOptions};

/// The nearest vertex on one side of a gap that carries a side edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GapNeighbour {
    /// Sequence index of the carrier vertex.
    pub index: usize,
    /// Hops from the gap vertex to the carrier.
    pub steps: usize,
    /// Summed edge length from the gap vertex to the carrier.
    pub distance: f64,
    /// The carrier's side-edge direction, if it has a usable one.
    pub edge_dir: Option<Vec3>,
    /// The carrier defaults to its side edge.
    pub in_use: bool,
}

impl GapNeighbour {
    /// The carrier's edge direction, if the carrier actually sweeps along it.
    pub fn valid_dir(&self) -> Option<Vec3> {
        if self.in_use {
            self.edge_dir
        } else {
            None
        }
    }
}

/// Walk results for a vertex with no side edge on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GapInfo {
    /// Nearest carrier walking backwards.
    pub prev: Option<GapNeighbour>,
    /// Nearest carrier walking forwards.
    pub next: Option<GapNeighbour>,
}

/// Everything known about one side of a sequence vertex.
#[derive(Debug, Clone, Serialize)]
pub struct SideData {
    /// Face on this side.
    #[serde(skip)]
    pub face: FaceId,
    /// Non-sequence edge on this side, if any.
    #[serde(skip)]
    pub edge: Option<EdgeId>,
    /// `normal x dir` for the left side, its negation for the right.
    pub dir: Vec3,
    /// Unit vector in the side face perpendicular to the walk.
    pub face_dir: Vec3,
    /// Unit direction along the side edge.
    pub edge_dir: Option<Vec3>,
    /// Unit direction to the midpoint of two opposing carriers.
    pub center_aim_dir: Option<Vec3>,
    /// Face-projected blend of the neighbouring side-edge directions.
    pub inbetween_dir: Option<Vec3>,
    /// Set when this side has no side edge.
    pub gap: Option<GapInfo>,
    /// Available options.
    pub options: SweepOptions,
    /// Chosen option.
    pub default: SweepOption,
}

impl SideData {
    pub(crate) fn new(face: FaceId) -> Self {
        Self {
            face,
            edge: None,
            dir: Vec3::zeros(),
            face_dir: Vec3::zeros(),
            edge_dir: None,
            center_aim_dir: None,
            inbetween_dir: None,
            gap: None,
            options: SweepOptions::FACE_DIR,
            default: SweepOption::FaceDir,
        }
    }

    /// Direction for `option`, if that option was computed.
    pub fn direction(&self, option: SweepOption) -> Option<Vec3> {
        match option {
            SweepOption::FaceDir => Some(self.face_dir),
            SweepOption::EdgeDir => self.edge_dir,
            SweepOption::CenterAimDir => self.center_aim_dir,
            SweepOption::InbetweenDir => self.inbetween_dir,
        }
    }

    /// Direction for `option`, falling back to the face direction.
    pub fn sweep_dir(&self, option: SweepOption) -> Vec3 {
        self.direction(option).unwrap_or(self.face_dir)
    }
}

/// Per-vertex analysis record.
#[derive(Debug, Clone, Serialize)]
pub struct VertexRecord {
    /// The mesh vertex.
    #[serde(skip)]
    pub vert: VertId,
    /// Its position.
    pub co: Point3,
    /// Sequence index of the previous vertex.
    pub prev: Option<usize>,
    /// Sequence index of the next vertex.
    pub next: Option<usize>,
    /// Edge to the previous vertex.
    #[serde(skip)]
    pub prev_edge: Option<EdgeId>,
    /// Edge to the next vertex.
    #[serde(skip)]
    pub next_edge: Option<EdgeId>,
    /// Corner at this vertex along `next_edge`, or the previous vertex's
    /// corner at the last vertex of an open sequence.
    #[serde(skip)]
    pub corner: LoopId,
    /// `corner` belongs to the previous vertex.
    pub corner_from_prev: bool,
    /// Unit walk tangent.
    pub dir: Vec3,
    /// Edge-averaged surface normal.
    pub normal: Vec3,
    /// `1 / sin(angle / 2)` for the bend angle at this vertex.
    pub shell_factor: f64,
    /// Left side.
    pub left: SideData,
    /// Right side.
    pub right: SideData,
}

impl VertexRecord {
    /// One side.
    pub fn side(&self, side: Side) -> &SideData {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// One side, mutably.
    pub fn side_mut(&mut self, side: Side) -> &mut SideData {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// An analyzed vertex sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Sequence {
    /// Vertices in walk order.
    #[serde(skip)]
    pub verts: Vec<VertId>,
    /// The walk closes.
    pub cyclic: bool,
    /// Polarity, from the first edge.
    pub convex: bool,
    /// Sequence edges, in walk order.
    #[serde(skip)]
    pub edges: Vec<EdgeId>,
    /// One record per vertex, parallel to `verts`.
    pub records: Vec<VertexRecord>,
    /// Runs of indices with no left side edge.
    pub left_gaps: Vec<Vec<usize>>,
    /// Runs of indices with no right side edge.
    pub right_gaps: Vec<Vec<usize>>,
}

impl Sequence {
    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No vertices.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index before `idx`, wrapping when cyclic.
    pub fn prev_index(&self, idx: usize) -> Option<usize> {
        prev_index(idx, self.len(), self.cyclic)
    }

    /// Index after `idx`, wrapping when cyclic.
    pub fn next_index(&self, idx: usize) -> Option<usize> {
        next_index(idx, self.len(), self.cyclic)
    }

    /// First or last vertex of an open sequence.
    pub fn is_end(&self, idx: usize) -> bool {
        !self.cyclic && (idx == 0 || idx + 1 == self.len())
    }

    /// Raw gap runs for one side.
    pub fn gaps(&self, side: Side) -> &[Vec<usize>] {
        match side {
            Side::Left => &self.left_gaps,
            Side::Right => &self.right_gaps,
        }
    }

    /// Gap runs with the wrap-around run joined for cyclic sequences.
    ///
    /// The joined run comes first and is listed in walk order, from the
    /// tail run across index 0 into the head run.
    pub fn merged_gaps(&self, side: Side) -> Vec<Vec<usize>> {
        let gaps = self.gaps(side);
        if self.cyclic && gaps.len() > 1 {
            let first = &gaps[0];
            let last = &gaps[gaps.len() - 1];
            if first.contains(&0) && last.contains(&(self.len() - 1)) {
                let mut joined = last.clone();
                joined.extend_from_slice(first);
                let mut merged = vec![joined];
                merged.extend(gaps[1..gaps.len() - 1].iter().cloned());
                return merged;
            }
        }
        gaps.to_vec()
    }
}

pub(crate) fn prev_index(idx: usize, len: usize, cyclic: bool) -> Option<usize> {
    if cyclic {
        Some((idx + len - 1) % len)
    } else {
        idx.checked_sub(1)
    }
}

pub(crate) fn next_index(idx: usize, len: usize, cyclic: bool) -> Option<usize> {
    if cyclic {
        Some((idx + 1) % len)
    } else if idx + 1 < len {
        Some(idx + 1)
    } else {
        None
    }
}

/// Output of [`crate::analyze`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    /// One entry per input sequence.
    pub sequences: Vec<Sequence>,
    /// Degenerate geometry was worked around. Welding would likely help.
    pub weld_suggestion: bool,
    /// Some side offers an inbetween direction.
    pub has_inbetween_align: bool,
    /// Some side offers a center-aim direction.
    pub has_center_aim: bool,
    /// Some side defaults to an inbetween direction.
    pub use_inbetween_align: bool,
    /// Some side defaults to a center-aim direction.
    pub use_center_aim: bool,
}

impl Analysis {
    /// Record for vertex `idx` of sequence `seq`.
    pub fn record(&self, seq: usize, idx: usize) -> Option<&VertexRecord> {
        self.sequences.get(seq)?.records.get(idx)
    }

    /// Recompute the four capability flags from the current defaults.
    pub fn refresh_flags(&mut self) {
        let sides = || {
            self.sequences
                .iter()
                .flat_map(|s| s.records.iter())
                .flat_map(|r| [&r.left, &r.right])
        };
        let has_inbetween = sides().any(|s| s.options.has(SweepOption::InbetweenDir));
        let has_center = sides().any(|s| s.options.has(SweepOption::CenterAimDir));
        let use_inbetween = sides().any(|s| s.default == SweepOption::InbetweenDir);
        let use_center = sides().any(|s| s.default == SweepOption::CenterAimDir);
        self.has_inbetween_align = has_inbetween;
        self.has_center_aim = has_center;
        self.use_inbetween_align = use_inbetween;
        self.use_center_aim = use_center;
    }

    /// Switch every inbetween-capable side to `INBETWEEN_DIR` or back to
    /// `FACE_DIR`, then re-apply gap consistency.
    pub fn set_global_inbetween_align(&mut self, on: bool) {
        self.set_global(SweepOption::InbetweenDir, on);
        for seq in &mut self.sequences {
            crate::gaps::enforce_gap_consistency(seq);
        }
        self.refresh_flags();
    }

    /// Switch every center-aim-capable side to `CENTER_AIM_DIR` or back to
    /// `FACE_DIR`.
    pub fn set_global_center_aim(&mut self, on: bool) {
        self.set_global(SweepOption::CenterAimDir, on);
        self.refresh_flags();
    }

    fn set_global(&mut self, option: SweepOption, on: bool) {
        for record in self.sequences.iter_mut().flat_map(|s| s.records.iter_mut()) {
            for side in Side::BOTH {
                let data = record.side_mut(side);
                if data.options.has(option) {
                    data.default = if on { option } else { SweepOption::FaceDir };
                }
            }
        }
    }
}
