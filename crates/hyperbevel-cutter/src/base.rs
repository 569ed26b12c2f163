//! Base cutter data: one `(left, center, right)` triple per sequence vertex.

use std::collections::HashMap;

use hyperbevel_analyze::{Analysis, Sequence, Side, SweepOption, VertexRecord};
use hyperbevel_math::{intersect_line_line, Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CutterError, Result};

/// Addresses one side of one vertex of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepKey {
    /// Sequence index.
    pub sequence: usize,
    /// Vertex index within the sequence.
    pub index: usize,
    /// Side.
    pub side: Side,
}

/// Which end of an open sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequenceEnd {
    /// Index 0. Extends along `-dir`.
    First,
    /// The last index. Extends along `+dir`.
    Last,
}

impl SequenceEnd {
    /// The end a vertex index belongs to. Anything but 0 counts as the last.
    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            SequenceEnd::First
        } else {
            SequenceEnd::Last
        }
    }

    /// The other end.
    pub fn opposite(self) -> Self {
        match self {
            SequenceEnd::First => SequenceEnd::Last,
            SequenceEnd::Last => SequenceEnd::First,
        }
    }

    /// Vertex index of this end in a sequence of `len` vertices.
    pub fn index(self, len: usize) -> usize {
        match self {
            SequenceEnd::First => 0,
            SequenceEnd::Last => len.saturating_sub(1),
        }
    }
}

/// User choices that replace the analysis defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustments {
    /// Sweep option per side.
    pub sweeps: HashMap<SweepKey, SweepOption>,
    /// Extend amount per open end.
    pub extends: HashMap<(usize, SequenceEnd), f64>,
}

impl Adjustments {
    /// The option in effect for a side.
    pub fn sweep(&self, key: SweepKey, record: &VertexRecord) -> SweepOption {
        self.sweeps
            .get(&key)
            .copied()
            .unwrap_or(record.side(key.side).default)
    }

    /// The extend amount in effect for an end.
    pub fn extend(&self, sequence: usize, end: SequenceEnd, default: f64) -> f64 {
        self.extends.get(&(sequence, end)).copied().unwrap_or(default)
    }
}

/// One cross-section of the ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// Left rail point.
    pub left: Point3,
    /// Spine point.
    pub center: Point3,
    /// Right rail point.
    pub right: Point3,
}

impl Triple {
    /// All three points, left to right.
    pub fn points(&self) -> [Point3; 3] {
        [self.left, self.center, self.right]
    }

    /// Rail point on `side`.
    pub fn rail(&self, side: Side) -> Point3 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Shift every point by `offset`.
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            left: self.left + offset,
            center: self.center + offset,
            right: self.right + offset,
        }
    }
}

/// Triples for one sequence, in host-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSequence {
    /// The spine closes.
    pub cyclic: bool,
    /// Polarity of the host edges.
    pub convex: bool,
    /// One triple per vertex.
    pub triples: Vec<Triple>,
    /// Outward extend direction at the first and last vertex.
    pub extend_dirs: [Vec3; 2],
    /// Extend applied at the first and last vertex.
    pub extends: [f64; 2],
}

impl BaseSequence {
    /// Extend direction at an end.
    pub fn extend_dir(&self, end: SequenceEnd) -> Vec3 {
        match end {
            SequenceEnd::First => self.extend_dirs[0],
            SequenceEnd::Last => self.extend_dirs[1],
        }
    }

    /// Extend amount at an end.
    pub fn extend(&self, end: SequenceEnd) -> f64 {
        match end {
            SequenceEnd::First => self.extends[0],
            SequenceEnd::Last => self.extends[1],
        }
    }
}

/// Base cutter data for every sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseCutter {
    /// Width the triples were built with.
    pub width: f64,
    /// One entry per analyzed sequence.
    pub sequences: Vec<BaseSequence>,
}

/// Build parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseParams {
    /// Ribbon half-width. Must be positive.
    pub width: f64,
    /// Default extend at convex open ends, as a fraction of the width.
    pub extend_factor: f64,
}

impl Default for BaseParams {
    fn default() -> Self {
        Self {
            width: 0.1,
            extend_factor: 0.02,
        }
    }
}

/// Rail point for one side of a vertex under `option`.
///
/// `FACE_DIR` offsets along the face direction by `width * shell_factor`.
/// Any other option slides that point along the walk tangent until it meets
/// the chosen direction's line through the vertex. Options without a
/// direction, and parallel lines, fall back to the face offset.
pub fn sweep_co(record: &VertexRecord, side: Side, option: SweepOption, width: f64) -> Point3 {
    let data = record.side(side);
    let face_co = record.co + data.face_dir * width * record.shell_factor;
    if option == SweepOption::FaceDir {
        return face_co;
    }
    let Some(sweep_dir) = data.direction(option) else {
        return face_co;
    };
    intersect_line_line(
        &face_co,
        &(face_co + record.dir),
        &record.co,
        &(record.co + sweep_dir),
    )
    .map_or(face_co, |(_, on_sweep)| on_sweep)
}

/// Build triples for every sequence of `analysis`.
pub fn build_base(analysis: &Analysis, params: &BaseParams, adjustments: &Adjustments) -> Result<BaseCutter> {
    if !(params.width > 0.0 && params.width.is_finite()) {
        return Err(CutterError::InvalidWidth(params.width));
    }

    let sequences = analysis
        .sequences
        .iter()
        .enumerate()
        .map(|(sidx, seq)| build_sequence(sidx, seq, params, adjustments))
        .collect::<Result<Vec<_>>>()?;

    debug!(sequences = sequences.len(), width = params.width, "built base cutter data");
    Ok(BaseCutter {
        width: params.width,
        sequences,
    })
}

fn build_sequence(sidx: usize, seq: &Sequence, params: &BaseParams, adjustments: &Adjustments) -> Result<BaseSequence> {
    if seq.len() < 2 {
        return Err(CutterError::TooShort(sidx));
    }
    let width = params.width;

    let mut triples: Vec<Triple> = seq
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let rail = |side| {
                let option = adjustments.sweep(
                    SweepKey {
                        sequence: sidx,
                        index,
                        side,
                    },
                    record,
                );
                sweep_co(record, side, option, width)
            };
            Triple {
                left: rail(Side::Left),
                center: record.co,
                right: rail(Side::Right),
            }
        })
        .collect();

    let last = triples.len() - 1;
    let extend_dirs = [-seq.records[0].dir, seq.records[last].dir];
    let mut extends = [0.0; 2];
    if !seq.cyclic {
        let default = if seq.convex { params.extend_factor * width } else { 0.0 };
        for (slot, end) in [SequenceEnd::First, SequenceEnd::Last].into_iter().enumerate() {
            let amount = adjustments.extend(sidx, end, default);
            let index = end.index(triples.len());
            triples[index] = triples[index].translated(&(extend_dirs[slot] * amount));
            extends[slot] = amount;
        }
    }

    Ok(BaseSequence {
        cyclic: seq.cyclic,
        convex: seq.convex,
        triples,
        extend_dirs,
        extends,
    })
}

impl BaseCutter {
    /// Every sweep and rail segment in world space: `(left, center)` and
    /// `(center, right)` per triple, then both rails.
    pub fn sweep_lines(&self, transform: &Transform) -> Vec<[Point3; 2]> {
        let mut lines = Vec::new();
        for seq in &self.sequences {
            let n = seq.triples.len();
            for (i, t) in seq.triples.iter().enumerate() {
                let [l, c, r] = t.points().map(|p| transform.apply_point(&p));
                lines.push([l, c]);
                lines.push([c, r]);

                let next = if i + 1 < n {
                    Some(i + 1)
                } else if seq.cyclic {
                    Some(0)
                } else {
                    None
                };
                if let Some(j) = next {
                    let other = &seq.triples[j];
                    lines.push([l, transform.apply_point(&other.left)]);
                    lines.push([r, transform.apply_point(&other.right)]);
                }
            }
        }
        lines
    }

    /// The world-space sweep segment `(center, rail)` for one side.
    pub fn individual_sweep(&self, key: SweepKey, transform: &Transform) -> Option<[Point3; 2]> {
        let triple = self.sequences.get(key.sequence)?.triples.get(key.index)?;
        Some([
            transform.apply_point(&triple.center),
            transform.apply_point(&triple.rail(key.side)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hyperbevel_analyze::{analyze, AnalyzeOptions};
    use hyperbevel_mesh::primitives;
    use hyperbevel_select::VertSequence;

    fn cube_edge_analysis() -> Analysis {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let seqs = [VertSequence {
            verts: vec![ids[4], ids[5]],
            cyclic: false,
        }];
        analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap()
    }

    #[test]
    fn test_single_edge_triples() {
        let analysis = cube_edge_analysis();
        let base = build_base(&analysis, &BaseParams::default(), &Adjustments::default()).unwrap();
        let seq = &base.sequences[0];
        assert_eq!(seq.triples.len(), 2);

        let first = seq.triples[0];
        assert_relative_eq!(first.center, Point3::new(-1.002, -1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(first.left, Point3::new(-1.002, -0.9, 1.0), epsilon = 1e-12);
        assert_relative_eq!(first.right, Point3::new(-1.002, -1.0, 0.9), epsilon = 1e-12);

        let last = seq.triples[1];
        assert_relative_eq!(last.center, Point3::new(1.002, -1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(seq.extends[0], 0.002);
    }

    #[test]
    fn test_inbetween_rails_stay_on_side_face() {
        let (mesh, ids) = primitives::split_box_edge().to_mesh().unwrap();
        let seqs = [VertSequence {
            verts: ids[0..5].to_vec(),
            cyclic: false,
        }];
        let analysis = analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap();
        let base = build_base(&analysis, &BaseParams::default(), &Adjustments::default()).unwrap();

        for triple in &base.sequences[0].triples {
            let right = triple.rail(Side::Right);
            assert_relative_eq!(right.y, 0.0, epsilon = 1e-9);
            assert_relative_eq!(right.z, 0.9, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_width_scales_rail_offsets() {
        let analysis = cube_edge_analysis();
        let adjust = Adjustments::default();
        let narrow = build_base(&analysis, &BaseParams { width: 0.1, extend_factor: 0.0 }, &adjust).unwrap();
        let wide = build_base(&analysis, &BaseParams { width: 0.2, extend_factor: 0.0 }, &adjust).unwrap();

        for (a, b) in narrow.sequences[0].triples.iter().zip(&wide.sequences[0].triples) {
            assert_relative_eq!((b.left - b.center), (a.left - a.center) * 2.0, epsilon = 1e-12);
            assert_relative_eq!((b.right - b.center), (a.right - a.center) * 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_extend_override_and_reset() {
        let analysis = cube_edge_analysis();
        let mut adjust = Adjustments::default();
        adjust.extends.insert((0, SequenceEnd::Last), 0.5);
        adjust.extends.insert((0, SequenceEnd::First), 0.0);
        let base = build_base(&analysis, &BaseParams::default(), &adjust).unwrap();
        let seq = &base.sequences[0];

        assert_relative_eq!(seq.triples[0].center, Point3::new(-1.0, -1.0, 1.0));
        assert_relative_eq!(seq.triples[1].center, Point3::new(1.5, -1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(seq.extend_dir(SequenceEnd::First), -Vec3::x());
    }

    #[test]
    fn test_override_without_direction_falls_back() {
        let (mesh, ids) = primitives::caret_strip().to_mesh().unwrap();
        let seqs = [VertSequence {
            verts: ids[0..3].to_vec(),
            cyclic: false,
        }];
        let analysis = analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap();
        let record = analysis.record(0, 1).unwrap();

        let face = sweep_co(record, Side::Left, SweepOption::FaceDir, 0.1);
        let missing = sweep_co(record, Side::Left, SweepOption::InbetweenDir, 0.1);
        assert_relative_eq!(face, missing);

        // Center aim at the apex points straight down the face direction.
        let aim = sweep_co(record, Side::Left, SweepOption::CenterAimDir, 0.1);
        assert_relative_eq!(aim, face, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_width() {
        let analysis = cube_edge_analysis();
        let params = BaseParams {
            width: 0.0,
            extend_factor: 0.02,
        };
        let err = build_base(&analysis, &params, &Adjustments::default()).unwrap_err();
        assert_eq!(err, CutterError::InvalidWidth(0.0));
    }

    #[test]
    fn test_sweep_lines_and_individual_sweep() {
        let analysis = cube_edge_analysis();
        let base = build_base(&analysis, &BaseParams::default(), &Adjustments::default()).unwrap();
        let transform = Transform::translation(0.0, 0.0, 1.0);

        // Two sweeps per triple plus two rails between the triples.
        assert_eq!(base.sweep_lines(&transform).len(), 6);

        let key = SweepKey {
            sequence: 0,
            index: 0,
            side: Side::Left,
        };
        let [c, l] = base.individual_sweep(key, &transform).unwrap();
        assert_relative_eq!(c, Point3::new(-1.002, -1.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(l, Point3::new(-1.002, -0.9, 2.0), epsilon = 1e-12);
        assert!(base
            .individual_sweep(SweepKey { index: 5, ..key }, &transform)
            .is_none());
    }
}
