//! Reopening a committed cutter: recover its base ribbon, edit width and
//! ends, then finish it again.

use hyperbevel_math::{closest_point_on_line, midpoint, normalized, Point3, Vec3};
use hyperbevel_mesh::{FaceId, Mesh, VertId};
use tracing::{debug, info};

use crate::base::SequenceEnd;
use crate::error::{CutterError, Result};
use crate::finish::{finish, FinishParams, FinishedCutter};
use crate::modifiers::BooleanOperation;
use crate::ribbon::{center_edges, BaseRibbon};

/// Fraction of the end span an end may retract to, measured from the
/// neighbouring spine vertex.
pub const EXTEND_LIMIT: f64 = 0.1;

/// A committed cutter stripped back to its base ribbon.
#[derive(Debug, Clone)]
pub struct ReopenedCutter {
    ribbon: BaseRibbon,
    /// `[left, right]` rail vertex per spine vertex.
    rails: Vec<[VertId; 2]>,
    width: f64,
}

/// Parse a finished cutter back into its base ribbon.
///
/// Polarity comes from the host boolean, not from the mesh: a union means
/// the cutter fills a concave edge. Every face not bordering a center edge
/// is removed; for convex cutters the remaining faces are flipped back to
/// their ribbon winding. Without a persisted `width`, it is measured from the
/// rails.
pub fn reopen(mut mesh: Mesh, operation: BooleanOperation, width: Option<f64>) -> Result<ReopenedCutter> {
    let convex = operation.is_convex();

    let center = center_edges(&mesh);
    if center.is_empty() {
        info!("reopen failed: no center edges");
        return Err(CutterError::NoCenterEdges);
    }
    let keep: Vec<FaceId> = {
        let mut faces: Vec<FaceId> = center.iter().flat_map(|&e| mesh.edge_faces(e)).collect();
        faces.sort();
        faces.dedup();
        faces
    };
    let drop: Vec<FaceId> = mesh.faces().filter(|f| !keep.contains(f)).collect();
    mesh.delete_faces(&drop);
    if convex {
        mesh.reverse_faces(&keep);
    }

    let ribbon = BaseRibbon::parse(mesh, Some(convex)).inspect_err(|err| info!(%err, "reopen failed"))?;
    ReopenedCutter::from_ribbon(ribbon, width)
}

/// Smallest distance from a spine vertex to a rail edge line next to it.
///
/// Straight spans put every rail exactly `width` away. Bends and edge-aligned
/// sweeps only push rails further out.
fn recover_width(ribbon: &BaseRibbon, rails: &[[VertId; 2]]) -> Option<f64> {
    let mesh = &ribbon.mesh;
    let n = ribbon.spine.len();
    let mut best: Option<f64> = None;
    for i in 0..n {
        let j = if i + 1 < n { i + 1 } else { i.checked_sub(1)? };
        let c = mesh.co(ribbon.spine[i]);
        for side in 0..2 {
            let a = mesh.co(rails[i][side]);
            let b = mesh.co(rails[j][side]);
            let Some((on_rail, _)) = closest_point_on_line(&c, &a, &b) else {
                continue;
            };
            let d = (on_rail - c).norm();
            if d > 0.0 && best.map_or(true, |w| d < w) {
                best = Some(d);
            }
        }
    }
    best.filter(|w| w.is_finite())
}

impl ReopenedCutter {
    /// Wrap a parsed ribbon, such as a base cutter edited by hand.
    pub fn from_ribbon(ribbon: BaseRibbon, width: Option<f64>) -> Result<Self> {
        let rails = (0..ribbon.spine.len())
            .map(|i| match (ribbon.rail_vert(i, true), ribbon.rail_vert(i, false)) {
                (Some(l), Some(r)) => Ok([l, r]),
                _ => Err(CutterError::FaceCountMismatch),
            })
            .collect::<Result<Vec<_>>>()?;

        let width = match width {
            Some(w) if w > 0.0 && w.is_finite() => w,
            Some(w) => return Err(CutterError::InvalidWidth(w)),
            None => recover_width(&ribbon, &rails).ok_or(CutterError::InvalidWidth(0.0))?,
        };
        debug!(spine = ribbon.spine.len(), width, convex = ribbon.convex, "reopened cutter");
        Ok(Self { ribbon, rails, width })
    }

    /// Current rail width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The ribbon being edited.
    pub fn ribbon(&self) -> &BaseRibbon {
        &self.ribbon
    }

    /// Spine and rail positions, `(left, center, right)` per spine vertex.
    pub fn triples(&self) -> Vec<[Point3; 3]> {
        let mesh = &self.ribbon.mesh;
        self.ribbon
            .spine
            .iter()
            .zip(&self.rails)
            .map(|(&c, &[l, r])| [mesh.co(l), mesh.co(c), mesh.co(r)])
            .collect()
    }

    /// Scale every rail offset by `width / self.width()`.
    pub fn set_width(&mut self, width: f64) -> Result<()> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(CutterError::InvalidWidth(width));
        }
        let factor = width / self.width;
        let mesh = &mut self.ribbon.mesh;
        for (&c, rails) in self.ribbon.spine.iter().zip(&self.rails) {
            let center = mesh.co(c);
            for &r in rails {
                let offset = mesh.co(r) - center;
                mesh.set_co(r, center + offset * factor);
            }
        }
        self.width = width;
        Ok(())
    }

    /// Move an end triple outward by `amount`; negative retracts. The center
    /// moves along the end spine edge, each rail along its rail edge.
    ///
    /// The center may not pass a limit point 10% of the way from the
    /// neighbouring spine vertex towards the end. When both ends of a single
    /// segment move, the limit is measured from the segment midpoint instead.
    pub fn extend(&mut self, end: SequenceEnd, amount: f64, both: bool) -> Result<()> {
        if self.ribbon.cyclic || !amount.is_finite() {
            return Err(CutterError::InvalidExtend(amount));
        }
        let ends: &[SequenceEnd] = if both { &[end, end.opposite()] } else { &[end] };

        let mut moves: Vec<(VertId, Point3)> = Vec::new();
        for &e in ends {
            moves.extend(self.end_moves(e, amount, both)?);
        }
        for (v, co) in moves {
            self.ribbon.mesh.set_co(v, co);
        }
        debug!(?end, amount, both, "extended reopened cutter");
        Ok(())
    }

    fn end_moves(&self, end: SequenceEnd, amount: f64, both: bool) -> Result<Vec<(VertId, Point3)>> {
        let mesh = &self.ribbon.mesh;
        let spine = &self.ribbon.spine;
        let n = spine.len();
        let (idx, neighbour) = match end {
            SequenceEnd::First => (0, 1),
            SequenceEnd::Last => (n - 1, n - 2),
        };

        let center = mesh.co(spine[idx]);
        let near = mesh.co(spine[neighbour]);
        let dir = normalized(&(center - near)).ok_or(CutterError::InvalidExtend(amount))?;
        let limit = if both && n == 2 {
            let mid = midpoint(&mesh.co(spine[0]), &mesh.co(spine[1]));
            mid + (center - mid) * EXTEND_LIMIT
        } else {
            near + (center - near) * EXTEND_LIMIT
        };
        let moved = center + dir * amount;
        if (moved - limit).dot(&dir) <= 0.0 {
            return Err(CutterError::InvalidExtend(amount));
        }

        let mut moves = vec![(spine[idx], moved)];
        for side in 0..2 {
            let rail = self.rails[idx][side];
            let rail_dir: Vec3 = normalized(&(mesh.co(rail) - mesh.co(self.rails[neighbour][side]))).unwrap_or(dir);
            moves.push((rail, mesh.co(rail) + rail_dir * amount));
        }
        Ok(moves)
    }

    /// Rebuild the closed solid.
    pub fn finalize(self, extrude_factor: f64) -> Result<FinishedCutter> {
        let params = FinishParams {
            width: self.width,
            extrude_factor,
        };
        finish(self.ribbon, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{build_base, Adjustments, BaseParams};
    use crate::ribbon::build_ribbon;
    use approx::assert_relative_eq;
    use hyperbevel_analyze::{analyze, AnalyzeOptions};
    use hyperbevel_mesh::{primitives, PolygonMesh};
    use hyperbevel_select::VertSequence;

    fn committed(p: PolygonMesh, verts: &[usize], cyclic: bool) -> FinishedCutter {
        let (mesh, ids) = p.to_mesh().unwrap();
        let seqs = [VertSequence {
            verts: verts.iter().map(|&i| ids[i]).collect(),
            cyclic,
        }];
        let analysis = analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap();
        let base = build_base(&analysis, &BaseParams::default(), &Adjustments::default()).unwrap();
        let ribbon = build_ribbon(&base.sequences[0], false).unwrap();
        finish(ribbon, &FinishParams::default()).unwrap()
    }

    fn sorted_coords(mesh: &Mesh) -> Vec<[f64; 3]> {
        let mut coords: Vec<[f64; 3]> = mesh
            .verts()
            .map(|v| {
                let co = mesh.co(v);
                [co.x, co.y, co.z]
            })
            .collect();
        coords.sort_by(|a, b| a.partial_cmp(b).unwrap());
        coords
    }

    fn assert_same_solid(a: &FinishedCutter, b: &FinishedCutter) {
        assert_eq!(a.mesh.face_count(), b.mesh.face_count());
        for (p, q) in sorted_coords(&a.mesh).iter().zip(sorted_coords(&b.mesh)) {
            for k in 0..3 {
                assert!((p[k] - q[k]).abs() < 1e-6, "{p:?} vs {q:?}");
            }
        }
    }

    #[test]
    fn test_reopen_is_idempotent() {
        for (p, verts, cyclic) in [
            (primitives::cube(1.0), vec![4, 5], false),
            (primitives::cube(1.0), vec![4, 5, 6, 7], true),
        ] {
            let cutter = committed(p, &verts, cyclic);
            let reopened = reopen(cutter.mesh.clone(), BooleanOperation::Difference, None).unwrap();
            assert_relative_eq!(reopened.width(), 0.1, epsilon = 1e-9);
            let again = reopened.finalize(0.1).unwrap();
            assert!(again.convex);
            assert_eq!(again.caps.len(), cutter.caps.len());
            assert_same_solid(&cutter, &again);
        }
    }

    #[test]
    fn test_reopen_concave_keeps_polarity() {
        let cutter = committed(primitives::l_prism(), &[3, 9], false);
        let reopened = reopen(cutter.mesh.clone(), BooleanOperation::Union, None).unwrap();
        assert!(!reopened.ribbon().convex);
        let again = reopened.finalize(0.1).unwrap();
        assert!(!again.convex);
        assert!(again.signed_volume() > 0.0);
        assert_same_solid(&cutter, &again);
    }

    #[test]
    fn test_width_round_trip() {
        let cutter = committed(primitives::cube(1.0), &[4, 5], false);
        let mut reopened = reopen(cutter.mesh, BooleanOperation::Difference, None).unwrap();
        let before = reopened.triples();

        reopened.set_width(0.2).unwrap();
        assert_relative_eq!(reopened.width(), 0.2);
        for (old, new) in before.iter().zip(reopened.triples()) {
            assert_eq!(old[1], new[1]);
            for side in [0, 2] {
                assert_relative_eq!(new[side] - new[1], (old[side] - old[1]) * 2.0, epsilon = 1e-6);
            }
        }

        let finished = reopened.finalize(0.1).unwrap();
        assert_relative_eq!(finished.width, 0.2);
        assert!(finished.is_closed());

        let mut reopened = reopen(finished.mesh, BooleanOperation::Difference, None).unwrap();
        assert_relative_eq!(reopened.width(), 0.2, epsilon = 1e-9);
        assert_eq!(reopened.set_width(0.0), Err(CutterError::InvalidWidth(0.0)));
        assert_eq!(reopened.set_width(-0.1), Err(CutterError::InvalidWidth(-0.1)));
    }

    #[test]
    fn test_extend_and_limit() {
        let cutter = committed(primitives::cube(1.0), &[4, 5], false);
        let mut reopened = reopen(cutter.mesh, BooleanOperation::Difference, None).unwrap();
        let before = reopened.triples();

        reopened.extend(SequenceEnd::First, 0.5, false).unwrap();
        let after = reopened.triples();
        assert_relative_eq!((after[0][1] - before[0][1]).norm(), 0.5, epsilon = 1e-9);
        assert_relative_eq!((after[0][0] - before[0][0]).norm(), 0.5, epsilon = 1e-9);
        assert_eq!(after[1], before[1]);

        // Span is now 2.504; retracting to within 10% of the far end fails.
        let err = reopened.extend(SequenceEnd::First, -2.3, false).unwrap_err();
        assert_eq!(err, CutterError::InvalidExtend(-2.3));
        assert_eq!(reopened.triples(), after);

        // Both ends of a single segment stop 10% short of the midpoint.
        reopened.extend(SequenceEnd::Last, -1.0, true).unwrap();
        assert!(reopened.extend(SequenceEnd::Last, -0.24, true).is_err());
    }

    #[test]
    fn test_extend_rejected_on_ring() {
        let cutter = committed(primitives::cube(1.0), &[4, 5, 6, 7], true);
        let mut reopened = reopen(cutter.mesh, BooleanOperation::Difference, Some(0.1)).unwrap();
        assert_eq!(
            reopened.extend(SequenceEnd::First, 0.1, false),
            Err(CutterError::InvalidExtend(0.1))
        );
    }

    #[test]
    fn test_reopen_reports_bad_tags() {
        let mut cutter = committed(primitives::cube(1.0), &[4, 5], false);
        for e in center_edges(&cutter.mesh) {
            cutter.mesh.edge_mut(e).gizmo = 0;
        }
        let err = reopen(cutter.mesh, BooleanOperation::Difference, Some(0.1)).unwrap_err();
        assert_eq!(err.to_string(), "no center edges");
    }
}
