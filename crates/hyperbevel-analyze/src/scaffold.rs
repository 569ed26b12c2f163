//! Step 1: neighbours, corners, side faces, tangents and shell factors.

use std::f64::consts::PI;

use hyperbevel_math::{angle_between, normalized, Vec3};
use hyperbevel_mesh::{FaceId, LoopId, Mesh, VertId};
use hyperbevel_select::VertSequence;
use tracing::warn;

use crate::error::{AnalyzeError, Result};
use crate::record::{next_index, prev_index, Sequence, SideData, VertexRecord};

/// Build the sequence skeleton. Side data only has its face set.
pub(crate) fn scaffold(mesh: &Mesh, input: &VertSequence, weld_suggestion: &mut bool) -> Result<Sequence> {
    let verts = &input.verts;
    let len = verts.len();
    if len < 2 || (input.cyclic && len < 3) {
        return Err(AnalyzeError::EmptySequence(len));
    }

    let mut records: Vec<VertexRecord> = Vec::with_capacity(len);
    let mut edges = Vec::with_capacity(len);
    for (idx, &v) in verts.iter().enumerate() {
        let prev = prev_index(idx, len, input.cyclic);
        let next = next_index(idx, len, input.cyclic);
        let prev_edge = prev.map(|p| edge_between(mesh, verts[p], v)).transpose()?;
        let next_edge = next.map(|n| edge_between(mesh, v, verts[n])).transpose()?;

        let (corner, corner_from_prev, left_face, right_face) = match (next_edge, records.last()) {
            (Some(e), _) => {
                if mesh.edge_is_wire(e) {
                    return Err(AnalyzeError::WireEdge(e));
                }
                let corner = mesh
                    .vert_loops(v)
                    .into_iter()
                    .find(|&l| mesh.loop_edge(l) == e)
                    .ok_or(AnalyzeError::ReversedBoundary(e))?;
                let (left, right) = side_faces(mesh, v, corner, weld_suggestion);
                (corner, false, left, right)
            }
            (None, Some(prev_record)) => (
                prev_record.corner,
                true,
                prev_record.left.face,
                prev_record.right.face,
            ),
            (None, None) => return Err(AnalyzeError::EmptySequence(len)),
        };
        if let Some(e) = next_edge {
            edges.push(e);
        }

        let co = mesh.co(v);
        let (dir, shell_factor) = tangent(mesh, v, prev.map(|p| verts[p]), next.map(|n| verts[n]), weld_suggestion);

        records.push(VertexRecord {
            vert: v,
            co,
            prev,
            next,
            prev_edge,
            next_edge,
            corner,
            corner_from_prev,
            dir,
            normal: Vec3::zeros(),
            shell_factor,
            left: SideData::new(left_face),
            right: SideData::new(right_face),
        });
    }

    let convex = records
        .first()
        .and_then(|r| r.next_edge)
        .map(|e| mesh.edge_is_convex(e))
        .unwrap_or(true);

    Ok(Sequence {
        verts: verts.clone(),
        cyclic: input.cyclic,
        convex,
        edges,
        records,
        left_gaps: Vec::new(),
        right_gaps: Vec::new(),
    })
}

fn edge_between(mesh: &Mesh, a: VertId, b: VertId) -> Result<hyperbevel_mesh::EdgeId> {
    mesh.edge_between(a, b).ok_or(AnalyzeError::MissingEdge(a, b))
}

/// Faces on either side of `corner`, stepping across to a neighbour when a
/// face is degenerate.
fn side_faces(mesh: &Mesh, v: VertId, corner: LoopId, weld_suggestion: &mut bool) -> (FaceId, FaceId) {
    let mut left = mesh.loop_face(corner);
    if mesh.face(left).normal == Vec3::zeros() {
        warn!(?v, face = ?left, "zero-normal side face, likely a double vertex; using its neighbour");
        left = mesh.loop_face(mesh.loop_radial_next(mesh.loop_next(corner)));
        *weld_suggestion = true;
    }

    let radial = mesh.loop_radial_next(corner);
    let mut right = mesh.loop_face(radial);
    if mesh.face(right).normal == Vec3::zeros() {
        warn!(?v, face = ?right, "zero-normal side face, likely a double vertex; using its neighbour");
        right = mesh.loop_face(mesh.loop_radial_next(mesh.loop_next(radial)));
        *weld_suggestion = true;
    }
    (left, right)
}

/// Unit walk tangent and shell factor at `v`.
fn tangent(
    mesh: &Mesh,
    v: VertId,
    prev: Option<VertId>,
    next: Option<VertId>,
    weld_suggestion: &mut bool,
) -> (Vec3, f64) {
    let co = mesh.co(v);
    let forward = next.and_then(|n| normalized(&(mesh.co(n) - co)));
    let backward = prev.and_then(|p| normalized(&(co - mesh.co(p))));

    let mut shell_factor = 1.0;
    if let (Some(n), Some(p)) = (next, prev) {
        let angle = match angle_between(&(mesh.co(n) - co), &(mesh.co(p) - co)) {
            Some(angle) => angle,
            None => {
                warn!(?v, "cannot measure bend angle, likely a double vertex; assuming straight");
                *weld_suggestion = true;
                PI
            }
        };
        let half_sin = (angle / 2.0).sin();
        if half_sin > 1e-6 {
            shell_factor = 1.0 / half_sin;
        } else {
            warn!(?v, "sequence folds back on itself");
            *weld_suggestion = true;
        }
    }

    let dir = match (forward, backward) {
        (Some(f), Some(b)) => normalized(&(f + b)).unwrap_or(f),
        (Some(d), None) | (None, Some(d)) => d,
        (None, None) => {
            warn!(?v, "zero-length sequence edges, likely a double vertex");
            *weld_suggestion = true;
            Vec3::x()
        }
    };
    (dir, shell_factor)
}
