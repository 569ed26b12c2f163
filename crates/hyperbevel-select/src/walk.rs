//! Loop walking by bend angle.

use std::f64::consts::PI;

use hyperbevel_math::angle_between;
use hyperbevel_mesh::{EdgeId, Mesh, VertId};

/// Angle between two edges at their shared vertex, in radians.
///
/// A straight continuation is `PI`. Zero-length edges also report `PI`.
/// Edges without a shared vertex are compared as plain direction vectors.
pub fn angle_between_edges(mesh: &Mesh, a: EdgeId, b: EdgeId) -> f64 {
    let [a0, a1] = mesh.edge_verts(a);
    let [b0, b1] = mesh.edge_verts(b);
    let (va, vb) = if let Some(center) = [a0, a1].into_iter().find(|v| *v == b0 || *v == b1) {
        let other_a = mesh.edge_other_vert(a, center).unwrap_or(center);
        let other_b = mesh.edge_other_vert(b, center).unwrap_or(center);
        (mesh.co(center) - mesh.co(other_a), mesh.co(center) - mesh.co(other_b))
    } else {
        (mesh.co(a0) - mesh.co(a1), mesh.co(b0) - mesh.co(b1))
    };
    angle_between(&va, &vb).unwrap_or(PI)
}

/// Grow `seed` into an edge loop.
///
/// Walks out of both ends of the seed. At every vertex the manifold edge
/// with the widest angle to the current edge is taken if that angle exceeds
/// `min_angle_deg`. The walk stops at an edge already collected, so a closed
/// ring comes back as each edge once.
pub fn grow_loop(mesh: &Mesh, seed: EdgeId, min_angle_deg: f64) -> Vec<EdgeId> {
    let mut edges = vec![seed];
    let [v0, v1] = mesh.edge_verts(seed);
    walk(mesh, &mut edges, seed, v0, min_angle_deg.to_radians());
    walk(mesh, &mut edges, seed, v1, min_angle_deg.to_radians());
    edges
}

fn walk(mesh: &Mesh, edges: &mut Vec<EdgeId>, mut edge: EdgeId, mut vert: VertId, min_angle: f64) {
    loop {
        let Some(other) = mesh.edge_other_vert(edge, vert) else {
            return;
        };
        let best = mesh
            .vert_edges(other)
            .iter()
            .copied()
            .filter(|&e| e != edge && mesh.edge_is_manifold(e))
            .map(|e| (angle_between_edges(mesh, edge, e), e))
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((angle, next)) if !edges.contains(&next) && angle > min_angle => {
                edges.push(next);
                edge = next;
                vert = other;
            }
            _ => return,
        }
    }
}
