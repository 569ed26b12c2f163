//! Finished cutter: the base ribbon extruded into a closed solid.

use std::collections::HashSet;
use std::time::Instant;

use hyperbevel_math::{average_normals, intersect_line_plane, normalized, Point3};
use hyperbevel_mesh::{FaceId, Mesh, PolygonMesh, VertId};
use tracing::debug;

use crate::error::{CutterError, Result};
use crate::ribbon::{BaseRibbon, CAP_FACE, CENTER_EDGE};

/// Above this `|extrude . cap_normal|`, an end cap is left as extruded.
pub const CAP_PARALLEL: f64 = 0.9;

/// Extrusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishParams {
    /// Ribbon width the base was built with.
    pub width: f64,
    /// Extrusion depth as a fraction of the width.
    pub extrude_factor: f64,
}

impl Default for FinishParams {
    fn default() -> Self {
        Self {
            width: 0.1,
            extrude_factor: 0.1,
        }
    }
}

/// A closed cutter solid.
#[derive(Debug, Clone)]
pub struct FinishedCutter {
    /// The solid.
    pub mesh: Mesh,
    /// Bottom spine vertices. This is the bevel vertex group.
    pub spine: Vec<VertId>,
    /// Cap faces at open ends, first end first.
    pub caps: Vec<FaceId>,
    /// The spine closes.
    pub cyclic: bool,
    /// Polarity. Decides the boolean operation.
    pub convex: bool,
    /// Width the cutter was built with.
    pub width: f64,
}

impl FinishedCutter {
    /// Flatten for export. Also returns the vertex group as indices.
    pub fn to_polygon(&self) -> (PolygonMesh, Vec<usize>) {
        let index = hyperbevel_mesh::polygon::vert_indices(&self.mesh);
        let group = self.spine.iter().filter_map(|v| index.get(v).copied()).collect();
        (PolygonMesh::from_mesh(&self.mesh), group)
    }

    /// Every edge has exactly two faces.
    pub fn is_closed(&self) -> bool {
        self.mesh.edges().all(|e| self.mesh.edge_is_manifold(e))
    }

    /// Signed volume. Positive when the faces point outward.
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for f in self.mesh.faces() {
            let coords = self.mesh.face_coords(f);
            let Some(first) = coords.first() else {
                continue;
            };
            for pair in coords[1..].windows(2) {
                volume += first.coords.dot(&pair[0].coords.cross(&pair[1].coords));
            }
        }
        volume / 6.0
    }
}

/// Extrude a base ribbon into a closed solid.
///
/// Top vertices move along their averaged top-face normal by
/// `sign * extrude_factor * width * shell_factor`, with `sign` negative for
/// concave ribbons. Open ends get one dissolved cap each, tagged
/// [`CAP_FACE`]. Concave ribbons extrude into the host, which turns the shell
/// inside out, so their faces are reversed afterwards.
pub fn finish(base: BaseRibbon, params: &FinishParams) -> Result<FinishedCutter> {
    if !(params.width > 0.0 && params.width.is_finite()) {
        return Err(CutterError::InvalidWidth(params.width));
    }
    let start = Instant::now();
    let BaseRibbon {
        mut mesh,
        spine,
        cyclic,
        convex,
    } = base;
    mesh.normal_update();

    let bottom: Vec<FaceId> = mesh.faces().collect();
    let region = mesh.extrude_face_region(&bottom)?;
    let sign = if convex { 1.0 } else { -1.0 };

    let moves: Vec<(VertId, Point3)> = region
        .top_verts()
        .map(|v| {
            let faces: Vec<FaceId> = mesh
                .vert_faces(v)
                .into_iter()
                .filter(|f| region.top_faces.contains(f))
                .collect();
            let normals: Vec<_> = faces.iter().map(|&f| mesh.face(f).normal).collect();
            let co = mesh.co(v);
            match average_normals(normals.iter()) {
                Some(normal) => {
                    let shell = mesh.vert_shell_factor(v, &faces, &normal);
                    (v, co + normal * shell * sign * params.extrude_factor * params.width)
                }
                None => (v, co),
            }
        })
        .collect();
    for (v, co) in moves {
        mesh.set_co(v, co);
    }

    for &f in &region.top_faces {
        for e in mesh.face_edges(f) {
            if mesh.edge(e).gizmo == CENTER_EDGE {
                mesh.edge_mut(e).gizmo = 0;
            }
        }
    }
    mesh.normal_update();

    let mut caps = Vec::new();
    if !cyclic {
        let bottom: HashSet<FaceId> = bottom.iter().copied().collect();
        for center in [spine.first(), spine.last()].into_iter().flatten() {
            caps.push(close_end(&mut mesh, *center, &bottom)?);
        }
        mesh.normal_update();
    }

    if !convex {
        let all: Vec<FaceId> = mesh.faces().collect();
        mesh.reverse_faces(&all);
    }

    debug!(
        verts = mesh.vert_count(),
        faces = mesh.face_count(),
        convex,
        elapsed_us = start.elapsed().as_micros() as u64,
        "finished cutter"
    );
    Ok(FinishedCutter {
        mesh,
        spine,
        caps,
        cyclic,
        convex,
        width: params.width,
    })
}

fn close_end(mesh: &mut Mesh, center: VertId, bottom: &HashSet<FaceId>) -> Result<FaceId> {
    let sides: Vec<FaceId> = mesh
        .vert_faces(center)
        .into_iter()
        .filter(|f| !bottom.contains(f))
        .collect();
    let cap = mesh.dissolve_faces(&sides)?;
    mesh.face_mut(cap).gizmo = CAP_FACE;
    flatten_cap(mesh, center, cap);
    mesh.recalc_face_normal(cap);
    Ok(cap)
}

/// Project the far side of a cap onto the plane spanned by its two sweeps,
/// unless that plane already faces the extrusion.
fn flatten_cap(mesh: &mut Mesh, center: VertId, cap: FaceId) {
    let Some(l) = mesh.vert_loops(center).into_iter().find(|&l| mesh.loop_face(l) == cap) else {
        return;
    };
    let sweep_a = mesh.loop_vert(mesh.loop_next(l));
    let sweep_b = mesh.loop_vert(mesh.loop_prev(l));
    let top = mesh.loop_vert(mesh.loop_next(mesh.loop_next(mesh.loop_next(l))));

    let co = mesh.co(center);
    let (Some(dir_a), Some(dir_b), Some(extrude)) = (
        normalized(&(mesh.co(sweep_a) - co)),
        normalized(&(mesh.co(sweep_b) - co)),
        normalized(&(mesh.co(top) - co)),
    ) else {
        return;
    };
    let Some(cap_normal) = normalized(&dir_b.cross(&dir_a)) else {
        return;
    };
    if extrude.dot(&cap_normal).abs() > CAP_PARALLEL {
        return;
    }

    let cap_edges = mesh.face_edges(cap);
    for v in mesh.face_verts(cap) {
        if v == center || v == sweep_a || v == sweep_b {
            continue;
        }
        let Some(&rail) = mesh.vert_edges(v).iter().find(|e| !cap_edges.contains(e)) else {
            continue;
        };
        let Some(other) = mesh.edge_other_vert(rail, v) else {
            continue;
        };
        if let Some(on_plane) = intersect_line_plane(&mesh.co(v), &mesh.co(other), &co, &cap_normal) {
            mesh.set_co(v, on_plane);
        }
    }
}
