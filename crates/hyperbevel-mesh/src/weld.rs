//! Merge-by-distance for hosts with split vertices.

use std::collections::HashMap;

use hyperbevel_math::Point3;
use tracing::debug;

use crate::error::Result;
use crate::topology::{Mesh, VertId};

/// A welded copy of a mesh.
#[derive(Debug, Clone)]
pub struct Welded {
    /// The welded mesh.
    pub mesh: Mesh,
    /// Source vertex to welded vertex.
    pub vert_map: HashMap<VertId, VertId>,
    /// Number of source vertices merged into another.
    pub merged: usize,
}

fn pos_to_cell(p: &Point3, cell_size: f64) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

/// Weld vertices closer than `threshold` into a new mesh.
///
/// Faces keep their smooth flag and gizmo tag. Faces left with fewer than
/// three distinct vertices are dropped. The source mesh is untouched.
pub fn weld(mesh: &Mesh, threshold: f64) -> Result<Welded> {
    let verts: Vec<VertId> = mesh.verts().collect();
    let cell_size = (threshold * 2.0).max(f64::MIN_POSITIVE);

    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (idx, &v) in verts.iter().enumerate() {
        spatial_hash.entry(pos_to_cell(&mesh.co(v), cell_size)).or_default().push(idx);
    }

    let mut remap: Vec<usize> = (0..verts.len()).collect();
    let mut merged = 0;
    for idx in 0..verts.len() {
        if remap[idx] != idx {
            continue;
        }
        let co = mesh.co(verts[idx]);
        let cell = pos_to_cell(&co, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other] != other {
                            continue;
                        }
                        if (mesh.co(verts[other]) - co).norm() < threshold {
                            remap[other] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    let mut out = Mesh::new();
    let mut created: HashMap<usize, VertId> = HashMap::new();
    let mut vert_map = HashMap::with_capacity(verts.len());
    for (idx, &v) in verts.iter().enumerate() {
        let rep = remap[idx];
        let new = *created
            .entry(rep)
            .or_insert_with(|| out.add_vert(mesh.co(verts[rep])));
        vert_map.insert(v, new);
    }

    let mut dropped = 0;
    for f in mesh.faces() {
        let mut poly: Vec<VertId> = Vec::with_capacity(mesh.face_len(f));
        for v in mesh.face_verts(f) {
            let w = vert_map[&v];
            if !poly.contains(&w) {
                poly.push(w);
            }
        }
        if poly.len() < 3 {
            dropped += 1;
            continue;
        }
        let nf = out.add_face(&poly)?;
        out.face_mut(nf).smooth = mesh.face(f).smooth;
        out.face_mut(nf).gizmo = mesh.face(f).gizmo;
    }

    for e in mesh.edges() {
        let gizmo = mesh.edge(e).gizmo;
        if gizmo == 0 {
            continue;
        }
        let [a, b] = mesh.edge_verts(e);
        if let Some(ne) = out.edge_between(vert_map[&a], vert_map[&b]) {
            out.edge_mut(ne).gizmo = gizmo;
        }
    }

    out.normal_update();
    debug!(merged, dropped, "welded mesh");
    Ok(Welded {
        mesh: out,
        vert_map,
        merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    /// Cube with every face carrying its own vertices.
    fn split_cube() -> Mesh {
        let (cube, _) = primitives::cube(1.0).to_mesh().unwrap();
        let mut mesh = Mesh::new();
        for f in cube.faces() {
            let verts: Vec<VertId> = cube.face_coords(f).into_iter().map(|p| mesh.add_vert(p)).collect();
            mesh.add_face(&verts).unwrap();
        }
        mesh.normal_update();
        mesh
    }

    #[test]
    fn test_weld_split_cube() {
        let mesh = split_cube();
        assert_eq!(mesh.vert_count(), 24);
        assert!(mesh.edges().all(|e| !mesh.edge_is_manifold(e)));

        let welded = weld(&mesh, 1e-4).unwrap();
        assert_eq!(welded.merged, 16);
        assert_eq!(welded.mesh.vert_count(), 8);
        assert_eq!(welded.mesh.edge_count(), 12);
        assert!(welded.mesh.edges().all(|e| welded.mesh.edge_is_manifold(e)));
        assert_eq!(welded.vert_map.len(), 24);
    }

    #[test]
    fn test_weld_keeps_distant_verts() {
        let (mesh, _) = primitives::grid(2, 2).to_mesh().unwrap();
        let welded = weld(&mesh, 0.5).unwrap();
        assert_eq!(welded.merged, 0);
        assert_eq!(welded.mesh.vert_count(), 9);
    }

    #[test]
    fn test_weld_drops_collapsed_faces() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vert(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vert(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vert(Point3::new(1.0, 1e-6, 0.0));
        let d = mesh.add_vert(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c]).unwrap();
        mesh.add_face(&[a, c, d]).unwrap();
        let welded = weld(&mesh, 1e-4).unwrap();
        assert_eq!(welded.mesh.face_count(), 1);
        assert_eq!(welded.mesh.vert_count(), 3);
    }
}
