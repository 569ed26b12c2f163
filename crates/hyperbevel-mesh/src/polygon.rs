//! Plain polygon-soup interchange format.
//!
//! This is what gets saved and loaded: positions, index polygons and the two
//! gizmo layers. Handles are not stable across a round trip, indices are.

use std::collections::HashMap;

use hyperbevel_math::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::topology::{Mesh, VertId};

/// An edge gizmo tag addressed by vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTag {
    /// Endpoint indices into `positions`.
    pub verts: [usize; 2],
    /// Tag value.
    pub gizmo: i32,
}

/// Indexed polygon mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonMesh {
    /// Vertex positions.
    pub positions: Vec<[f64; 3]>,
    /// Polygons as index lists in winding order.
    pub faces: Vec<Vec<usize>>,
    /// Non-zero edge gizmo tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_gizmos: Vec<EdgeTag>,
    /// Face gizmo tags, parallel to `faces`. Empty means all zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub face_gizmos: Vec<i32>,
}

impl PolygonMesh {
    /// Build from raw positions and polygons.
    pub fn new(positions: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            positions,
            faces,
            edge_gizmos: Vec::new(),
            face_gizmos: Vec::new(),
        }
    }

    /// Build a half-edge mesh. Returns the handle of every position, in order.
    pub fn to_mesh(&self) -> Result<(Mesh, Vec<VertId>)> {
        let mut mesh = Mesh::new();
        let ids: Vec<VertId> = self
            .positions
            .iter()
            .map(|p| mesh.add_vert(Point3::new(p[0], p[1], p[2])))
            .collect();

        let lookup = |index: usize| {
            ids.get(index).copied().ok_or(MeshError::IndexOutOfRange {
                index,
                len: ids.len(),
            })
        };

        for (i, poly) in self.faces.iter().enumerate() {
            let verts = poly.iter().map(|&idx| lookup(idx)).collect::<Result<Vec<_>>>()?;
            let f = mesh.add_face(&verts)?;
            if let Some(&gizmo) = self.face_gizmos.get(i) {
                mesh.face_mut(f).gizmo = gizmo;
            }
        }

        for tag in &self.edge_gizmos {
            let a = lookup(tag.verts[0])?;
            let b = lookup(tag.verts[1])?;
            let e = mesh.ensure_edge(a, b);
            mesh.edge_mut(e).gizmo = tag.gizmo;
        }

        mesh.normal_update();
        Ok((mesh, ids))
    }

    /// Flatten a half-edge mesh. Vertices keep their iteration order.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let index = vert_indices(mesh);
        let positions = mesh
            .verts()
            .map(|v| {
                let co = mesh.co(v);
                [co.x, co.y, co.z]
            })
            .collect();

        let mut faces = Vec::with_capacity(mesh.face_count());
        let mut face_gizmos = Vec::with_capacity(mesh.face_count());
        for f in mesh.faces() {
            faces.push(mesh.face_verts(f).iter().map(|v| index[v]).collect());
            face_gizmos.push(mesh.face(f).gizmo);
        }
        if face_gizmos.iter().all(|&g| g == 0) {
            face_gizmos.clear();
        }

        let edge_gizmos = mesh
            .edges()
            .filter(|&e| mesh.edge(e).gizmo != 0)
            .map(|e| {
                let [a, b] = mesh.edge_verts(e);
                EdgeTag {
                    verts: [index[&a], index[&b]],
                    gizmo: mesh.edge(e).gizmo,
                }
            })
            .collect();

        Self {
            positions,
            faces,
            edge_gizmos,
            face_gizmos,
        }
    }
}

/// Position of every vertex in the mesh's iteration order.
pub fn vert_indices(mesh: &Mesh) -> HashMap<VertId, usize> {
    mesh.verts().enumerate().map(|(i, v)| (v, i)).collect()
}
