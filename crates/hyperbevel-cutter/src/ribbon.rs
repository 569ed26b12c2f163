//! The two-strip quad ribbon, built from triples or parsed back from a
//! tagged mesh.

use std::collections::HashSet;

use hyperbevel_mesh::{EdgeId, FaceId, Mesh, VertId};
use hyperbevel_select::partition;

use crate::base::BaseSequence;
use crate::error::{CutterError, Result};

/// Edge gizmo value marking a spine edge.
pub const CENTER_EDGE: i32 = 1;

/// Face gizmo value marking an end cap.
pub const CAP_FACE: i32 = 1;

/// A base ribbon: two quads per spine edge, spine edges tagged.
#[derive(Debug, Clone)]
pub struct BaseRibbon {
    /// The ribbon mesh.
    pub mesh: Mesh,
    /// Spine vertices in walk order.
    pub spine: Vec<VertId>,
    /// The spine closes.
    pub cyclic: bool,
    /// Polarity of the host edges.
    pub convex: bool,
}

/// Build the ribbon for one sequence.
///
/// Quads are `(L_i, C_i, C_i+1, L_i+1)` and `(C_i, R_i, R_i+1, C_i+1)`,
/// wrapping when cyclic.
pub fn build_ribbon(seq: &BaseSequence, smooth: bool) -> Result<BaseRibbon> {
    let n = seq.triples.len();
    if n < 2 {
        return Err(CutterError::TooShort(0));
    }

    let mut mesh = Mesh::new();
    let verts: Vec<[VertId; 3]> = seq
        .triples
        .iter()
        .map(|t| t.points().map(|p| mesh.add_vert(p)))
        .collect();

    let spans = if seq.cyclic { n } else { n - 1 };
    for i in 0..spans {
        let [l0, c0, r0] = verts[i];
        let [l1, c1, r1] = verts[(i + 1) % n];
        for quad in [[l0, c0, c1, l1], [c0, r0, r1, c1]] {
            let f = mesh.add_face(&quad)?;
            mesh.face_mut(f).smooth = smooth;
        }
        if let Some(e) = mesh.edge_between(c0, c1) {
            mesh.edge_mut(e).gizmo = CENTER_EDGE;
        }
    }

    Ok(BaseRibbon {
        mesh,
        spine: verts.iter().map(|t| t[1]).collect(),
        cyclic: seq.cyclic,
        convex: seq.convex,
    })
}

impl BaseRibbon {
    /// Recover a ribbon from its center-edge tags.
    ///
    /// `convex` overrides the polarity read from the first spine edge.
    pub fn parse(mesh: Mesh, convex: Option<bool>) -> Result<Self> {
        let faces: Vec<FaceId> = mesh.faces().collect();
        if faces.iter().any(|&f| mesh.face_len(f) != 4) {
            return Err(CutterError::NonQuadFaces);
        }

        let center: Vec<EdgeId> = center_edges(&mesh);
        if center.is_empty() {
            return Err(CutterError::NoCenterEdges);
        }

        let sequences = partition(&mesh, &center);
        if sequences.len() != 1 {
            return Err(CutterError::MultipleCenterLoops(sequences.len()));
        }

        let center_faces: HashSet<FaceId> = center.iter().flat_map(|&e| mesh.edge_faces(e)).collect();
        if center_faces.len() != faces.len() || center.iter().any(|&e| mesh.edge_faces(e).len() != 2) {
            return Err(CutterError::FaceCountMismatch);
        }

        let seq = sequences.into_iter().next().ok_or(CutterError::NoCenterEdges)?;
        let spine = seq.verts;
        let convex = convex.unwrap_or_else(|| {
            spine
                .get(1)
                .and_then(|&v| mesh.edge_between(spine[0], v))
                .map_or(true, |e| mesh.edge_is_convex(e))
        });

        Ok(Self {
            mesh,
            spine,
            cyclic: seq.cyclic,
            convex,
        })
    }

    /// Faces of the ribbon.
    pub fn faces(&self) -> Vec<FaceId> {
        self.mesh.faces().collect()
    }

    /// The rail vertex next to spine vertex `i` on the face whose loop runs
    /// along the spine (`left`) or against it (`!left`).
    pub fn rail_vert(&self, i: usize, left: bool) -> Option<VertId> {
        let v = *self.spine.get(i)?;
        let (a, b, forward) = match self.spine.get(i + 1) {
            Some(&next) => (v, next, true),
            None if self.cyclic => (v, self.spine[0], true),
            None => (self.spine[i.checked_sub(1)?], v, false),
        };
        let e = self.mesh.edge_between(a, b)?;
        let l = self
            .mesh
            .edge_loops(e)
            .iter()
            .copied()
            .find(|&l| (self.mesh.loop_vert(l) == a) == left)?;
        // Step from the spine corner to the rail corner at `v`.
        let corner = if self.mesh.loop_vert(l) == v {
            l
        } else {
            self.mesh.loop_next(l)
        };
        let rail = if left == forward {
            self.mesh.loop_prev(corner)
        } else {
            self.mesh.loop_next(corner)
        };
        Some(self.mesh.loop_vert(rail))
    }
}

/// Edges tagged as spine edges.
pub fn center_edges(mesh: &Mesh) -> Vec<EdgeId> {
    mesh.edges().filter(|&e| mesh.edge(e).gizmo == CENTER_EDGE).collect()
}
