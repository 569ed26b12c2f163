//! Core mesh storage and navigation.

use hyperbevel_math::{normalized, Point3, Vec3};
use slotmap::{new_key_type, SlotMap};

use crate::error::{MeshError, Result};

new_key_type! {
    /// Handle to a mesh vertex.
    pub struct VertId;
    /// Handle to a mesh edge.
    pub struct EdgeId;
    /// Handle to a mesh face.
    pub struct FaceId;
    /// Handle to a face corner (one per vertex per face).
    pub struct LoopId;
}

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vert {
    /// Position in the mesh's local frame.
    pub co: Point3,
    /// Cached vertex normal, refreshed by [`Mesh::normal_update`].
    pub normal: Vec3,
    pub(crate) edges: Vec<EdgeId>,
}

/// An undirected mesh edge.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) verts: [VertId; 2],
    /// Radial cycle: every loop running along this edge, in insertion order.
    pub(crate) loops: Vec<LoopId>,
    /// Edge gizmo tag.
    pub gizmo: i32,
}

/// A polygon.
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) loops: Vec<LoopId>,
    /// Unit normal, or zero for a degenerate polygon.
    pub normal: Vec3,
    /// Smooth shading flag.
    pub smooth: bool,
    /// Face gizmo tag.
    pub gizmo: i32,
}

/// A face corner. Runs from `vert` along `edge` to the next corner's vertex.
#[derive(Debug, Clone)]
pub struct Loop {
    pub(crate) vert: VertId,
    pub(crate) edge: EdgeId,
    pub(crate) face: FaceId,
    pub(crate) next: LoopId,
    pub(crate) prev: LoopId,
}

/// Half-edge polygon mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) verts: SlotMap<VertId, Vert>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) loops: SlotMap<LoopId, Loop>,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Add a loose vertex.
    pub fn add_vert(&mut self, co: Point3) -> VertId {
        self.verts.insert(Vert {
            co,
            normal: Vec3::zeros(),
            edges: Vec::new(),
        })
    }

    /// Add a polygon over `verts` in winding order, creating missing edges.
    pub fn add_face(&mut self, verts: &[VertId]) -> Result<FaceId> {
        if verts.len() < 3 {
            return Err(MeshError::TooFewVertices(verts.len()));
        }
        for (i, v) in verts.iter().enumerate() {
            if !self.verts.contains_key(*v) {
                return Err(MeshError::MissingVertex(*v));
            }
            if verts[..i].contains(v) {
                return Err(MeshError::RepeatedVertex(*v));
            }
        }

        let n = verts.len();
        let face = self.faces.insert(Face {
            loops: Vec::with_capacity(n),
            normal: Vec3::zeros(),
            smooth: false,
            gizmo: 0,
        });

        let mut loops = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (verts[i], verts[(i + 1) % n]);
            let edge = self.ensure_edge(a, b);
            let l = self.loops.insert(Loop {
                vert: a,
                edge,
                face,
                next: LoopId::default(),
                prev: LoopId::default(),
            });
            self.edges[edge].loops.push(l);
            loops.push(l);
        }

        self.link_face_loops(face, loops);
        self.recalc_face_normal(face);
        Ok(face)
    }

    /// Return the edge between `a` and `b`, creating a wire edge if needed.
    pub fn ensure_edge(&mut self, a: VertId, b: VertId) -> EdgeId {
        if let Some(e) = self.edge_between(a, b) {
            return e;
        }
        let e = self.edges.insert(Edge {
            verts: [a, b],
            loops: Vec::new(),
            gizmo: 0,
        });
        self.verts[a].edges.push(e);
        self.verts[b].edges.push(e);
        e
    }

    pub(crate) fn link_face_loops(&mut self, face: FaceId, loops: Vec<LoopId>) {
        let n = loops.len();
        for i in 0..n {
            let l = &mut self.loops[loops[i]];
            l.next = loops[(i + 1) % n];
            l.prev = loops[(i + n - 1) % n];
        }
        self.faces[face].loops = loops;
    }

    /// Remove a face and its loops. Edges and vertices stay.
    pub(crate) fn remove_face(&mut self, face: FaceId) {
        let Some(f) = self.faces.remove(face) else {
            return;
        };
        for l in f.loops {
            if let Some(lp) = self.loops.remove(l) {
                if let Some(edge) = self.edges.get_mut(lp.edge) {
                    edge.loops.retain(|&x| x != l);
                }
            }
        }
    }

    /// Remove an edge that no face uses any more.
    pub(crate) fn remove_wire_edge(&mut self, edge: EdgeId) {
        let Some(e) = self.edges.get(edge) else {
            return;
        };
        if !e.loops.is_empty() {
            return;
        }
        let verts = e.verts;
        self.edges.remove(edge);
        for v in verts {
            if let Some(vert) = self.verts.get_mut(v) {
                vert.edges.retain(|&x| x != edge);
            }
        }
    }

    // =========================================================================
    // Normals
    // =========================================================================

    /// Recompute one face normal with Newell's method.
    ///
    /// Degenerate polygons get a zero normal so callers can detect them.
    pub fn recalc_face_normal(&mut self, face: FaceId) {
        let verts = self.face_verts(face);
        let n = verts.len();
        let mut normal = Vec3::zeros();
        for i in 0..n {
            let cur = self.verts[verts[i]].co;
            let next = self.verts[verts[(i + 1) % n]].co;
            normal.x += (cur.y - next.y) * (cur.z + next.z);
            normal.y += (cur.z - next.z) * (cur.x + next.x);
            normal.z += (cur.x - next.x) * (cur.y + next.y);
        }
        self.faces[face].normal = normalized(&normal).unwrap_or_else(Vec3::zeros);
    }

    /// Refresh every face normal and every vertex normal.
    pub fn normal_update(&mut self) {
        let faces: Vec<FaceId> = self.faces.keys().collect();
        for f in faces {
            self.recalc_face_normal(f);
        }
        let verts: Vec<VertId> = self.verts.keys().collect();
        for v in verts {
            let normals: Vec<Vec3> = self.vert_faces(v).iter().map(|&f| self.faces[f].normal).collect();
            self.verts[v].normal = hyperbevel_math::average_normals(normals.iter()).unwrap_or_else(Vec3::zeros);
        }
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// Vertex by handle. Panics on a foreign handle.
    pub fn vert(&self, v: VertId) -> &Vert {
        &self.verts[v]
    }

    /// Mutable vertex by handle.
    pub fn vert_mut(&mut self, v: VertId) -> &mut Vert {
        &mut self.verts[v]
    }

    /// Edge by handle.
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e]
    }

    /// Mutable edge by handle.
    pub fn edge_mut(&mut self, e: EdgeId) -> &mut Edge {
        &mut self.edges[e]
    }

    /// Face by handle.
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f]
    }

    /// Mutable face by handle.
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f]
    }

    /// Whether the handle is a live vertex of this mesh.
    pub fn contains_vert(&self, v: VertId) -> bool {
        self.verts.contains_key(v)
    }

    /// Whether the handle is a live edge of this mesh.
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.contains_key(e)
    }

    /// Whether the handle is a live face of this mesh.
    pub fn contains_face(&self, f: FaceId) -> bool {
        self.faces.contains_key(f)
    }

    /// All vertex handles in insertion order.
    pub fn verts(&self) -> impl Iterator<Item = VertId> + '_ {
        self.verts.keys()
    }

    /// All edge handles in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    /// All face handles in insertion order.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    /// Number of vertices.
    pub fn vert_count(&self) -> usize {
        self.verts.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    // =========================================================================
    // Vertex adjacency
    // =========================================================================

    /// Position of a vertex.
    pub fn co(&self, v: VertId) -> Point3 {
        self.verts[v].co
    }

    /// Move a vertex.
    pub fn set_co(&mut self, v: VertId, co: Point3) {
        self.verts[v].co = co;
    }

    /// Edges touching `v`.
    pub fn vert_edges(&self, v: VertId) -> &[EdgeId] {
        &self.verts[v].edges
    }

    /// Loops whose corner vertex is `v`.
    pub fn vert_loops(&self, v: VertId) -> Vec<LoopId> {
        self.verts[v]
            .edges
            .iter()
            .flat_map(|&e| self.edges[e].loops.iter().copied())
            .filter(|&l| self.loops[l].vert == v)
            .collect()
    }

    /// Faces touching `v`, each once.
    pub fn vert_faces(&self, v: VertId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for l in self.vert_loops(v) {
            let f = self.loops[l].face;
            if !faces.contains(&f) {
                faces.push(f);
            }
        }
        faces
    }

    // =========================================================================
    // Edge adjacency
    // =========================================================================

    /// Edge connecting `a` and `b`, if any.
    pub fn edge_between(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        if a == b {
            return None;
        }
        self.verts
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges[e].verts.contains(&b))
    }

    /// The two endpoints of an edge, in creation order.
    pub fn edge_verts(&self, e: EdgeId) -> [VertId; 2] {
        self.edges[e].verts
    }

    /// The endpoint of `e` that is not `v`.
    pub fn edge_other_vert(&self, e: EdgeId, v: VertId) -> Option<VertId> {
        match self.edges[e].verts {
            [a, b] if a == v => Some(b),
            [a, b] if b == v => Some(a),
            _ => None,
        }
    }

    /// Loops running along `e` (its radial cycle).
    pub fn edge_loops(&self, e: EdgeId) -> &[LoopId] {
        &self.edges[e].loops
    }

    /// Faces using `e`.
    pub fn edge_faces(&self, e: EdgeId) -> Vec<FaceId> {
        self.edges[e].loops.iter().map(|&l| self.loops[l].face).collect()
    }

    /// Exactly two faces use this edge.
    pub fn edge_is_manifold(&self, e: EdgeId) -> bool {
        self.edges[e].loops.len() == 2
    }

    /// No face uses this edge.
    pub fn edge_is_wire(&self, e: EdgeId) -> bool {
        self.edges[e].loops.is_empty()
    }

    /// Euclidean edge length.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let [a, b] = self.edges[e].verts;
        (self.verts[b].co - self.verts[a].co).norm()
    }

    /// Midpoint of an edge.
    pub fn edge_center(&self, e: EdgeId) -> Point3 {
        let [a, b] = self.edges[e].verts;
        hyperbevel_math::midpoint(&self.verts[a].co, &self.verts[b].co)
    }

    // =========================================================================
    // Face adjacency
    // =========================================================================

    /// Face corners in winding order.
    pub fn face_loops(&self, f: FaceId) -> &[LoopId] {
        &self.faces[f].loops
    }

    /// Face vertices in winding order.
    pub fn face_verts(&self, f: FaceId) -> Vec<VertId> {
        self.faces[f].loops.iter().map(|&l| self.loops[l].vert).collect()
    }

    /// Face edges in winding order.
    pub fn face_edges(&self, f: FaceId) -> Vec<EdgeId> {
        self.faces[f].loops.iter().map(|&l| self.loops[l].edge).collect()
    }

    /// Number of corners.
    pub fn face_len(&self, f: FaceId) -> usize {
        self.faces[f].loops.len()
    }

    /// Face positions in winding order.
    pub fn face_coords(&self, f: FaceId) -> Vec<Point3> {
        self.faces[f]
            .loops
            .iter()
            .map(|&l| self.verts[self.loops[l].vert].co)
            .collect()
    }

    // =========================================================================
    // Loop navigation
    // =========================================================================

    /// Corner vertex.
    pub fn loop_vert(&self, l: LoopId) -> VertId {
        self.loops[l].vert
    }

    /// Edge from this corner to the next.
    pub fn loop_edge(&self, l: LoopId) -> EdgeId {
        self.loops[l].edge
    }

    /// Owning face.
    pub fn loop_face(&self, l: LoopId) -> FaceId {
        self.loops[l].face
    }

    /// Next corner in the face.
    pub fn loop_next(&self, l: LoopId) -> LoopId {
        self.loops[l].next
    }

    /// Previous corner in the face.
    pub fn loop_prev(&self, l: LoopId) -> LoopId {
        self.loops[l].prev
    }

    /// Next loop around the same edge. For a boundary edge this is `l` itself.
    pub fn loop_radial_next(&self, l: LoopId) -> LoopId {
        let radial = &self.edges[self.loops[l].edge].loops;
        match radial.iter().position(|&x| x == l) {
            Some(i) => radial[(i + 1) % radial.len()],
            None => l,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_pair() -> (Mesh, [VertId; 6]) {
        let mut mesh = Mesh::new();
        let v = [
            mesh.add_vert(Point3::new(0.0, 0.0, 0.0)),
            mesh.add_vert(Point3::new(1.0, 0.0, 0.0)),
            mesh.add_vert(Point3::new(2.0, 0.0, 0.0)),
            mesh.add_vert(Point3::new(0.0, 1.0, 0.0)),
            mesh.add_vert(Point3::new(1.0, 1.0, 0.0)),
            mesh.add_vert(Point3::new(2.0, 1.0, 0.0)),
        ];
        mesh.add_face(&[v[0], v[1], v[4], v[3]]).unwrap();
        mesh.add_face(&[v[1], v[2], v[5], v[4]]).unwrap();
        (mesh, v)
    }

    #[test]
    fn test_shared_edge_is_manifold() {
        let (mesh, v) = quad_pair();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.edge_count(), 7);
        let shared = mesh.edge_between(v[1], v[4]).unwrap();
        assert!(mesh.edge_is_manifold(shared));
        let border = mesh.edge_between(v[0], v[1]).unwrap();
        assert!(!mesh.edge_is_manifold(border));
    }

    #[test]
    fn test_loop_cycle_and_radial() {
        let (mesh, v) = quad_pair();
        let shared = mesh.edge_between(v[1], v[4]).unwrap();
        let l = mesh.edge_loops(shared)[0];
        let other = mesh.loop_radial_next(l);
        assert_ne!(mesh.loop_face(l), mesh.loop_face(other));
        assert_eq!(mesh.loop_radial_next(other), l);
        // The two corners run the shared edge in opposite directions.
        assert_ne!(mesh.loop_vert(l), mesh.loop_vert(other));

        let mut cur = l;
        for _ in 0..4 {
            cur = mesh.loop_next(cur);
        }
        assert_eq!(cur, l);
        assert_eq!(mesh.loop_prev(mesh.loop_next(l)), l);
    }

    #[test]
    fn test_boundary_radial_is_self() {
        let (mesh, v) = quad_pair();
        let border = mesh.edge_between(v[0], v[1]).unwrap();
        let l = mesh.edge_loops(border)[0];
        assert_eq!(mesh.loop_radial_next(l), l);
    }

    #[test]
    fn test_face_normal_newell() {
        let (mesh, _) = quad_pair();
        for f in mesh.faces() {
            assert!((mesh.face(f).normal - Vec3::z()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_face_has_zero_normal() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vert(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vert(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vert(Point3::new(2.0, 0.0, 0.0));
        let f = mesh.add_face(&[a, b, c]).unwrap();
        assert_eq!(mesh.face(f).normal, Vec3::zeros());
    }

    #[test]
    fn test_add_face_rejects_bad_input() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vert(Point3::origin());
        let b = mesh.add_vert(Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.add_face(&[a, b]), Err(MeshError::TooFewVertices(2)));
        assert_eq!(mesh.add_face(&[a, b, a]), Err(MeshError::RepeatedVertex(a)));
    }

    #[test]
    fn test_vert_loops_and_faces() {
        let (mesh, v) = quad_pair();
        assert_eq!(mesh.vert_loops(v[1]).len(), 2);
        assert_eq!(mesh.vert_faces(v[1]).len(), 2);
        assert_eq!(mesh.vert_faces(v[0]).len(), 1);
        for l in mesh.vert_loops(v[4]) {
            assert_eq!(mesh.loop_vert(l), v[4]);
        }
    }

    #[test]
    fn test_remove_face_keeps_edges() {
        let (mut mesh, v) = quad_pair();
        let f = mesh.faces().next().unwrap();
        mesh.remove_face(f);
        assert_eq!(mesh.face_count(), 1);
        let shared = mesh.edge_between(v[1], v[4]).unwrap();
        assert_eq!(mesh.edge_loops(shared).len(), 1);
        let wire = mesh.edge_between(v[0], v[1]).unwrap();
        assert!(mesh.edge_is_wire(wire));
        mesh.remove_wire_edge(wire);
        assert!(mesh.edge_between(v[0], v[1]).is_none());
    }
}
