//! Topology edits: region extrusion, dissolve, reverse and delete.

use std::collections::{HashMap, HashSet};

use crate::error::{MeshError, Result};
use crate::topology::{EdgeId, FaceId, LoopId, Mesh, VertId};

/// Result of [`Mesh::extrude_face_region`].
#[derive(Debug, Clone, Default)]
pub struct ExtrudeRegion {
    /// Copies of the input faces, in input order, sharing their winding.
    pub top_faces: Vec<FaceId>,
    /// One quad per boundary edge of the region.
    pub side_faces: Vec<FaceId>,
    /// Region vertices in order of first appearance, paired with their copy.
    pub vert_map: Vec<(VertId, VertId)>,
}

impl ExtrudeRegion {
    /// The copy of a region vertex.
    pub fn top_of(&self, v: VertId) -> Option<VertId> {
        self.vert_map.iter().find(|(b, _)| *b == v).map(|&(_, t)| t)
    }

    /// Copied vertices, in region order.
    pub fn top_verts(&self) -> impl Iterator<Item = VertId> + '_ {
        self.vert_map.iter().map(|&(_, t)| t)
    }
}

impl Mesh {
    /// Duplicate a face region, bridge its boundary with side quads and
    /// reverse the original faces so the result is a closed shell.
    ///
    /// Copied vertices start at the original positions. Copied faces and
    /// edges inherit smooth flags and gizmo tags.
    pub fn extrude_face_region(&mut self, faces: &[FaceId]) -> Result<ExtrudeRegion> {
        for &f in faces {
            if !self.faces.contains_key(f) {
                return Err(MeshError::MissingFace(f));
            }
        }
        let region: HashSet<FaceId> = faces.iter().copied().collect();

        let mut out = ExtrudeRegion::default();
        let mut map: HashMap<VertId, VertId> = HashMap::new();
        for &f in faces {
            for v in self.face_verts(f) {
                if !map.contains_key(&v) {
                    let top = self.add_vert(self.co(v));
                    map.insert(v, top);
                    out.vert_map.push((v, top));
                }
            }
        }

        for &f in faces {
            let verts: Vec<VertId> = self.face_verts(f).iter().map(|v| map[v]).collect();
            let top = self.add_face(&verts)?;
            let (smooth, gizmo) = (self.faces[f].smooth, self.faces[f].gizmo);
            self.faces[top].smooth = smooth;
            self.faces[top].gizmo = gizmo;
            out.top_faces.push(top);
        }

        let region_edges: HashSet<EdgeId> = faces.iter().flat_map(|&f| self.face_edges(f)).collect();
        for e in region_edges {
            let gizmo = self.edges[e].gizmo;
            if gizmo != 0 {
                let [a, b] = self.edges[e].verts;
                if let Some(top) = self.edge_between(map[&a], map[&b]) {
                    self.edges[top].gizmo = gizmo;
                }
            }
        }

        for &f in faces {
            for l in self.face_loops(f).to_vec() {
                if !self.is_region_boundary(l, &region) {
                    continue;
                }
                let a = self.loops[l].vert;
                let b = self.loops[self.loops[l].next].vert;
                let side = self.add_face(&[a, b, map[&b], map[&a]])?;
                self.faces[side].smooth = self.faces[f].smooth;
                out.side_faces.push(side);
            }
        }

        self.reverse_faces(faces);
        Ok(out)
    }

    fn is_region_boundary(&self, l: LoopId, region: &HashSet<FaceId>) -> bool {
        let e = self.loops[l].edge;
        self.edges[e]
            .loops
            .iter()
            .filter(|&&x| region.contains(&self.loops[x].face))
            .count()
            == 1
    }

    /// Flip the winding of every listed face in place. Handles stay valid.
    pub fn reverse_faces(&mut self, faces: &[FaceId]) {
        for &f in faces {
            let Some(face) = self.faces.get(f) else {
                continue;
            };
            let old = face.loops.clone();
            let n = old.len();
            let edges: Vec<EdgeId> = old.iter().map(|&l| self.loops[l].edge).collect();

            // Corner i now runs back along the edge that used to end at it.
            for i in 0..n {
                let prev = (i + n - 1) % n;
                let e = edges[prev];
                self.loops[old[i]].edge = e;
                for slot in self.edges[e].loops.iter_mut() {
                    if *slot == old[prev] {
                        *slot = old[i];
                        break;
                    }
                }
            }

            let reversed: Vec<LoopId> = old.into_iter().rev().collect();
            self.link_face_loops(f, reversed);
            self.faces[f].normal = -self.faces[f].normal;
        }
    }

    /// Delete faces, then any edges and vertices they leave unused.
    pub fn delete_faces(&mut self, faces: &[FaceId]) {
        let mut edges = Vec::new();
        for &f in faces {
            if let Some(face) = self.faces.get(f) {
                edges.extend(face.loops.iter().map(|&l| self.loops[l].edge));
            }
            self.remove_face(f);
        }
        self.prune_wire(&edges);
    }

    /// Merge a connected face region into one polygon along its boundary.
    ///
    /// The region must have exactly one boundary cycle. The new face takes
    /// the first face's smooth flag and gizmo tag. Interior edges are removed.
    pub fn dissolve_faces(&mut self, faces: &[FaceId]) -> Result<FaceId> {
        let first = *faces.first().ok_or(MeshError::NotDissolvable)?;
        for &f in faces {
            if !self.faces.contains_key(f) {
                return Err(MeshError::MissingFace(f));
            }
        }
        if faces.len() == 1 {
            return Ok(first);
        }
        let region: HashSet<FaceId> = faces.iter().copied().collect();

        let mut next_of: HashMap<VertId, VertId> = HashMap::new();
        let mut start = None;
        for &f in faces {
            for &l in &self.faces[f].loops {
                if !self.is_region_boundary(l, &region) {
                    continue;
                }
                let a = self.loops[l].vert;
                let b = self.loops[self.loops[l].next].vert;
                if next_of.insert(a, b).is_some() {
                    return Err(MeshError::NotDissolvable);
                }
                start.get_or_insert(a);
            }
        }
        let start = start.ok_or(MeshError::NotDissolvable)?;

        let mut chain = vec![start];
        let mut cur = start;
        loop {
            let next = *next_of.get(&cur).ok_or(MeshError::NotDissolvable)?;
            if next == start {
                break;
            }
            if chain.len() > next_of.len() {
                return Err(MeshError::NotDissolvable);
            }
            chain.push(next);
            cur = next;
        }
        if chain.len() != next_of.len() || chain.len() < 3 {
            return Err(MeshError::NotDissolvable);
        }

        let (smooth, gizmo) = (self.faces[first].smooth, self.faces[first].gizmo);
        let edges: Vec<EdgeId> = faces.iter().flat_map(|&f| self.face_edges(f)).collect();
        for &f in faces {
            self.remove_face(f);
        }
        let merged = self.add_face(&chain)?;
        self.faces[merged].smooth = smooth;
        self.faces[merged].gizmo = gizmo;
        self.prune_wire(&edges);
        Ok(merged)
    }

    fn prune_wire(&mut self, edges: &[EdgeId]) {
        let mut verts = Vec::new();
        for &e in edges {
            if let Some(edge) = self.edges.get(e) {
                if edge.loops.is_empty() {
                    verts.extend(edge.verts);
                    self.remove_wire_edge(e);
                }
            }
        }
        for v in verts {
            if self.verts.get(v).is_some_and(|vert| vert.edges.is_empty()) {
                self.verts.remove(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::primitives;
    use crate::topology::Mesh;
    use approx::assert_relative_eq;
    use hyperbevel_math::{Point3, Vec3};

    fn assert_closed(mesh: &Mesh) {
        for e in mesh.edges() {
            assert!(mesh.edge_is_manifold(e));
            let loops = mesh.edge_loops(e);
            assert_ne!(mesh.loop_vert(loops[0]), mesh.loop_vert(loops[1]));
        }
    }

    #[test]
    fn test_reverse_keeps_topology_consistent() {
        let (mut mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
        let faces: Vec<_> = mesh.faces().collect();
        mesh.reverse_faces(&faces);
        assert_closed(&mesh);
        for f in mesh.faces() {
            let c = mesh.face_center_median(f);
            assert!(mesh.face(f).normal.dot(&c.coords) < 0.0);
            for &l in mesh.face_loops(f) {
                let [a, b] = mesh.edge_verts(mesh.loop_edge(l));
                let from = mesh.loop_vert(l);
                let to = mesh.loop_vert(mesh.loop_next(l));
                assert!((a == from && b == to) || (a == to && b == from));
            }
        }
    }

    #[test]
    fn test_extrude_grid_is_closed() {
        let (mut mesh, _) = primitives::grid(2, 1).to_mesh().unwrap();
        let faces: Vec<_> = mesh.faces().collect();
        let region = mesh.extrude_face_region(&faces).unwrap();
        assert_eq!(region.top_faces.len(), 2);
        assert_eq!(region.side_faces.len(), 6);
        assert_eq!(region.vert_map.len(), 6);
        assert_eq!(mesh.face_count(), 10);

        for v in region.top_verts().collect::<Vec<_>>() {
            let co = mesh.co(v);
            mesh.set_co(v, co + Vec3::z());
        }
        mesh.normal_update();
        assert_closed(&mesh);
        for &f in &region.top_faces {
            assert_relative_eq!(mesh.face(f).normal, Vec3::z(), epsilon = 1e-12);
        }
        for &f in &faces {
            assert_relative_eq!(mesh.face(f).normal, -Vec3::z(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_extrude_copies_tags() {
        let (mut mesh, ids) = primitives::grid(1, 1).to_mesh().unwrap();
        let e = mesh.edge_between(ids[0], ids[1]).unwrap();
        mesh.edge_mut(e).gizmo = 1;
        let f = mesh.faces().next().unwrap();
        mesh.face_mut(f).smooth = true;
        let region = mesh.extrude_face_region(&[f]).unwrap();
        let top = mesh
            .edge_between(region.top_of(ids[0]).unwrap(), region.top_of(ids[1]).unwrap())
            .unwrap();
        assert_eq!(mesh.edge(top).gizmo, 1);
        assert!(mesh.face(region.top_faces[0]).smooth);
    }

    #[test]
    fn test_dissolve_two_quads() {
        let (mut mesh, ids) = primitives::grid(2, 1).to_mesh().unwrap();
        let faces: Vec<_> = mesh.faces().collect();
        let merged = mesh.dissolve_faces(&faces).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face_len(merged), 6);
        assert!(mesh.edge_between(ids[1], ids[4]).is_none());
        assert_eq!(mesh.vert_count(), 6);
        assert_relative_eq!(mesh.face(merged).normal, Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_dissolve_rejects_disjoint_faces() {
        let (mut mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
        let faces: Vec<_> = mesh.faces().collect();
        // Top and bottom share no edge: two boundary cycles.
        let pair = [faces[0], faces[1]];
        assert!(mesh.dissolve_faces(&pair).is_err());
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn test_delete_faces_removes_orphans() {
        let (mut mesh, ids) = primitives::grid(2, 1).to_mesh().unwrap();
        let f = mesh.faces().next().unwrap();
        mesh.delete_faces(&[f]);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vert_count(), 4);
        assert!(!mesh.contains_vert(ids[0]));
        assert!(mesh.contains_vert(ids[1]));
        assert_eq!(mesh.co(ids[1]), Point3::new(1.0, 0.0, 0.0));
    }
}
