//! Derived geometric queries: edge normals, convexity, centers, shell factors.

use hyperbevel_math::{angle_between, average_normals, centroid, Point3, Vec3};

use crate::topology::{EdgeId, FaceId, LoopId, Mesh, VertId};

impl Mesh {
    /// Average of the normals of the faces using `e`, normalized.
    ///
    /// `None` for wire edges and when the face normals cancel out.
    pub fn edge_normal(&self, e: EdgeId) -> Option<Vec3> {
        let normals: Vec<Vec3> = self.edge_faces(e).iter().map(|&f| self.face(f).normal).collect();
        average_normals(normals.iter())
    }

    /// Convexity of a two-face edge.
    ///
    /// Let `d` run from the edge's first to its second vertex and `A` be the
    /// face whose loop runs along `d`. The edge is convex when
    /// `d x edge_normal . normal(A)` is not positive. Coplanar faces count as
    /// convex, as do edges without a usable normal.
    pub fn edge_is_convex(&self, e: EdgeId) -> bool {
        let [v0, v1] = self.edge_verts(e);
        let Some(normal) = self.edge_normal(e) else {
            return true;
        };
        let loops = self.edge_loops(e);
        let Some(&l) = loops
            .iter()
            .find(|&&l| self.loop_vert(l) == v0)
            .or_else(|| loops.first())
        else {
            return true;
        };
        let mut d = self.co(v1) - self.co(v0);
        if self.loop_vert(l) != v0 {
            d = -d;
        }
        let face_normal = self.face(self.loop_face(l)).normal;
        d.cross(&normal).dot(&face_normal) <= 0.0
    }

    /// Mean of the face's vertex positions.
    pub fn face_center_median(&self, f: FaceId) -> Point3 {
        let coords = self.face_coords(f);
        centroid(coords.iter()).unwrap_or_else(Point3::origin)
    }

    /// Vertex mean weighted by the lengths of the two edges at each corner.
    pub fn face_center_median_weighted(&self, f: FaceId) -> Point3 {
        let coords = self.face_coords(f);
        let n = coords.len();
        let mut sum = Vec3::zeros();
        let mut total = 0.0;
        for i in 0..n {
            let prev = coords[(i + n - 1) % n];
            let next = coords[(i + 1) % n];
            let w = (coords[i] - prev).norm() + (next - coords[i]).norm();
            sum += coords[i].coords * w;
            total += w;
        }
        if total > 0.0 {
            Point3::from(sum / total)
        } else {
            self.face_center_median(f)
        }
    }

    /// Interior angle of the face at this corner, in radians.
    pub fn loop_corner_angle(&self, l: LoopId) -> f64 {
        let co = self.co(self.loop_vert(l));
        let prev = self.co(self.loop_vert(self.loop_prev(l)));
        let next = self.co(self.loop_vert(self.loop_next(l)));
        angle_between(&(prev - co), &(next - co)).unwrap_or(0.0)
    }

    /// Angle-weighted shell factor of `v` over a subset of its faces.
    ///
    /// For every corner of `v` in `faces`, `1 / |normal . face_normal|` is
    /// weighted by the corner angle. Returns 1 when nothing contributes.
    pub fn vert_shell_factor(&self, v: VertId, faces: &[FaceId], normal: &Vec3) -> f64 {
        let mut accum_shell = 0.0;
        let mut accum_angle = 0.0;
        for l in self.vert_loops(v) {
            let f = self.loop_face(l);
            if !faces.contains(&f) {
                continue;
            }
            let angle = self.loop_corner_angle(l);
            let cos = normal.dot(&self.face(f).normal).abs();
            let factor = if cos < 1e-6 { 1.0 } else { 1.0 / cos };
            accum_shell += factor * angle;
            accum_angle += angle;
        }
        if accum_angle > 0.0 {
            accum_shell / accum_angle
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::primitives;
    use approx::assert_relative_eq;
    use hyperbevel_math::{Point3, Vec3};

    #[test]
    fn test_cube_edges_are_convex() {
        let (mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
        for e in mesh.edges() {
            assert!(mesh.edge_is_convex(e), "cube edge should be convex");
        }
    }

    #[test]
    fn test_l_prism_inner_edge_is_concave() {
        let (mesh, ids) = primitives::l_prism().to_mesh().unwrap();
        let inner = mesh.edge_between(ids[3], ids[9]).unwrap();
        assert_relative_eq!(mesh.co(ids[3]), Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(mesh.co(ids[9]), Point3::new(0.0, 1.0, 0.0));
        assert!(!mesh.edge_is_convex(inner));
        let outer = mesh.edge_between(ids[1], ids[7]).unwrap();
        assert!(mesh.edge_is_convex(outer));
    }

    #[test]
    fn test_edge_normal_bisects() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let e = mesh.edge_between(ids[4], ids[5]).unwrap();
        let n = mesh.edge_normal(e).unwrap();
        assert_relative_eq!(n, Vec3::new(0.0, -1.0, 1.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn test_face_centers() {
        let (mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
        for f in mesh.faces() {
            let c = mesh.face_center_median(f);
            let w = mesh.face_center_median_weighted(f);
            assert_relative_eq!(c, w, epsilon = 1e-12);
            assert_relative_eq!(c.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_shell_factor_right_angle() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let v = ids[4];
        let top = mesh.vert_faces(v).into_iter().find(|&f| mesh.face(f).normal.z > 0.5).unwrap();
        let front = mesh.vert_faces(v).into_iter().find(|&f| mesh.face(f).normal.y < -0.5).unwrap();
        let normal = Vec3::new(0.0, -1.0, 1.0).normalize();
        let factor = mesh.vert_shell_factor(v, &[top, front], &normal);
        assert_relative_eq!(factor, 2f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(mesh.vert_shell_factor(v, &[top], &Vec3::z()), 1.0, epsilon = 1e-12);
    }
}
