//! Ray and nearest-point queries over a mesh snapshot.
//!
//! Faces are fanned into triangles and stored in a median-split BVH. The
//! cache does not track edits; rebuild it after changing the mesh.

use hyperbevel_math::{closest_point_on_triangle, intersect_ray_triangle, Dir3, Point3, Vec3};

use crate::topology::{FaceId, Mesh};

const LEAF_SIZE: usize = 4;

/// A ray with a unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    inv_direction: Vec3,
    sign: [usize; 3],
}

impl Ray {
    /// Create a ray. The direction is normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Slab test. Returns the entry and exit parameters, clamped to `t >= 0`.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];
        let mut t_min = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let mut t_max = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Box from corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Inverted box, ready for [`Aabb3::include_point`].
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Grow to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grow to contain another box.
    pub fn include(&mut self, other: &Aabb3) {
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Squared distance from `p` to the box, zero inside.
    pub fn distance_squared(&self, p: &Point3) -> f64 {
        let clamped = p.sup(&self.min).inf(&self.max);
        (p - clamped).norm_squared()
    }
}

/// Closest hit of a ray against the mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshHit {
    /// Face that was hit.
    pub face: FaceId,
    /// Distance along the ray.
    pub t: f64,
    /// Hit position.
    pub point: Point3,
    /// Face normal at the hit.
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Tri {
    face: FaceId,
    v: [Point3; 3],
}

impl Tri {
    fn aabb(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for p in &self.v {
            aabb.include_point(p);
        }
        aabb
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        aabb: Aabb3,
        tris: Vec<usize>,
    },
    Internal {
        aabb: Aabb3,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Triangle BVH over a mesh snapshot.
#[derive(Debug, Clone)]
pub struct RaycastCache {
    tris: Vec<Tri>,
    normals: Vec<(FaceId, Vec3)>,
    root: Option<BvhNode>,
}

impl RaycastCache {
    /// Snapshot `mesh` and build the tree.
    pub fn build(mesh: &Mesh) -> Self {
        let mut tris = Vec::new();
        let mut normals = Vec::with_capacity(mesh.face_count());
        for f in mesh.faces() {
            let coords = mesh.face_coords(f);
            for i in 1..coords.len().saturating_sub(1) {
                tris.push(Tri {
                    face: f,
                    v: [coords[0], coords[i], coords[i + 1]],
                });
            }
            normals.push((f, mesh.face(f).normal));
        }

        let mut items: Vec<(usize, Aabb3, Point3)> = tris
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let aabb = t.aabb();
                (i, aabb, aabb.center())
            })
            .collect();
        let root = if items.is_empty() {
            None
        } else {
            Some(build_node(&mut items))
        };

        Self {
            tris,
            normals,
            root,
        }
    }

    /// Number of triangles in the snapshot.
    pub fn triangle_count(&self) -> usize {
        self.tris.len()
    }

    /// Closest hit along `ray`.
    pub fn raycast(&self, ray: &Ray) -> Option<MeshHit> {
        let root = self.root.as_ref()?;
        let mut best: Option<(usize, f64)> = None;
        self.raycast_node(ray, root, &mut best);
        best.map(|(i, t)| {
            let face = self.tris[i].face;
            MeshHit {
                face,
                t,
                point: ray.at(t),
                normal: self.face_normal(face),
            }
        })
    }

    fn raycast_node(&self, ray: &Ray, node: &BvhNode, best: &mut Option<(usize, f64)>) {
        let Some((t_enter, _)) = ray.intersect_aabb(node.aabb()) else {
            return;
        };
        if best.is_some_and(|(_, t)| t_enter > t) {
            return;
        }
        match node {
            BvhNode::Leaf { tris, .. } => {
                for &i in tris {
                    let [a, b, c] = &self.tris[i].v;
                    if let Some(t) = intersect_ray_triangle(&ray.origin, ray.direction.as_ref(), a, b, c) {
                        if best.map_or(true, |(_, bt)| t < bt) {
                            *best = Some((i, t));
                        }
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let (near, far) = match (ray.intersect_aabb(left.aabb()), ray.intersect_aabb(right.aabb())) {
                    (Some((l, _)), Some((r, _))) if r < l => (right, left),
                    _ => (left, right),
                };
                self.raycast_node(ray, near, best);
                self.raycast_node(ray, far, best);
            }
        }
    }

    /// Face nearest to `p`, with the closest point on it and its distance.
    pub fn closest_face(&self, p: &Point3) -> Option<(FaceId, Point3, f64)> {
        let root = self.root.as_ref()?;
        let mut best: Option<(usize, Point3, f64)> = None;
        self.closest_node(p, root, &mut best);
        best.map(|(i, q, d2)| (self.tris[i].face, q, d2.sqrt()))
    }

    fn closest_node(&self, p: &Point3, node: &BvhNode, best: &mut Option<(usize, Point3, f64)>) {
        if best.is_some_and(|(_, _, d2)| node.aabb().distance_squared(p) > d2) {
            return;
        }
        match node {
            BvhNode::Leaf { tris, .. } => {
                for &i in tris {
                    let [a, b, c] = &self.tris[i].v;
                    let q = closest_point_on_triangle(p, a, b, c);
                    let d2 = (q - p).norm_squared();
                    if best.map_or(true, |(_, _, bd)| d2 < bd) {
                        *best = Some((i, q, d2));
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let (near, far) = if right.aabb().distance_squared(p) < left.aabb().distance_squared(p) {
                    (right, left)
                } else {
                    (left, right)
                };
                self.closest_node(p, near, best);
                self.closest_node(p, far, best);
            }
        }
    }

    fn face_normal(&self, face: FaceId) -> Vec3 {
        self.normals
            .iter()
            .find(|(f, _)| *f == face)
            .map(|&(_, n)| n)
            .unwrap_or_else(Vec3::zeros)
    }
}

fn build_node(items: &mut [(usize, Aabb3, Point3)]) -> BvhNode {
    let mut aabb = Aabb3::empty();
    for (_, b, _) in items.iter() {
        aabb.include(b);
    }
    if items.len() <= LEAF_SIZE {
        return BvhNode::Leaf {
            aabb,
            tris: items.iter().map(|(i, _, _)| *i).collect(),
        };
    }

    let extent = aabb.max - aabb.min;
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };
    items.sort_by(|a, b| a.2[axis].total_cmp(&b.2[axis]));
    let mid = items.len() / 2;
    let (lo, hi) = items.split_at_mut(mid);
    BvhNode::Internal {
        aabb,
        left: Box::new(build_node(lo)),
        right: Box::new(build_node(hi)),
    }
}
