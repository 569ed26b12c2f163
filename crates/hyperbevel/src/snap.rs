//! Raycast and snap helpers over named objects.
//!
//! Each entry owns a mesh copy and its BVH so repeated queries during a
//! session never rebuild them. The cache is cleared when the session ends.

use std::collections::HashMap;

use hyperbevel_math::{closest_point_on_line, Point3, Transform, Vec3};
use hyperbevel_mesh::{EdgeId, FaceId, Mesh, RaycastCache, Ray, VertId};
use hyperbevel_select::{EdgeSource, SelectTarget};
use tracing::debug;

/// A mesh prepared for queries.
#[derive(Debug, Clone)]
pub struct SnapEntry {
    /// Local-frame mesh copy.
    pub mesh: Mesh,
    /// BVH over the mesh triangles.
    pub cache: RaycastCache,
    /// Object transform.
    pub transform: Transform,
}

/// Nearest ray hit across the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneHit {
    /// Name of the object hit.
    pub object: String,
    /// Face hit.
    pub face: FaceId,
    /// Hit in the object's local frame.
    pub local_hit: Point3,
    /// Hit in world space.
    pub point: Point3,
    /// World-space face normal.
    pub normal: Vec3,
    /// World-space distance from the ray origin.
    pub distance: f64,
}

/// Closest elements of an object to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapHit {
    /// Face containing the closest point.
    pub face: FaceId,
    /// Closest vertex of that face.
    pub vert: VertId,
    /// Closest edge of that face.
    pub edge: EdgeId,
    /// Closest point on the face, world space.
    pub point: Point3,
    /// World-space distance to that point.
    pub distance: f64,
}

/// Raycast BVHs and mesh copies keyed by object name.
#[derive(Debug, Clone, Default)]
pub struct SnapCache {
    entries: HashMap<String, SnapEntry>,
}

impl SnapCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache `mesh` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh, transform: Transform) -> &SnapEntry {
        let name = name.into();
        let cache = RaycastCache::build(&mesh);
        debug!(object = %name, tris = cache.triangle_count(), "cached snap target");
        self.entries.insert(name.clone(), SnapEntry { mesh, cache, transform });
        &self.entries[&name]
    }

    /// Entry cached under `name`.
    pub fn get(&self, name: &str) -> Option<&SnapEntry> {
        self.entries.get(name)
    }

    /// An entry exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Drop the entry under `name`.
    pub fn remove(&mut self, name: &str) -> Option<SnapEntry> {
        self.entries.remove(name)
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(count = self.entries.len(), "cleared snap cache");
        }
        self.entries.clear();
    }

    /// Picking view of a cached object.
    pub fn target(&self, name: &str, source: EdgeSource) -> Option<SelectTarget<'_>> {
        let entry = self.entries.get(name)?;
        Some(SelectTarget {
            mesh: &entry.mesh,
            cache: &entry.cache,
            transform: &entry.transform,
            source,
        })
    }

    /// Nearest hit of a world-space ray over every cached object.
    pub fn raycast(&self, origin: &Point3, dir: &Vec3) -> Option<SceneHit> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| {
                let inverse = entry.transform.inverse()?;
                let ray = Ray::new(inverse.apply_point(origin), inverse.apply_vec(dir));
                let hit = entry.cache.raycast(&ray)?;
                let point = entry.transform.apply_point(&hit.point);
                Some(SceneHit {
                    object: name.clone(),
                    face: hit.face,
                    local_hit: hit.point,
                    point,
                    normal: entry.transform.apply_normal(&hit.normal),
                    distance: (point - origin).norm(),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Closest face, vertex and edge of `name` to a world-space point.
    pub fn snap(&self, point: &Point3, name: &str) -> Option<SnapHit> {
        let entry = self.entries.get(name)?;
        let local = entry.transform.inverse()?.apply_point(point);
        let (face, closest, _) = entry.cache.closest_face(&local)?;
        let mesh = &entry.mesh;

        let vert = mesh
            .face_verts(face)
            .into_iter()
            .min_by(|&a, &b| (mesh.co(a) - local).norm().total_cmp(&(mesh.co(b) - local).norm()))?;
        let edge = mesh
            .face_edges(face)
            .into_iter()
            .map(|e| (e, segment_distance(mesh, e, &local)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e)?;

        let world = entry.transform.apply_point(&closest);
        Some(SnapHit {
            face,
            vert,
            edge,
            point: world,
            distance: (world - point).norm(),
        })
    }
}

fn segment_distance(mesh: &Mesh, e: EdgeId, p: &Point3) -> f64 {
    let [a, b] = mesh.edge_verts(e);
    let (a, b) = (mesh.co(a), mesh.co(b));
    match closest_point_on_line(p, &a, &b) {
        Some((_, t)) => (p - (a + (b - a) * t.clamp(0.0, 1.0))).norm(),
        None => (p - a).norm(),
    }
}
