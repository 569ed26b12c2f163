//! Pointer picking and selection transfer.

use hyperbevel_math::{closest_point_on_line, Point3, Transform, Vec3};
use hyperbevel_mesh::{EdgeId, FaceId, Mesh, RaycastCache, Ray};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which mesh an edge record was resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeSource {
    /// The host mesh as-is.
    Orig,
    /// The merged-by-distance copy.
    Weld,
}

/// A selected edge, with enough context to find it again on another mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    /// Mesh the edge belongs to.
    pub source: EdgeSource,
    /// Local-space point used to resolve the edge.
    pub hit: Point3,
    /// The edge.
    pub edge: EdgeId,
    /// World-space endpoints, for drawing.
    pub coords: [Point3; 2],
}

impl EdgeRecord {
    /// Record for `edge` keyed by its own midpoint.
    pub fn from_edge(target: &SelectTarget<'_>, edge: EdgeId) -> Self {
        let [a, b] = target.mesh.edge_verts(edge);
        Self {
            source: target.source,
            hit: target.mesh.edge_center(edge),
            edge,
            coords: [
                target.transform.apply_point(&target.mesh.co(a)),
                target.transform.apply_point(&target.mesh.co(b)),
            ],
        }
    }

    /// Same edge on the same mesh.
    pub fn same_edge(&self, other: &EdgeRecord) -> bool {
        self.source == other.source && self.edge == other.edge
    }
}

/// A mesh prepared for picking.
#[derive(Debug, Clone, Copy)]
pub struct SelectTarget<'a> {
    /// Mesh in its local frame.
    pub mesh: &'a Mesh,
    /// Raycast acceleration over `mesh`.
    pub cache: &'a RaycastCache,
    /// Local to world.
    pub transform: &'a Transform,
    /// Tag for records resolved on this mesh.
    pub source: EdgeSource,
}

/// Result of a pick: the edge, plus the plane a width drag starts on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// The picked edge.
    pub record: EdgeRecord,
    /// World-space hit location.
    pub drag_origin: Point3,
    /// World-space face normal at the hit.
    pub drag_normal: Vec3,
}

/// Edge of `face` closest to `hit`.
///
/// Scores every manifold, non-zero-length edge by
/// `distance_to_line * distance_to_midpoint / length` and keeps the lowest.
pub fn best_edge_on_face(mesh: &Mesh, face: FaceId, hit: &Point3) -> Option<EdgeId> {
    mesh.face_edges(face)
        .into_iter()
        .filter(|&e| mesh.edge_is_manifold(e))
        .filter_map(|e| {
            let length = mesh.edge_length(e);
            if length <= 0.0 {
                return None;
            }
            let [a, b] = mesh.edge_verts(e);
            let (on_line, _) = closest_point_on_line(hit, &mesh.co(a), &mesh.co(b))?;
            let d_perp = (hit - on_line).norm();
            let d_mid = (hit - mesh.edge_center(e)).norm();
            Some((e, d_perp * d_mid / length))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Raycast a world-space ray and resolve the edge under it.
pub fn pick_active_edge(target: &SelectTarget<'_>, origin: &Point3, dir: &Vec3) -> Option<Pick> {
    let inverse = target.transform.inverse()?;
    let ray = Ray::new(inverse.apply_point(origin), inverse.apply_vec(dir));
    let hit = target.cache.raycast(&ray)?;
    let edge = best_edge_on_face(target.mesh, hit.face, &hit.point)?;

    let mut record = EdgeRecord::from_edge(target, edge);
    record.hit = hit.point;
    Some(Pick {
        record,
        drag_origin: target.transform.apply_point(&hit.point),
        drag_normal: target.transform.apply_normal(&hit.normal),
    })
}

/// Re-resolve records on another mesh sharing the same frame.
///
/// Each record's hit point is snapped to the nearest face of `target` and
/// scored there. Records that resolve to nothing are dropped, duplicates
/// are merged.
pub fn transfer(records: &[EdgeRecord], target: &SelectTarget<'_>) -> Vec<EdgeRecord> {
    let mut out: Vec<EdgeRecord> = Vec::with_capacity(records.len());
    for record in records {
        let Some((face, _, _)) = target.cache.closest_face(&record.hit) else {
            continue;
        };
        let Some(edge) = best_edge_on_face(target.mesh, face, &record.hit) else {
            continue;
        };
        if out.iter().all(|r| r.edge != edge) {
            out.push(EdgeRecord::from_edge(target, edge));
        }
    }
    debug!(from = records.len(), to = out.len(), "transferred edge selection");
    out
}

/// Re-resolve the active edge on another mesh, keeping its hit point.
pub fn transfer_active(record: &EdgeRecord, target: &SelectTarget<'_>) -> Option<Pick> {
    let (face, closest, _) = target.cache.closest_face(&record.hit)?;
    let edge = best_edge_on_face(target.mesh, face, &record.hit)?;
    let mut moved = EdgeRecord::from_edge(target, edge);
    moved.hit = record.hit;
    Some(Pick {
        record: moved,
        drag_origin: target.transform.apply_point(&closest),
        drag_normal: target.transform.apply_normal(&target.mesh.face(face).normal),
    })
}
