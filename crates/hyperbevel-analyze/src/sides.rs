//! Steps 2 and 3: side directions, face directions and side edges.

use hyperbevel_math::{intersect_line_plane, normalized, Point3, Vec3};
use hyperbevel_mesh::{EdgeId, Mesh};
use tracing::warn;

use crate::options::{Side, SweepOption, SweepOptions};
use crate::record::{Sequence, SideData, VertexRecord};

/// Above this, a side edge at an open end runs too close to the walk.
pub const END_EDGE_PARALLEL: f64 = 0.98;

/// Above this, a side edge or inbetween direction runs too close to a
/// neighbouring sequence edge.
pub const NEIGHBOUR_PARALLEL: f64 = 0.9;

/// Average of the adjacent sequence edges' normals.
fn edge_based_normal(mesh: &Mesh, record: &VertexRecord) -> Vec3 {
    let prev = record.prev_edge.and_then(|e| mesh.edge_normal(e));
    let next = record.next_edge.and_then(|e| mesh.edge_normal(e));
    let averaged = match (prev, next) {
        (Some(a), Some(b)) => normalized(&((a + b) / 2.0)),
        (Some(n), None) | (None, Some(n)) => Some(n),
        (None, None) => None,
    };
    averaged
        .or_else(|| normalized(&mesh.face(record.left.face).normal))
        .unwrap_or_else(Vec3::z)
}

/// The unit vector in a face plane reached by offsetting along `side_dir`.
pub(crate) fn face_direction(co: &Point3, side_dir: &Vec3, face_normal: &Vec3) -> Vec3 {
    if *face_normal == Vec3::zeros() {
        return *side_dir;
    }
    let offset = co + side_dir * 0.1;
    intersect_line_plane(&offset, &(offset + face_normal), co, face_normal)
        .and_then(|i| normalized(&(i - co)))
        .unwrap_or(*side_dir)
}

/// Fill in normals and left/right/face directions.
pub(crate) fn side_directions(mesh: &Mesh, seq: &mut Sequence) {
    for record in &mut seq.records {
        let normal = edge_based_normal(mesh, record);
        let left_dir = normalized(&normal.cross(&record.dir)).unwrap_or_else(|| {
            let fallback = if record.dir.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
            fallback.cross(&record.dir).normalize()
        });
        record.normal = normal;
        record.left.dir = left_dir;
        record.right.dir = -left_dir;

        let co = record.co;
        for side in Side::BOTH {
            let data = record.side_mut(side);
            let face_normal = mesh.face(data.face).normal;
            data.face_dir = face_direction(&co, &data.dir, &face_normal);
        }
    }
}

/// Find side edges, compute their directions and promote `EDGE_DIR`.
pub(crate) fn side_edges(mesh: &Mesh, seq: &mut Sequence, weld_suggestion: &mut bool) {
    for idx in 0..seq.len() {
        let (left, right) = side_edge_candidates(mesh, &seq.records[idx]);
        let is_end = seq.is_end(idx);
        let prev_co = seq.prev_index(idx).map(|p| seq.records[p].co);
        let next_co = seq.next_index(idx).map(|n| seq.records[n].co);

        for (side, candidate) in [(Side::Left, left), (Side::Right, right)] {
            let Some(edge) = candidate.filter(|e| !seq.edges.contains(e)) else {
                continue;
            };
            let record = &mut seq.records[idx];
            let (v, co, dir) = (record.vert, record.co, record.dir);
            let Some(other) = mesh.edge_other_vert(edge, v) else {
                continue;
            };
            let data = record.side_mut(side);
            data.edge = Some(edge);

            let Some(edge_dir) = normalized(&(mesh.co(other) - co)) else {
                warn!(?v, ?edge, "zero-length side edge, likely a double vertex; ignoring it");
                *weld_suggestion = true;
                continue;
            };
            data.edge_dir = Some(edge_dir);
            data.options |= SweepOptions::EDGE_DIR;
            if should_edge_dir_default(&edge_dir, data, &co, &dir, is_end, prev_co, next_co) {
                data.default = SweepOption::EdgeDir;
            }
        }
    }
}

/// The two non-sequence edges next to a record's corner.
fn side_edge_candidates(mesh: &Mesh, record: &VertexRecord) -> (Option<EdgeId>, Option<EdgeId>) {
    let corner = record.corner;
    let radial = mesh.loop_radial_next(corner);
    if record.corner_from_prev {
        (
            Some(mesh.loop_edge(mesh.loop_next(corner))),
            (radial != corner).then(|| mesh.loop_edge(mesh.loop_prev(radial))),
        )
    } else {
        (
            Some(mesh.loop_edge(mesh.loop_prev(corner))),
            (radial != corner).then(|| mesh.loop_edge(mesh.loop_next(radial))),
        )
    }
}

fn should_edge_dir_default(
    edge_dir: &Vec3,
    data: &SideData,
    co: &Point3,
    dir: &Vec3,
    is_end: bool,
    prev_co: Option<Point3>,
    next_co: Option<Point3>,
) -> bool {
    if is_end && edge_dir.dot(dir).abs() > END_EDGE_PARALLEL {
        return false;
    }
    if !clear_of_neighbours(edge_dir, co, prev_co, next_co) {
        return false;
    }
    edge_dir.dot(&data.face_dir) >= 0.0
}

/// `dir` is not nearly parallel to either neighbouring sequence edge.
pub(crate) fn clear_of_neighbours(dir: &Vec3, co: &Point3, prev_co: Option<Point3>, next_co: Option<Point3>) -> bool {
    [prev_co, next_co].into_iter().flatten().all(|n| {
        normalized(&(n - co)).map_or(true, |to| dir.dot(&to).abs() <= NEIGHBOUR_PARALLEL)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_face_direction_projects_into_plane() {
        let co = Point3::new(0.0, 0.0, 0.0);
        let side = Vec3::new(0.0, 1.0, 1.0).normalize();
        let d = face_direction(&co, &side, &Vec3::z());
        assert_relative_eq!(d, Vec3::y(), epsilon = 1e-12);

        // Degenerate face: keep the side direction.
        assert_relative_eq!(face_direction(&co, &side, &Vec3::zeros()), side);
    }

    #[test]
    fn test_clear_of_neighbours() {
        let co = Point3::origin();
        let next = Some(Point3::new(1.0, 0.0, 0.0));
        assert!(clear_of_neighbours(&Vec3::y(), &co, None, next));
        assert!(!clear_of_neighbours(&Vec3::new(1.0, 0.1, 0.0).normalize(), &co, None, next));
        assert!(!clear_of_neighbours(&-Vec3::x(), &co, None, next));
    }
}
