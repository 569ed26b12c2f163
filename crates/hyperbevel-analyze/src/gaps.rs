//! Steps 4 to 6: gap walks, center-aim and inbetween synthesis, and gap
//! consistency.

use hyperbevel_math::{lerp_vec, midpoint, normalized, Point3, Vec3};
use hyperbevel_mesh::Mesh;
use tracing::trace;

use crate::options::{HostKind, Side, SweepOption, SweepOptions};
use crate::record::{GapInfo, GapNeighbour, Sequence, SideData};
use crate::sides::{clear_of_neighbours, face_direction};

/// Below this, two carrier directions oppose each other and the gap aims at
/// their midpoint instead of blending.
pub const OPPOSING_DOT: f64 = -0.99;

/// Walk outwards from every vertex lacking a side edge and record its
/// nearest carriers. Also records the contiguous gap runs.
pub(crate) fn walk_gaps(seq: &mut Sequence) {
    for side in Side::BOTH {
        let mut runs: Vec<Vec<usize>> = Vec::new();
        let mut in_run = false;

        for idx in 0..seq.len() {
            if seq.records[idx].side(side).edge.is_some() {
                in_run = false;
                continue;
            }
            match runs.last_mut() {
                Some(run) if in_run => run.push(idx),
                _ => runs.push(vec![idx]),
            }
            in_run = true;

            let gap = GapInfo {
                prev: find_carrier(seq, idx, side, Sequence::prev_index),
                next: find_carrier(seq, idx, side, Sequence::next_index),
            };
            seq.records[idx].side_mut(side).gap = Some(gap);
        }

        match side {
            Side::Left => seq.left_gaps = runs,
            Side::Right => seq.right_gaps = runs,
        }
    }
}

fn find_carrier(
    seq: &Sequence,
    start: usize,
    side: Side,
    step: fn(&Sequence, usize) -> Option<usize>,
) -> Option<GapNeighbour> {
    let mut current = start;
    let mut steps = 0;
    let mut distance = 0.0;
    loop {
        let neighbour = step(seq, current)?;
        if neighbour == start {
            return None;
        }
        steps += 1;
        distance += (seq.records[neighbour].co - seq.records[current].co).norm();

        let data = seq.records[neighbour].side(side);
        if data.edge.is_some() {
            return Some(GapNeighbour {
                index: neighbour,
                steps,
                distance,
                edge_dir: data.edge_dir,
                in_use: data.default == SweepOption::EdgeDir,
            });
        }
        current = neighbour;
    }
}

/// Derive center-aim and inbetween directions for every gap vertex.
///
/// Inbetween directions are projected into the plane of the side's own
/// face, the same way face directions are.
pub(crate) fn synthesize(mesh: &Mesh, seq: &mut Sequence, host_kind: HostKind) {
    for idx in 0..seq.len() {
        for side in Side::BOTH {
            let Some(gap) = seq.records[idx].side(side).gap else {
                continue;
            };
            let (Some(prev), Some(next)) = (gap.prev, gap.next) else {
                continue;
            };
            let (Some(prev_dir), Some(next_dir)) = (prev.valid_dir(), next.valid_dir()) else {
                continue;
            };

            let co = seq.records[idx].co;
            let prev_co = seq.prev_index(idx).map(|p| seq.records[p].co);
            let next_co = seq.next_index(idx).map(|n| seq.records[n].co);

            if prev_dir.dot(&next_dir) < OPPOSING_DOT {
                let aim = midpoint(&seq.records[prev.index].co, &seq.records[next.index].co);
                if let Some(dir) = normalized(&(aim - co)) {
                    let data = seq.records[idx].side_mut(side);
                    data.center_aim_dir = Some(dir);
                    data.options |= SweepOptions::CENTER_AIM_DIR;
                }
                continue;
            }

            let factor = lerp_factor(seq, idx, side, &prev, &next);
            let face_normal = mesh.face(seq.records[idx].side(side).face).normal;
            let Some(blended) = normalized(&lerp_vec(&prev_dir, &next_dir, factor)) else {
                continue;
            };
            let dir = face_direction(&co, &blended, &face_normal);
            trace!(idx, ?side, factor, "inbetween direction");

            let data = seq.records[idx].side_mut(side);
            data.inbetween_dir = Some(dir);
            data.options |= SweepOptions::INBETWEEN_DIR;
            if should_inbetween_default(host_kind, &dir, data, &co, prev_co, next_co) {
                data.default = SweepOption::InbetweenDir;
            }
        }
    }
}

/// Position of a gap vertex between its carriers, 0 at the previous
/// carrier and 1 at the next, measured between the run's outer vertices.
fn lerp_factor(seq: &Sequence, idx: usize, side: Side, prev: &GapNeighbour, next: &GapNeighbour) -> f64 {
    match (prev.steps, next.steps) {
        (1, 1) => return 0.5,
        (1, _) => return 0.0,
        (_, 1) => return 1.0,
        _ => {}
    }
    let len = seq.len();
    let first = (idx + len - (prev.steps - 1) % len) % len;
    let last = (idx + (next.steps - 1)) % len;

    let gap_of = |i: usize| seq.records[i].side(side).gap;
    let first_prev = gap_of(first).and_then(|g| g.prev).map_or(0.0, |n| n.distance);
    let last_next = gap_of(last).and_then(|g| g.next).map_or(0.0, |n| n.distance);

    let span = prev.distance + next.distance - first_prev - last_next;
    if span.abs() < 1e-9 {
        return 0.5;
    }
    (prev.distance - first_prev) / span
}

fn should_inbetween_default(
    host_kind: HostKind,
    dir: &Vec3,
    data: &SideData,
    co: &Point3,
    prev_co: Option<Point3>,
    next_co: Option<Point3>,
) -> bool {
    if host_kind == HostKind::Cylinder {
        return false;
    }
    clear_of_neighbours(dir, co, prev_co, next_co) && dir.dot(&data.face_dir) >= 0.0
}

/// Within a gap run, either every vertex defaults to its inbetween
/// direction or none does. Mixed runs fall back to face directions.
pub(crate) fn enforce_gap_consistency(seq: &mut Sequence) {
    for side in Side::BOTH {
        for run in seq.merged_gaps(side) {
            let count = run
                .iter()
                .filter(|&&i| seq.records[i].side(side).default == SweepOption::InbetweenDir)
                .count();
            if count == 0 || count == run.len() {
                continue;
            }
            for &i in &run {
                let data = seq.records[i].side_mut(side);
                if data.default == SweepOption::InbetweenDir {
                    data.default = SweepOption::FaceDir;
                }
            }
        }
    }
}
