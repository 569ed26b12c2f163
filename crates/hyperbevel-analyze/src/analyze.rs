//! The analysis pipeline.

use hyperbevel_mesh::Mesh;
use hyperbevel_select::VertSequence;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::gaps::{enforce_gap_consistency, synthesize, walk_gaps};
use crate::options::HostKind;
use crate::record::Analysis;
use crate::scaffold::scaffold;
use crate::sides::{side_directions, side_edges};

/// Knobs for [`analyze`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// What the host object is.
    pub host_kind: HostKind,
}

/// Compute per-vertex sweep directions and options for each sequence.
///
/// Sequences must come from [`hyperbevel_select::partition`] or follow the
/// same conventions: consecutive vertices share an edge, and a cyclic
/// sequence does not repeat its first vertex.
pub fn analyze(mesh: &Mesh, sequences: &[VertSequence], options: &AnalyzeOptions) -> Result<Analysis> {
    let mut analysis = Analysis::default();

    for input in sequences {
        let mut seq = scaffold(mesh, input, &mut analysis.weld_suggestion)?;
        side_directions(mesh, &mut seq);
        side_edges(mesh, &mut seq, &mut analysis.weld_suggestion);
        walk_gaps(&mut seq);
        synthesize(mesh, &mut seq, options.host_kind);
        enforce_gap_consistency(&mut seq);
        analysis.sequences.push(seq);
    }
    analysis.refresh_flags();

    debug!(
        sequences = analysis.sequences.len(),
        weld_suggestion = analysis.weld_suggestion,
        inbetween = analysis.use_inbetween_align,
        center_aim = analysis.has_center_aim,
        "analyzed edge sequences"
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzeError;
    use crate::options::{Side, SweepOption};
    use approx::assert_relative_eq;
    use hyperbevel_math::Vec3;
    use hyperbevel_mesh::{primitives, VertId};

    fn run(mesh: &Mesh, verts: Vec<VertId>, cyclic: bool) -> Analysis {
        analyze(mesh, &[VertSequence { verts, cyclic }], &AnalyzeOptions::default()).unwrap()
    }

    fn assert_well_formed(analysis: &Analysis) {
        for seq in &analysis.sequences {
            for record in &seq.records {
                assert_relative_eq!(record.dir.norm(), 1.0, epsilon = 1e-9);
                assert!(record.shell_factor >= 1.0 - 1e-9);
                for side in Side::BOTH {
                    let data = record.side(side);
                    assert!(data.options.has(data.default));
                    for option in data.options.options() {
                        let dir = data.direction(option).unwrap();
                        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_cube_single_edge() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let analysis = run(&mesh, vec![ids[4], ids[5]], false);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert!(seq.convex);
        assert!(!seq.cyclic);
        assert_eq!(seq.len(), 2);
        assert!(seq.records[1].corner_from_prev);

        for record in &seq.records {
            assert_relative_eq!(record.dir, Vec3::x(), epsilon = 1e-9);
            assert_relative_eq!(record.shell_factor, 1.0);
            assert_relative_eq!(record.left.face_dir, Vec3::y(), epsilon = 1e-9);
            assert_relative_eq!(record.right.face_dir, -Vec3::z(), epsilon = 1e-9);
            // The side edges run along the faces, so either option sweeps the same way.
            let left = record.left.sweep_dir(record.left.default);
            let right = record.right.sweep_dir(record.right.default);
            assert_relative_eq!(left, Vec3::y(), epsilon = 1e-9);
            assert_relative_eq!(right, -Vec3::z(), epsilon = 1e-9);
        }
        assert!(seq.left_gaps.is_empty());
        assert!(seq.right_gaps.is_empty());
        assert!(!analysis.weld_suggestion);
    }

    #[test]
    fn test_cube_top_ring() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let analysis = run(&mesh, vec![ids[4], ids[5], ids[6], ids[7]], true);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert!(seq.cyclic);
        assert_eq!(seq.left_gaps, vec![vec![0, 1, 2, 3]]);
        assert!(seq.right_gaps.is_empty());

        let first = &seq.records[0];
        assert_relative_eq!(first.shell_factor, 2f64.sqrt(), epsilon = 1e-9);
        let inward = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_relative_eq!(first.left.face_dir, inward, epsilon = 1e-9);
        assert_eq!(first.left.default, SweepOption::FaceDir);
        assert_eq!(first.left.gap.unwrap().prev, None);
        assert_eq!(first.right.default, SweepOption::EdgeDir);
        assert_relative_eq!(first.right.edge_dir.unwrap(), -Vec3::z(), epsilon = 1e-9);
    }

    #[test]
    fn test_l_prism_concave_edge() {
        let (mesh, ids) = primitives::l_prism().to_mesh().unwrap();
        let analysis = run(&mesh, vec![ids[3], ids[9]], false);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert!(!seq.convex);
        let record = &seq.records[0];
        let dirs = [record.left.face_dir, record.right.face_dir];
        for expected in [Vec3::x(), Vec3::z()] {
            assert!(dirs.iter().any(|d| (d - expected).norm() < 1e-9));
        }
        assert_eq!(record.left.default, SweepOption::EdgeDir);
        assert_eq!(record.right.default, SweepOption::EdgeDir);
    }

    #[test]
    fn test_gap_strip_inbetween() {
        let (mesh, ids) = primitives::gap_strip().to_mesh().unwrap();
        let analysis = run(&mesh, ids[0..5].to_vec(), false);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert_eq!(seq.left_gaps, vec![vec![1, 2, 3]]);
        assert_eq!(seq.records[0].left.default, SweepOption::EdgeDir);
        assert_eq!(seq.records[4].left.default, SweepOption::EdgeDir);

        let expected = [
            Vec3::new(-0.5, 1.0, 0.0).normalize(),
            Vec3::y(),
            Vec3::new(0.5, 1.0, 0.0).normalize(),
        ];
        for (idx, want) in (1..4).zip(expected) {
            let left = &seq.records[idx].left;
            assert_eq!(left.default, SweepOption::InbetweenDir);
            assert_relative_eq!(left.inbetween_dir.unwrap(), want, epsilon = 1e-9);
            assert_relative_eq!(seq.records[idx].shell_factor, 1.0, epsilon = 1e-9);
            assert_eq!(seq.records[idx].right.default, SweepOption::EdgeDir);
        }

        let gap = seq.records[2].left.gap.unwrap();
        assert_eq!(gap.prev.unwrap().index, 0);
        assert_eq!(gap.next.unwrap().index, 4);
        assert_eq!(gap.prev.unwrap().steps, 2);
        assert_relative_eq!(gap.next.unwrap().distance, 2.0);

        assert!(analysis.has_inbetween_align);
        assert!(analysis.use_inbetween_align);
        assert!(!analysis.has_center_aim);
    }

    #[test]
    fn test_inbetween_stays_in_side_face() {
        let (mesh, ids) = primitives::split_box_edge().to_mesh().unwrap();
        let analysis = run(&mesh, ids[0..5].to_vec(), false);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert!(seq.convex);
        assert_eq!(seq.right_gaps, vec![vec![1, 2, 3]]);
        assert!(seq.left_gaps.is_empty());

        let front = mesh.face(seq.records[2].right.face).normal;
        assert_relative_eq!(front, -Vec3::y(), epsilon = 1e-12);
        for record in &seq.records[1..4] {
            // The edge-averaged normal leans halfway between top and front.
            assert!(record.normal.y.abs() > 0.5);
            let right = &record.right;
            let inbetween = right.inbetween_dir.unwrap();
            assert_relative_eq!(inbetween, -Vec3::z(), epsilon = 1e-9);
            assert_relative_eq!(inbetween.dot(&front), 0.0, epsilon = 1e-12);
            assert_eq!(right.default, SweepOption::InbetweenDir);
        }
        assert!(analysis.use_inbetween_align);
    }

    #[test]
    fn test_cyclic_gap_joins_across_start() {
        let (mesh, ids) = primitives::notched_ring().to_mesh().unwrap();
        let ring = [18, 17, 16, 11, 6, 7, 8, 13];
        let analysis = run(&mesh, ring.iter().map(|&i| ids[i]).collect(), true);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert!(seq.cyclic);
        assert_eq!(seq.left_gaps, vec![vec![0, 1, 2], vec![4], vec![6, 7]]);
        assert_eq!(seq.merged_gaps(Side::Left), vec![vec![6, 7, 0, 1, 2], vec![4]]);

        let gap = seq.records[0].left.gap.unwrap();
        assert_eq!(gap.prev.unwrap().index, 5);
        assert_eq!(gap.next.unwrap().index, 3);
        assert_relative_eq!(gap.prev.unwrap().distance, 3.0);
        assert_relative_eq!(gap.next.unwrap().distance, 3.0);

        // Walk-order distances carry across index 0, so the blend from +y
        // to +x advances evenly through the joined run.
        let expected = [
            (6, Vec3::y()),
            (7, Vec3::new(1.0, 3.0, 0.0).normalize()),
            (0, Vec3::new(1.0, 1.0, 0.0).normalize()),
            (1, Vec3::new(3.0, 1.0, 0.0).normalize()),
            (2, Vec3::x()),
        ];
        for (idx, want) in expected {
            let left = &seq.records[idx].left;
            assert_relative_eq!(left.inbetween_dir.unwrap(), want, epsilon = 1e-9);
            assert_eq!(left.default, SweepOption::FaceDir);
        }

        let corner = &seq.records[4].left;
        assert_relative_eq!(
            corner.inbetween_dir.unwrap(),
            Vec3::new(1.0, 1.0, 0.0).normalize(),
            epsilon = 1e-9
        );
        assert_eq!(corner.default, SweepOption::InbetweenDir);
    }

    #[test]
    fn test_double_vertex_recovers() {
        let (mesh, ids) = primitives::double_vertex_strip().to_mesh().unwrap();
        let analysis = run(&mesh, ids[0..4].to_vec(), false);
        assert_well_formed(&analysis);
        assert!(analysis.weld_suggestion);

        let seq = &analysis.sequences[0];
        for record in &seq.records {
            assert_relative_eq!(record.dir, Vec3::x(), epsilon = 1e-9);
            assert_relative_eq!(record.normal, Vec3::z(), epsilon = 1e-9);
            assert_relative_eq!(record.shell_factor, 1.0);
            for side in Side::BOTH {
                let data = record.side(side);
                assert_relative_eq!(mesh.face(data.face).normal.norm(), 1.0, epsilon = 1e-12);
                assert_eq!(data.default, SweepOption::EdgeDir);
            }
            assert_relative_eq!(record.left.sweep_dir(record.left.default), Vec3::y(), epsilon = 1e-9);
            assert_relative_eq!(record.right.sweep_dir(record.right.default), -Vec3::y(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_gap_strip_on_cylinder_host() {
        let (mesh, ids) = primitives::gap_strip().to_mesh().unwrap();
        let options = AnalyzeOptions {
            host_kind: HostKind::Cylinder,
        };
        let seqs = [VertSequence {
            verts: ids[0..5].to_vec(),
            cyclic: false,
        }];
        let analysis = analyze(&mesh, &seqs, &options).unwrap();
        let left = &analysis.sequences[0].records[2].left;
        assert!(left.options.has(SweepOption::InbetweenDir));
        assert_eq!(left.default, SweepOption::FaceDir);
        assert!(analysis.has_inbetween_align);
        assert!(!analysis.use_inbetween_align);
    }

    #[test]
    fn test_global_inbetween_toggle() {
        let (mesh, ids) = primitives::gap_strip().to_mesh().unwrap();
        let mut analysis = run(&mesh, ids[0..5].to_vec(), false);

        analysis.set_global_inbetween_align(false);
        assert!(!analysis.use_inbetween_align);
        assert!(analysis.has_inbetween_align);
        let seq = &analysis.sequences[0];
        assert!((1..4).all(|i| seq.records[i].left.default == SweepOption::FaceDir));

        analysis.set_global_inbetween_align(true);
        assert!(analysis.use_inbetween_align);
    }

    #[test]
    fn test_mixed_gap_reverts_to_face_dir() {
        let (mesh, ids) = primitives::gap_strip().to_mesh().unwrap();
        let mut analysis = run(&mesh, ids[0..5].to_vec(), false);
        let seq = &mut analysis.sequences[0];
        seq.records[2].left.default = SweepOption::FaceDir;

        crate::gaps::enforce_gap_consistency(seq);
        assert!(seq.records[1..4]
            .iter()
            .all(|r| r.left.default == SweepOption::FaceDir));
    }

    #[test]
    fn test_caret_center_aim() {
        let (mesh, ids) = primitives::caret_strip().to_mesh().unwrap();
        let mut analysis = run(&mesh, ids[0..3].to_vec(), false);
        assert_well_formed(&analysis);

        let seq = &analysis.sequences[0];
        assert_eq!(seq.records[0].left.default, SweepOption::EdgeDir);
        assert_eq!(seq.records[2].left.default, SweepOption::EdgeDir);

        let left = &seq.records[1].left;
        assert_relative_eq!(left.center_aim_dir.unwrap(), -Vec3::y(), epsilon = 1e-9);
        assert_eq!(left.default, SweepOption::FaceDir);
        assert!(left.inbetween_dir.is_none());
        assert!(analysis.has_center_aim);
        assert!(!analysis.use_center_aim);

        analysis.set_global_center_aim(true);
        assert!(analysis.use_center_aim);
        assert_eq!(
            analysis.record(0, 1).unwrap().left.default,
            SweepOption::CenterAimDir
        );
    }

    #[test]
    fn test_rejects_bad_sequences() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let seqs = [VertSequence {
            verts: vec![ids[0], ids[6]],
            cyclic: false,
        }];
        let err = analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingEdge(..)));

        let seqs = [VertSequence {
            verts: vec![ids[0]],
            cyclic: false,
        }];
        let err = analyze(&mesh, &seqs, &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::EmptySequence(1)));
    }

    #[test]
    fn test_analysis_serializes() {
        let (mesh, ids) = primitives::caret_strip().to_mesh().unwrap();
        let analysis = run(&mesh, ids[0..3].to_vec(), false);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["sequences"][0]["records"][1]["left"]["default"], "FACE_DIR");
        assert_eq!(json["has_center_aim"], true);
    }
}
