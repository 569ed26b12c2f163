//! World-space coordinate streams for an external renderer.

use hyperbevel_analyze::Analysis;
use hyperbevel_cutter::BaseCutter;
use hyperbevel_math::{Point3, Transform};
use hyperbevel_mesh::Mesh;
use hyperbevel_select::EdgeSelection;
use serde::{Deserialize, Serialize};

/// What a batch of line segments shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineLayer {
    /// Host wireframe.
    Wireframe,
    /// Wireframe of the welded host copy.
    WeldWireframe,
    /// The picked edge.
    Active,
    /// Edges grown from the picked edge.
    Loop,
    /// Explicitly selected edges.
    Selection,
    /// Sweep direction lines.
    Sweeps,
}

/// Segments sharing one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBatch {
    /// Layer the segments belong to.
    pub layer: LineLayer,
    /// World-space segments.
    pub segments: Vec<[Point3; 2]>,
}

/// One frame of preview geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Line batches, one per layer.
    pub lines: Vec<LineBatch>,
    /// Spine vertices.
    pub points: Vec<Point3>,
    /// Cutter surface.
    pub triangles: Vec<[Point3; 3]>,
}

/// Every edge of `mesh` as a world-space segment.
pub fn wireframe(mesh: &Mesh, transform: &Transform) -> Vec<[Point3; 2]> {
    mesh.edges()
        .map(|e| {
            let [a, b] = mesh.edge_verts(e);
            [transform.apply_point(&mesh.co(a)), transform.apply_point(&mesh.co(b))]
        })
        .collect()
}

/// Fan triangulation of every face of `mesh`, in world space.
pub fn triangles(mesh: &Mesh, transform: &Transform) -> Vec<[Point3; 3]> {
    let mut tris = Vec::new();
    for f in mesh.faces() {
        let co: Vec<Point3> = mesh
            .face_verts(f)
            .into_iter()
            .map(|v| transform.apply_point(&mesh.co(v)))
            .collect();
        for i in 1..co.len().saturating_sub(1) {
            tris.push([co[0], co[i], co[i + 1]]);
        }
    }
    tris
}

impl Preview {
    /// Empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty() && self.triangles.is_empty()
    }

    /// Append segments to `layer`. Empty input adds nothing.
    pub fn push_lines(&mut self, layer: LineLayer, segments: Vec<[Point3; 2]>) {
        if segments.is_empty() {
            return;
        }
        match self.lines.iter_mut().find(|b| b.layer == layer) {
            Some(batch) => batch.segments.extend(segments),
            None => self.lines.push(LineBatch { layer, segments }),
        }
    }

    /// Segments of one layer.
    pub fn layer(&self, layer: LineLayer) -> &[[Point3; 2]] {
        self.lines
            .iter()
            .find(|b| b.layer == layer)
            .map(|b| b.segments.as_slice())
            .unwrap_or(&[])
    }

    /// Active edge, grown loop and explicit selection.
    pub fn add_selection(&mut self, selection: &EdgeSelection) {
        self.push_lines(LineLayer::Active, selection.active.iter().map(|r| r.coords).collect());
        self.push_lines(LineLayer::Loop, selection.loop_edges.iter().map(|r| r.coords).collect());
        self.push_lines(LineLayer::Selection, selection.edges.iter().map(|r| r.coords).collect());
    }

    /// Sweep lines of the base cutter.
    pub fn add_sweeps(&mut self, base: &BaseCutter, transform: &Transform) {
        self.push_lines(LineLayer::Sweeps, base.sweep_lines(transform));
    }

    /// Every spine vertex as a point.
    pub fn add_spine(&mut self, analysis: &Analysis, transform: &Transform) {
        let spine = analysis.sequences.iter().flat_map(|s| &s.records);
        self.points.extend(spine.map(|r| transform.apply_point(&r.co)));
    }

    /// Cutter surface triangles.
    pub fn add_cutter(&mut self, mesh: &Mesh, transform: &Transform) {
        self.triangles.extend(triangles(mesh, transform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperbevel_mesh::primitives;

    #[test]
    fn test_cube_streams() {
        let (mesh, _) = primitives::cube(1.0).to_mesh().unwrap();
        let transform = Transform::translation(0.0, 0.0, 2.0);

        let mut preview = Preview::new();
        assert!(preview.is_empty());
        preview.push_lines(LineLayer::Wireframe, wireframe(&mesh, &transform));
        preview.push_lines(LineLayer::Sweeps, Vec::new());
        preview.add_cutter(&mesh, &transform);

        assert_eq!(preview.layer(LineLayer::Wireframe).len(), 12);
        assert!(preview.layer(LineLayer::Sweeps).is_empty());
        assert_eq!(preview.lines.len(), 1);
        assert_eq!(preview.triangles.len(), 12);
        assert!(preview
            .triangles
            .iter()
            .flatten()
            .all(|p| (p.z - 1.0).abs() < 1e-12 || (p.z - 3.0).abs() < 1e-12));
    }
}
