//! Small reference meshes: boxes, prisms and strips with known topology.
//!
//! All primitives are outward-wound and returned as [`PolygonMesh`] so the
//! caller gets stable vertex indices back from [`PolygonMesh::to_mesh`].

use std::f64::consts::TAU;

use crate::polygon::PolygonMesh;

/// Axis-aligned cube centered at the origin with half-extent `half`.
///
/// Indices 0-3 are the bottom ring and 4-7 the top ring, both counter-clockwise
/// from `(-h, -h)`. The edge 4-5 is the front top edge.
pub fn cube(half: f64) -> PolygonMesh {
    let h = half;
    let positions = vec![
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let faces = vec![
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![1, 2, 6, 5],
        vec![2, 3, 7, 6],
        vec![3, 0, 4, 7],
    ];
    PolygonMesh::new(positions, faces)
}

/// L-shaped prism extruded along +y from 0 to 1.
///
/// The profile in the xz-plane is `(-1,-1) (1,-1) (1,0) (0,0) (0,1) (-1,1)`.
/// Indices 0-5 sit at `y = 0`, 6-11 at `y = 1`. The concave edge is 3-9,
/// from `(0,0,0)` to `(0,1,0)`.
pub fn l_prism() -> PolygonMesh {
    let profile = [
        (-1.0, -1.0),
        (1.0, -1.0),
        (1.0, 0.0),
        (0.0, 0.0),
        (0.0, 1.0),
        (-1.0, 1.0),
    ];
    let mut positions = Vec::with_capacity(12);
    for y in [0.0, 1.0] {
        for &(x, z) in &profile {
            positions.push([x, y, z]);
        }
    }

    let n = profile.len();
    let mut faces = vec![(0..n).collect::<Vec<_>>(), (n..2 * n).rev().collect()];
    for k in 0..n {
        let next = (k + 1) % n;
        faces.push(vec![k, k + n, next + n, next]);
    }
    PolygonMesh::new(positions, faces)
}

/// Closed cylinder around +z with `segments` sides.
///
/// Indices `0..segments` form the bottom ring, `segments..2*segments` the
/// top ring. Both caps are single n-gons.
pub fn cylinder(segments: usize, radius: f64, height: f64) -> PolygonMesh {
    let n = segments.max(3);
    let mut positions = Vec::with_capacity(2 * n);
    for z in [0.0, height] {
        for i in 0..n {
            let a = TAU * i as f64 / n as f64;
            positions.push([radius * a.cos(), radius * a.sin(), z]);
        }
    }

    let mut faces = vec![(0..n).rev().collect::<Vec<_>>(), (n..2 * n).collect()];
    for i in 0..n {
        let next = (i + 1) % n;
        faces.push(vec![i, next, n + next, n + i]);
    }
    PolygonMesh::new(positions, faces)
}

/// Flat `nx` by `ny` grid of unit quads in the xy-plane, facing +z.
///
/// Vertex `(i, j)` has index `j * (nx + 1) + i`.
pub fn grid(nx: usize, ny: usize) -> PolygonMesh {
    let mut positions = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            positions.push([i as f64, j as f64, 0.0]);
        }
    }
    let idx = |i: usize, j: usize| j * (nx + 1) + i;
    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            faces.push(vec![idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    PolygonMesh::new(positions, faces)
}

/// Five-vertex spine along +x whose left side is one n-gon.
///
/// Spine indices 0-4 run from `(0,0,0)` to `(4,0,0)`. Only the end vertices
/// have a side edge on the left (to 5 and 6, splayed outwards). The right
/// side is a row of quads, so every spine vertex has a right side edge.
pub fn gap_strip() -> PolygonMesh {
    let mut positions: Vec<[f64; 3]> = (0..5).map(|i| [i as f64, 0.0, 0.0]).collect();
    positions.push([-0.5, 1.0, 0.0]);
    positions.push([4.5, 1.0, 0.0]);
    positions.extend((0..5).map(|i| [i as f64, -1.0, 0.0]));

    let mut faces = vec![vec![0, 1, 2, 3, 4, 6, 5]];
    for i in 0..4 {
        faces.push(vec![7 + i, 8 + i, i + 1, i]);
    }
    PolygonMesh::new(positions, faces)
}

/// Three-vertex caret `(1,0,0) (0,1,0) (-1,0,0)` over a flat base.
///
/// The left face is the quad 0-1-2-3 with 3 at the origin, so the end
/// vertices' left side edges point at each other and the middle vertex has
/// none. The right side is two triangles.
pub fn caret_strip() -> PolygonMesh {
    let positions = vec![
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0],
    ];
    let faces = vec![vec![0, 1, 2, 3], vec![1, 0, 4], vec![2, 1, 5]];
    PolygonMesh::new(positions, faces)
}

/// Top front edge of a box, split into four segments.
///
/// Spine indices 0-4 run from `(0,0,1)` to `(4,0,1)`. The top is a row of
/// quads back to 5-9 at `y = 1`. The front is one n-gon in the `y = 0`
/// plane whose only vertical edges are 0-10 and 4-11, so the middle spine
/// vertices have no side edge on the front.
pub fn split_box_edge() -> PolygonMesh {
    let mut positions: Vec<[f64; 3]> = (0..5).map(|i| [i as f64, 0.0, 1.0]).collect();
    positions.extend((0..5).map(|i| [i as f64, 1.0, 1.0]));
    positions.push([0.0, 0.0, 0.0]);
    positions.push([4.0, 0.0, 0.0]);

    let mut faces: Vec<Vec<usize>> = (0..4).map(|i| vec![i, i + 1, 6 + i, 5 + i]).collect();
    faces.push(vec![4, 3, 2, 1, 0, 10, 11]);
    PolygonMesh::new(positions, faces)
}

/// A 4x4 grid whose inner 2x2 block is one quad and one L-shaped n-gon.
///
/// The eight-vertex ring around the block is, counter-clockwise from
/// `(1,1)`: 6, 7, 8, 13, 18, 17, 16, 11. Only 7 and 11 have an inner side
/// edge, both to the block center 12.
pub fn notched_ring() -> PolygonMesh {
    let mut grid = grid(4, 4);
    let inner = [6, 7, 11, 12];
    grid.faces.retain(|f| !inner.contains(&f[0]));
    grid.faces.push(vec![6, 7, 12, 11]);
    grid.faces.push(vec![7, 8, 13, 18, 17, 16, 11, 12]);
    grid
}

/// Four-vertex spine along +x whose middle two vertices coincide at
/// `(1,0,0)`.
///
/// The quads on either side of the zero-length spine edge 1-2 have no
/// area. Rows 4-7 at `y = 1` and 8-11 at `y = -1` repeat the spine's x.
pub fn double_vertex_strip() -> PolygonMesh {
    let xs = [0.0, 1.0, 1.0, 2.0];
    let mut positions = Vec::with_capacity(12);
    for y in [0.0, 1.0, -1.0] {
        positions.extend(xs.iter().map(|&x| [x, y, 0.0]));
    }

    let mut faces = Vec::with_capacity(6);
    for i in 0..3 {
        faces.push(vec![i, i + 1, 5 + i, 4 + i]);
        faces.push(vec![8 + i, 9 + i, i + 1, i]);
    }
    PolygonMesh::new(positions, faces)
}
