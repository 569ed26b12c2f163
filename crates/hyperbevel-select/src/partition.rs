//! Sorting an edge set into vertex sequences.

use hyperbevel_mesh::{EdgeId, Mesh, VertId};

/// An ordered walk over connected selected edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertSequence {
    /// Vertices in walk order. A cyclic sequence does not repeat its start.
    pub verts: Vec<VertId>,
    /// The walk returns to its first vertex.
    pub cyclic: bool,
}

impl VertSequence {
    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// No vertices at all.
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }
}

fn degree(mesh: &Mesh, v: VertId, edges: &[EdgeId]) -> usize {
    mesh.vert_edges(v).iter().filter(|e| edges.contains(e)).count()
}

fn start_vert(mesh: &Mesh, edges: &[EdgeId]) -> Option<VertId> {
    let verts: Vec<VertId> = edges.iter().flat_map(|&e| mesh.edge_verts(e)).collect();
    verts
        .iter()
        .copied()
        .find(|&v| degree(mesh, v, edges) == 1)
        .or_else(|| verts.iter().copied().find(|&v| degree(mesh, v, edges) < 3))
        .or_else(|| verts.first().copied())
}

/// Group edges into sequences.
///
/// Open strips start at a vertex of degree one. A closed strip starts at
/// any vertex that is not a T-junction. Branches split into separate
/// sequences. Duplicate edges are ignored.
pub fn partition(mesh: &Mesh, edges: &[EdgeId]) -> Vec<VertSequence> {
    let mut remaining: Vec<EdgeId> = Vec::with_capacity(edges.len());
    for &e in edges {
        if mesh.contains_edge(e) && !remaining.contains(&e) {
            remaining.push(e);
        }
    }

    let mut sequences = Vec::new();
    while let Some(start) = start_vert(mesh, &remaining) {
        let mut seq = vec![start];
        let mut v = start;
        loop {
            let Some(pos) = mesh.vert_edges(v).iter().find_map(|e| remaining.iter().position(|r| r == e)) else {
                break;
            };
            let edge = remaining.remove(pos);
            let Some(next) = mesh.edge_other_vert(edge, v) else {
                break;
            };
            seq.push(next);
            v = next;
            if remaining.is_empty() {
                break;
            }
        }

        let cyclic = seq.len() > 2 && seq.first() == seq.last();
        if cyclic {
            seq.pop();
        }
        sequences.push(VertSequence { verts: seq, cyclic });
    }
    sequences
}
