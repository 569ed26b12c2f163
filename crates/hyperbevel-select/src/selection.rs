//! The editable edge selection: active edge, its loop and the explicit set.

use hyperbevel_mesh::EdgeId;
use tracing::debug;

use crate::pick::{transfer, EdgeRecord, SelectTarget};
use crate::walk::grow_loop;

/// Whether an update adds to or removes from the explicit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Add the active edge (or its loop).
    Add,
    /// Remove the active edge (or its loop).
    Remove,
}

/// Selection state during the selection phase.
#[derive(Debug, Clone, Default)]
pub struct EdgeSelection {
    /// Edge under the pointer.
    pub active: Option<EdgeRecord>,
    /// Loop grown from the active edge, empty when loop select is off.
    pub loop_edges: Vec<EdgeRecord>,
    /// Explicitly selected edges.
    pub edges: Vec<EdgeRecord>,
    prev_active: Option<EdgeRecord>,
}

impl EdgeSelection {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active edge. Returns whether it changed mesh or edge.
    pub fn set_active(&mut self, active: Option<EdgeRecord>) -> bool {
        self.active = active;
        let changed = match (&self.active, &self.prev_active) {
            (Some(a), Some(b)) => !a.same_edge(b),
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.prev_active = self.active;
        }
        changed
    }

    /// Recompute `loop_edges` from the active edge.
    pub fn refresh_loop(&mut self, target: &SelectTarget<'_>, enabled: bool, min_angle_deg: f64) {
        self.loop_edges.clear();
        if !enabled {
            return;
        }
        if let Some(active) = self.active {
            self.loop_edges = grow_loop(target.mesh, active.edge, min_angle_deg)
                .into_iter()
                .map(|e| EdgeRecord::from_edge(target, e))
                .collect();
        }
    }

    /// Add or remove the active edge, or the whole loop when one is grown.
    pub fn update(&mut self, mode: SelectMode) {
        let Some(active) = self.active else {
            return;
        };
        let sel: Vec<EdgeRecord> = if self.loop_edges.is_empty() {
            vec![active]
        } else {
            self.loop_edges.clone()
        };

        match mode {
            SelectMode::Add => {
                for record in sel {
                    if !self.edges.iter().any(|e| e.edge == record.edge) {
                        self.edges.push(record);
                    }
                }
            }
            SelectMode::Remove => {
                self.edges.retain(|e| !sel.iter().any(|s| s.edge == e.edge));
            }
        }
        debug!(count = self.edges.len(), ?mode, "edge selection updated");
    }

    /// Move the explicit selection and the active edge onto another mesh.
    pub fn transfer(&mut self, target: &SelectTarget<'_>) {
        self.edges = transfer(&self.edges, target);
        if let Some(active) = self.active {
            self.active = crate::pick::transfer_active(&active, target).map(|p| p.record);
            self.prev_active = self.active;
        }
        self.loop_edges.clear();
    }

    /// De-duplicated union of active edge, loop and explicit selection.
    pub fn total_edges(&self) -> Vec<EdgeId> {
        let mut total: Vec<EdgeId> = Vec::new();
        let all = self.active.iter().chain(&self.loop_edges).chain(&self.edges);
        for record in all {
            if !total.contains(&record.edge) {
                total.push(record.edge);
            }
        }
        total
    }

    /// Nothing selected and nothing under the pointer.
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.loop_edges.is_empty() && self.edges.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::EdgeSource;
    use hyperbevel_math::Transform;
    use hyperbevel_mesh::{primitives, RaycastCache};

    #[test]
    fn test_add_remove_loop() {
        let (mesh, ids) = primitives::cylinder(16, 1.0, 1.0).to_mesh().unwrap();
        let cache = RaycastCache::build(&mesh);
        let transform = Transform::identity();
        let target = SelectTarget {
            mesh: &mesh,
            cache: &cache,
            transform: &transform,
            source: EdgeSource::Orig,
        };
        let seed = mesh.edge_between(ids[16], ids[17]).unwrap();

        let mut sel = EdgeSelection::new();
        assert!(sel.set_active(Some(EdgeRecord::from_edge(&target, seed))));
        assert!(!sel.set_active(Some(EdgeRecord::from_edge(&target, seed))));

        sel.refresh_loop(&target, true, 150.0);
        assert_eq!(sel.loop_edges.len(), 16);
        sel.update(SelectMode::Add);
        assert_eq!(sel.edges.len(), 16);
        sel.update(SelectMode::Add);
        assert_eq!(sel.edges.len(), 16);
        assert_eq!(sel.total_edges().len(), 16);

        sel.refresh_loop(&target, false, 150.0);
        sel.update(SelectMode::Remove);
        assert_eq!(sel.edges.len(), 15);
        assert_eq!(sel.total_edges().len(), 16);

        assert!(sel.set_active(None));
        assert_eq!(sel.total_edges().len(), 15);
    }
}
