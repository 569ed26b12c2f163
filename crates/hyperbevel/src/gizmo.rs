//! Per-session gizmo state: sweep buttons, end extends and the width handle.
//!
//! A UI backend reads the state by reference and subscribes to changes with
//! [`GizmoState::subscribe`]. Edits coming from the backend go through the
//! [`GizmoState::push`] mailbox and are applied by the session on its next
//! tick.

use std::fmt;

use hyperbevel_analyze::{Analysis, Side, SweepOption, SweepOptions};
use hyperbevel_cutter::{Adjustments, SequenceEnd, SweepKey};
use hyperbevel_math::{midpoint, Point3, Transform, Vec3};
use hyperbevel_mesh::EdgeId;
use serde::{Deserialize, Serialize};

/// One sweep button.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGizmo {
    /// Spine vertex, local.
    pub co: Point3,
    /// Direction of the current default, local.
    pub sweep_dir: Vec3,
    /// Button location, world.
    pub sweep_co: Point3,
    /// Options the button cycles through.
    pub options: SweepOptions,
    /// Current default.
    pub default: SweepOption,
}

/// Extend handle at an open end.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendGizmo {
    /// Spine vertex, local.
    pub co: Point3,
    /// Outward spine direction, local.
    pub extend_dir: Vec3,
    /// Current extend distance.
    pub extend: f64,
    /// Handle location, world.
    pub loc: Point3,
}

/// Gizmos of one spine vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGizmos {
    /// Left sweep button.
    pub left: SweepGizmo,
    /// Right sweep button.
    pub right: SweepGizmo,
    /// Only at the ends of open sequences.
    pub extend: Option<ExtendGizmo>,
}

impl VertexGizmos {
    /// Sweep button on `side`.
    pub fn side(&self, side: Side) -> &SweepGizmo {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable sweep button on `side`.
    pub fn side_mut(&mut self, side: Side) -> &mut SweepGizmo {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Gizmos of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceGizmos {
    /// The sequence closes.
    pub cyclic: bool,
    /// The sequence runs along convex edges.
    pub convex: bool,
    /// One entry per spine vertex.
    pub verts: Vec<VertexGizmos>,
}

/// The width handle, placed beside the active edge.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthGizmo {
    /// Width the handle shows.
    pub width: f64,
    /// Active edge midpoint, local.
    pub center: Point3,
    /// Active edge midpoint, world.
    pub edge_center: Point3,
    /// Side the handle sits on, local.
    pub width_dir: Vec3,
    /// Handle location, world.
    pub loc: Point3,
}

/// The gizmo under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Highlight {
    /// A sweep button.
    Sweeps(SweepKey),
    /// An extend handle.
    Extend {
        /// Sequence index.
        sequence: usize,
        /// End vertex index within the sequence.
        index: usize,
    },
    /// The width handle.
    Width,
}

/// A deferred edit from the UI backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushUpdate {
    /// A sweep button changed its default. Carries the new default.
    Sweeps(SweepOption),
    /// An extend handle moved.
    Extend,
    /// The width handle moved. Carries the new width.
    Width(f64),
}

/// What observers are told about.
#[derive(Debug, Clone, PartialEq)]
pub enum GizmoEvent {
    /// Gizmos were (re)built from an analysis.
    Initialized,
    /// A deferred update was posted.
    Pushed(PushUpdate),
    /// Gizmo locations moved.
    Moved,
    /// The session finished and the gizmos are gone.
    Cleared,
}

type Observer = Box<dyn FnMut(&GizmoEvent)>;

/// Owned gizmo state of one session.
pub struct GizmoState {
    /// Gizmos are drawn at all.
    pub show: bool,
    /// Sweep buttons are drawn.
    pub show_sweeps: bool,
    /// Sweep button distance from the spine, as a fraction of the width.
    pub sweep_distance: f64,
    /// Per-sequence gizmos.
    pub sequences: Vec<SequenceGizmos>,
    /// The width handle, once there is an active edge.
    pub width: Option<WidthGizmo>,
    current_width: f64,
    transform: Transform,
    highlighted: Option<Highlight>,
    push_update: Option<PushUpdate>,
    observers: Vec<Observer>,
}

impl fmt::Debug for GizmoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GizmoState")
            .field("show", &self.show)
            .field("show_sweeps", &self.show_sweeps)
            .field("sequences", &self.sequences.len())
            .field("width", &self.width)
            .field("highlighted", &self.highlighted)
            .field("push_update", &self.push_update)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl GizmoState {
    /// Hidden, empty state.
    pub fn new(sweep_distance: f64) -> Self {
        Self {
            show: false,
            show_sweeps: true,
            sweep_distance,
            sequences: Vec::new(),
            width: None,
            current_width: 0.0,
            transform: Transform::identity(),
            highlighted: None,
            push_update: None,
            observers: Vec::new(),
        }
    }

    /// Register a callback for every [`GizmoEvent`].
    pub fn subscribe(&mut self, observer: impl FnMut(&GizmoEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: GizmoEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    /// Build every gizmo from an analysis.
    ///
    /// Open ends start with an extend of `extend_factor * width` when the
    /// sequence is convex. The width handle sits beside `active` on the side
    /// closer to `drag_origin`; without an active edge it goes to the first
    /// spine edge.
    pub fn init(
        &mut self,
        analysis: &Analysis,
        width: f64,
        extend_factor: f64,
        transform: &Transform,
        active: Option<(EdgeId, Point3)>,
    ) {
        self.transform = transform.clone();
        self.current_width = width;
        self.highlighted = None;
        self.push_update = None;

        self.sequences = analysis
            .sequences
            .iter()
            .map(|seq| {
                let n = seq.records.len();
                let verts = seq
                    .records
                    .iter()
                    .enumerate()
                    .map(|(idx, record)| {
                        let sweep = |side: Side| {
                            let data = record.side(side);
                            SweepGizmo {
                                co: record.co,
                                sweep_dir: data.sweep_dir(data.default),
                                sweep_co: record.co,
                                options: data.options,
                                default: data.default,
                            }
                        };
                        let extend = (!seq.cyclic && (idx == 0 || idx + 1 == n)).then(|| {
                            let extend_dir = if idx == 0 { -record.dir } else { record.dir };
                            ExtendGizmo {
                                co: record.co,
                                extend_dir,
                                extend: if seq.convex { extend_factor * width } else { 0.0 },
                                loc: record.co,
                            }
                        });
                        VertexGizmos {
                            left: sweep(Side::Left),
                            right: sweep(Side::Right),
                            extend,
                        }
                    })
                    .collect();
                SequenceGizmos {
                    cyclic: seq.cyclic,
                    convex: seq.convex,
                    verts,
                }
            })
            .collect();

        self.width = width_anchor(analysis, active.map(|(e, _)| e)).map(|(center, left, right)| {
            let drag_origin = active.map(|(_, o)| o);
            let world = |dir: &Vec3| self.transform.apply_point(&(center + dir * width));
            let width_dir = match drag_origin {
                Some(o) if (world(&right) - o).norm() < (world(&left) - o).norm() => right,
                _ => left,
            };
            WidthGizmo {
                width,
                center,
                edge_center: self.transform.apply_point(&center),
                width_dir,
                loc: world(&width_dir),
            }
        });

        self.show = true;
        self.relocate();
        self.notify(GizmoEvent::Initialized);
    }

    /// Drop every gizmo.
    pub fn clear(&mut self) {
        self.show = false;
        self.sequences.clear();
        self.width = None;
        self.highlighted = None;
        self.push_update = None;
        self.notify(GizmoEvent::Cleared);
    }

    /// The gizmo under the pointer.
    pub fn highlighted(&self) -> Option<Highlight> {
        self.highlighted
    }

    /// Set by the UI backend on hover.
    pub fn set_highlighted(&mut self, highlight: Option<Highlight>) {
        self.highlighted = highlight;
    }

    /// Post a deferred update for the session's next tick.
    pub fn push(&mut self, update: PushUpdate) {
        self.push_update = Some(update);
        self.notify(GizmoEvent::Pushed(update));
    }

    /// Take the pending update, if any.
    pub fn take_update(&mut self) -> Option<PushUpdate> {
        self.push_update.take()
    }

    /// Sweep button at `key`.
    pub fn sweep(&self, key: SweepKey) -> Option<&SweepGizmo> {
        Some(self.sequences.get(key.sequence)?.verts.get(key.index)?.side(key.side))
    }

    /// Extend handle at an open end.
    pub fn extend(&self, sequence: usize, index: usize) -> Option<&ExtendGizmo> {
        self.sequences.get(sequence)?.verts.get(index)?.extend.as_ref()
    }

    /// Width the gizmos are laid out for.
    pub fn current_width(&self) -> f64 {
        self.current_width
    }

    /// Indices a shift-toggle at `key` would change, sorted.
    ///
    /// Walks both ways from `key.index` while the neighbour's default on the
    /// same side matches and its options include the next option. Cyclic
    /// sequences wrap.
    pub fn neighbours(&self, key: SweepKey) -> Vec<usize> {
        let Some(seq) = self.sequences.get(key.sequence) else {
            return Vec::new();
        };
        let Some(start) = seq.verts.get(key.index).map(|v| v.side(key.side)) else {
            return Vec::new();
        };
        let default = start.default;
        let new_default = start.options.step(default);
        let n = seq.verts.len();

        let matches = |idx: usize| {
            let g = seq.verts[idx].side(key.side);
            g.default == default && g.options.has(new_default)
        };
        let step = |idx: usize, forward: bool| -> Option<usize> {
            match (forward, seq.cyclic) {
                (true, true) => Some((idx + 1) % n),
                (false, true) => Some((idx + n - 1) % n),
                (true, false) => (idx + 1 < n).then_some(idx + 1),
                (false, false) => idx.checked_sub(1),
            }
        };

        let mut found = vec![key.index];
        for forward in [false, true] {
            let mut idx = key.index;
            while let Some(next) = step(idx, forward) {
                if found.contains(&next) || !matches(next) {
                    break;
                }
                found.push(next);
                idx = next;
            }
        }
        found.sort_unstable();
        found
    }

    /// Cycle the default at `key`, and with `shift` along its neighbours.
    /// Returns the new default, or `None` for an unknown key.
    pub fn toggle_sweep(&mut self, key: SweepKey, shift: bool, analysis: &Analysis) -> Option<SweepOption> {
        let current = self.sweep(key)?;
        let new_default = current.options.step(current.default);
        let indices = if shift { self.neighbours(key) } else { vec![key.index] };

        let seq = analysis.sequences.get(key.sequence)?;
        let gizmos = self.sequences.get_mut(key.sequence)?;
        for idx in indices {
            let (Some(record), Some(vert)) = (seq.records.get(idx), gizmos.verts.get_mut(idx)) else {
                continue;
            };
            let g = vert.side_mut(key.side);
            g.default = new_default;
            g.sweep_dir = record.side(key.side).sweep_dir(new_default);
        }
        self.relocate();
        Some(new_default)
    }

    /// Set an end's extend. With `mirror` the opposite end follows.
    pub fn set_extend(&mut self, sequence: usize, index: usize, amount: f64, mirror: bool) -> bool {
        let Some(seq) = self.sequences.get_mut(sequence) else {
            return false;
        };
        let n = seq.verts.len();
        let end = SequenceEnd::from_index(index);
        let mut ends = vec![end.index(n)];
        if mirror {
            ends.push(end.opposite().index(n));
        }

        let mut changed = false;
        for idx in ends {
            if let Some(extend) = seq.verts.get_mut(idx).and_then(|v| v.extend.as_mut()) {
                extend.extend = amount;
                changed = true;
            }
        }
        if changed {
            self.relocate();
        }
        changed
    }

    /// Add `delta` to an end's extend.
    pub fn adjust_extend(&mut self, sequence: usize, index: usize, delta: f64, mirror: bool) -> bool {
        match self.extend(sequence, index) {
            Some(e) => {
                let amount = e.extend + delta;
                self.set_extend(sequence, index, amount, mirror)
            }
            None => false,
        }
    }

    /// Zero an end's extend, both ends with `both`.
    pub fn reset_extend(&mut self, sequence: usize, index: usize, both: bool) -> bool {
        self.set_extend(sequence, index, 0.0, both)
    }

    /// Move the width handle and every button with it.
    pub fn set_width(&mut self, width: f64) {
        self.current_width = width;
        if let Some(w) = self.width.as_mut() {
            w.width = width;
        }
        self.relocate();
    }

    /// Sweep choices and extends as builder overrides.
    pub fn adjustments(&self) -> Adjustments {
        let mut adjustments = Adjustments::default();
        for (sequence, seq) in self.sequences.iter().enumerate() {
            for (index, vert) in seq.verts.iter().enumerate() {
                for side in Side::BOTH {
                    let key = SweepKey { sequence, index, side };
                    adjustments.sweeps.insert(key, vert.side(side).default);
                }
                if let Some(extend) = &vert.extend {
                    adjustments
                        .extends
                        .insert((sequence, SequenceEnd::from_index(index)), extend.extend);
                }
            }
        }
        adjustments
    }

    fn relocate(&mut self) {
        let scale = self.current_width * self.sweep_distance;
        for seq in &mut self.sequences {
            for vert in &mut seq.verts {
                let offset = vert
                    .extend
                    .as_mut()
                    .map(|e| {
                        e.loc = self.transform.apply_point(&(e.co + e.extend_dir * e.extend));
                        e.extend_dir * e.extend
                    })
                    .unwrap_or_else(Vec3::zeros);
                for side in Side::BOTH {
                    let g = vert.side_mut(side);
                    g.sweep_co = self.transform.apply_point(&(g.co + g.sweep_dir * scale + offset));
                }
            }
        }
        if let Some(w) = self.width.as_mut() {
            w.loc = self.transform.apply_point(&(w.center + w.width_dir * w.width));
        }
        self.notify(GizmoEvent::Moved);
    }
}

/// Active edge midpoint and its left and right face directions.
fn width_anchor(analysis: &Analysis, active: Option<EdgeId>) -> Option<(Point3, Vec3, Vec3)> {
    let candidates = analysis.sequences.iter().flat_map(|seq| {
        seq.records.iter().filter_map(move |record| {
            let next = seq.records.get(record.next?)?;
            Some((record, next))
        })
    });
    let mut first = None;
    for (record, next) in candidates {
        let anchor = (midpoint(&record.co, &next.co), record.left.face_dir, record.right.face_dir);
        if active.is_some() && record.next_edge == active {
            return Some(anchor);
        }
        first.get_or_insert(anchor);
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hyperbevel_analyze::{analyze, AnalyzeOptions};
    use hyperbevel_mesh::{primitives, Mesh, VertId};
    use hyperbevel_select::VertSequence;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn analysis_of(mesh: &Mesh, verts: Vec<VertId>, cyclic: bool) -> Analysis {
        analyze(mesh, &[VertSequence { verts, cyclic }], &AnalyzeOptions::default()).unwrap()
    }

    fn ring() -> (Analysis, GizmoState) {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let analysis = analysis_of(&mesh, ids[4..8].to_vec(), true);
        let mut gizmos = GizmoState::new(0.3);
        gizmos.init(&analysis, 0.1, 0.02, &Transform::identity(), None);
        (analysis, gizmos)
    }

    fn right(index: usize) -> SweepKey {
        SweepKey {
            sequence: 0,
            index,
            side: Side::Right,
        }
    }

    #[test]
    fn test_shift_toggle_walks_whole_ring() {
        let (analysis, mut gizmos) = ring();
        assert_eq!(gizmos.neighbours(right(0)), vec![0, 1, 2, 3]);
        assert_eq!(gizmos.toggle_sweep(right(0), true, &analysis), Some(SweepOption::FaceDir));
        assert!(gizmos.sequences[0].verts.iter().all(|v| v.right.default == SweepOption::FaceDir));
    }

    #[test]
    fn test_shift_toggle_stops_at_mismatch_and_wraps() {
        let (analysis, mut gizmos) = ring();
        gizmos.toggle_sweep(right(2), false, &analysis);
        assert_eq!(gizmos.sweep(right(2)).unwrap().default, SweepOption::FaceDir);
        assert_eq!(gizmos.sweep(right(1)).unwrap().default, SweepOption::EdgeDir);

        assert_eq!(gizmos.neighbours(right(0)), vec![0, 1, 3]);
        gizmos.toggle_sweep(right(0), true, &analysis);
        assert!(gizmos.sequences[0].verts.iter().all(|v| v.right.default == SweepOption::FaceDir));
    }

    #[test]
    fn test_open_walk_stops_at_ends() {
        let (mesh, ids) = primitives::gap_strip().to_mesh().unwrap();
        let analysis = analysis_of(&mesh, ids[0..5].to_vec(), false);
        let mut gizmos = GizmoState::new(0.3);
        gizmos.init(&analysis, 0.1, 0.02, &Transform::identity(), None);

        let key = SweepKey {
            sequence: 0,
            index: 2,
            side: Side::Left,
        };
        assert_eq!(gizmos.neighbours(key), vec![1, 2, 3]);
        assert_eq!(gizmos.toggle_sweep(key, true, &analysis), Some(SweepOption::FaceDir));
        for idx in 1..4 {
            let g = &gizmos.sequences[0].verts[idx].left;
            assert_eq!(g.default, SweepOption::FaceDir);
            assert_relative_eq!(g.sweep_dir, Vec3::y(), epsilon = 1e-9);
        }
        assert_eq!(gizmos.sequences[0].verts[0].left.default, SweepOption::EdgeDir);
    }

    #[test]
    fn test_extend_mirror_and_reset() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let analysis = analysis_of(&mesh, vec![ids[4], ids[5]], false);
        let mut gizmos = GizmoState::new(0.3);
        gizmos.init(&analysis, 0.1, 0.02, &Transform::identity(), None);

        assert_relative_eq!(gizmos.extend(0, 0).unwrap().extend, 0.002);
        assert_relative_eq!(gizmos.extend(0, 1).unwrap().loc, Point3::new(1.002, -1.0, 1.0), epsilon = 1e-12);

        assert!(gizmos.adjust_extend(0, 1, 0.1, true));
        assert_relative_eq!(gizmos.extend(0, 0).unwrap().extend, 0.102, epsilon = 1e-12);
        assert_relative_eq!(gizmos.extend(0, 1).unwrap().extend, 0.102, epsilon = 1e-12);

        assert!(gizmos.reset_extend(0, 0, false));
        let adjust = gizmos.adjustments();
        assert_eq!(adjust.extends[&(0, SequenceEnd::First)], 0.0);
        assert_relative_eq!(adjust.extends[&(0, SequenceEnd::Last)], 0.102, epsilon = 1e-12);
        assert_eq!(adjust.sweeps.len(), 4);
        assert!(!gizmos.adjust_extend(3, 0, 0.1, false));
    }

    #[test]
    fn test_width_handle_and_sweep_buttons() {
        let (mesh, ids) = primitives::cube(1.0).to_mesh().unwrap();
        let analysis = analysis_of(&mesh, vec![ids[4], ids[5]], false);
        let active = mesh.edge_between(ids[4], ids[5]).unwrap();
        let mut gizmos = GizmoState::new(0.3);
        // Dragged from the front face, so the handle goes down the front.
        gizmos.init(&analysis, 0.1, 0.0, &Transform::identity(), Some((active, Point3::new(0.0, -1.0, 0.5))));

        let w = gizmos.width.clone().unwrap();
        assert_relative_eq!(w.edge_center, Point3::new(0.0, -1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(w.width_dir, -Vec3::z(), epsilon = 1e-9);
        assert_relative_eq!(w.loc, Point3::new(0.0, -1.0, 0.9), epsilon = 1e-9);

        gizmos.set_width(0.2);
        assert_relative_eq!(gizmos.width.as_ref().unwrap().loc, Point3::new(0.0, -1.0, 0.8), epsilon = 1e-9);
        let left = gizmos.sweep(SweepKey {
            sequence: 0,
            index: 0,
            side: Side::Left,
        });
        assert_relative_eq!(left.unwrap().sweep_co, Point3::new(-1.0, -0.94, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_mailbox_notifies_observers() {
        let (_, mut gizmos) = ring();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        gizmos.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        gizmos.push(PushUpdate::Width(0.3));
        assert_eq!(gizmos.take_update(), Some(PushUpdate::Width(0.3)));
        assert_eq!(gizmos.take_update(), None);
        gizmos.clear();

        let seen = seen.borrow();
        assert_eq!(seen[0], GizmoEvent::Pushed(PushUpdate::Width(0.3)));
        assert_eq!(seen.last(), Some(&GizmoEvent::Cleared));
        assert!(!gizmos.show);
    }
}
