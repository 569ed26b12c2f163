//! The interactive bevel session.
//!
//! A [`Session`] owns everything one bevel operation needs: the scene it
//! works on, snap caches for the host and its welded twin, the edge
//! selection, the analysis, the base cutter data, the gizmo state and the
//! cutters it created. It advances through [`Phase`]s in response to
//! [`Command`]s. Every command returns an [`Outcome`]; failures inside a
//! command are logged and leave the session running.

use std::time::{Duration, Instant};

use hyperbevel_analyze::{analyze, Analysis, AnalyzeOptions};
use hyperbevel_cutter::{
    build_base, build_ribbon, finish, stack::base_name, Adjustments, BaseCutter, BaseParams, BaseSequence,
    BevelRequest, BevelShape, BooleanRequest, CustomProfile, FinishParams, FinishedCutter, ProfilePoint,
    StackDirection, SweepKey, WeldRequest, HYPER_BEVEL,
};
use hyperbevel_math::{closest_point_on_line, intersect_line_plane, Point3, Vec3};
use hyperbevel_mesh::{weld, EdgeId, Mesh};
use hyperbevel_select::{
    partition, pick_active_edge, transfer_active, EdgeRecord, EdgeSelection, EdgeSource, SelectMode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{BevelSettings, HyperBevelConfig, SettingsStore};
use crate::error::Result;
use crate::gizmo::{GizmoState, PushUpdate};
use crate::preview::{wireframe, LineLayer, Preview};
use crate::scene::{EditKeys, Scene};
use crate::snap::SnapCache;

/// Smallest weld merge distance.
pub const MIN_WELD_THRESHOLD: f64 = 1e-6;

/// Where a session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Not started.
    Idle,
    /// Picking edges.
    Selecting,
    /// Dragging the width.
    Dragging,
    /// Cutters exist and are being tuned.
    Adjusting,
    /// Committed.
    Finished,
    /// Rolled back.
    Cancelled,
}

/// Result of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The session keeps going.
    Running,
    /// The session committed.
    Finished,
    /// The session was cancelled.
    Cancelled,
}

/// Everything a UI surface can ask a session to do.
///
/// Rays are world space. Commands that make no sense in the current phase
/// are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Cache the host and start selecting.
    Begin,
    /// Resolve the edge under a pointer ray.
    PickEdge {
        /// Ray origin.
        origin: Point3,
        /// Ray direction.
        dir: Vec3,
    },
    /// Add or remove the active edge or loop.
    UpdateSelection(SelectMode),
    /// Switch between single edges and grown loops.
    ToggleLoop,
    /// Pick on the welded host copy instead of the host.
    ToggleWeld,
    /// Change the weld merge distance by a delta.
    AdjustWeldThreshold(f64),
    /// Loop angle goes down by `delta` degrees.
    AdjustLoopAngle(f64),
    /// Analyze the selection and start dragging the width from the last ray.
    BeginDrag,
    /// Measure the width at a new pointer ray.
    DragTo {
        /// Ray origin.
        origin: Point3,
        /// Ray direction.
        dir: Vec3,
    },
    /// Change the width by a delta.
    AdjustWidth(f64),
    /// Turn inbetween alignment on or off for every sequence.
    ToggleInbetweenAlign,
    /// Turn center aim on or off for every sequence.
    ToggleCenterAim,
    /// Create the cutters and start adjusting. From selection this uses the
    /// stored width and profile.
    EnterAdjust,
    /// Cycle a sweep button.
    ToggleSweep {
        /// Button to cycle.
        key: SweepKey,
        /// Also cycle the neighbouring vertices.
        shift: bool,
    },
    /// Move an extend handle.
    AdjustExtend {
        /// Sequence index.
        sequence: usize,
        /// End vertex index.
        index: usize,
        /// Distance to add.
        delta: f64,
        /// Apply to both ends.
        shift: bool,
    },
    /// Zero an extend handle.
    ResetExtend {
        /// Sequence index.
        sequence: usize,
        /// End vertex index.
        index: usize,
        /// Apply to both ends.
        shift: bool,
    },
    /// Set the bevel segment count.
    SetSegments(u32),
    /// Change the bevel segment count by a delta.
    AdjustSegments(i32),
    /// Turn the chamfer shape on or off.
    SetChamfer(bool),
    /// Switch between the superellipse and the custom profile.
    ToggleCustomProfile,
    /// Replace the custom profile points. `None` restores the default.
    SetProfile(Option<Vec<ProfilePoint>>),
    /// Mirror the custom profile across `x = 0.5`.
    FlipProfile,
    /// Mirror the custom profile across `y = 0.5`.
    FlopProfile,
    /// Show or hide the cutter booleans in the viewport.
    ToggleRealtime,
    /// Show or hide sweep buttons.
    ToggleShowSweeps,
    /// Show or hide the host wireframe.
    ToggleWireframe,
    /// Move the cutter booleans up or down the host stack.
    MoveInStack(StackDirection),
    /// Apply a pending gizmo update.
    Tick,
    /// Keep the cutters and finish.
    Commit,
    /// Remove the cutters and finish.
    Cancel,
    /// Leave the cutters as base ribbons for an external edit tool.
    CommitToEditMode,
}

/// Plane a width drag is measured on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragPlane {
    origin: Point3,
    normal: Vec3,
}

/// One bevel operation on one host.
#[derive(Debug)]
pub struct Session {
    config: HyperBevelConfig,
    settings: BevelSettings,
    store: Option<SettingsStore>,
    scene: Scene,
    phase: Phase,

    snap: SnapCache,
    use_weld: bool,
    weld_threshold: f64,
    loop_select: bool,
    loop_angle: f64,
    selection: EdgeSelection,
    drag: Option<DragPlane>,
    last_ray: Option<(Point3, Vec3)>,

    analysis: Option<Analysis>,
    base: Option<BaseCutter>,
    width: f64,
    shape: BevelShape,
    gizmos: GizmoState,
    cutters: Vec<String>,
    realtime: bool,
    show_wire: bool,
    preview: Preview,
    last_rebuild: Option<Duration>,
}

impl Session {
    /// An idle session. Nothing is cached until [`Command::Begin`].
    pub fn new(scene: Scene, config: HyperBevelConfig, settings: BevelSettings) -> Self {
        Self {
            gizmos: GizmoState::new(config.sweep_distance),
            weld_threshold: config.weld_threshold,
            loop_angle: config.loop_angle,
            width: settings.width.max(config.min_width),
            shape: settings.shape(),
            show_wire: scene.host.show_wire,
            config,
            settings,
            store: None,
            scene,
            phase: Phase::Idle,
            snap: SnapCache::new(),
            use_weld: false,
            loop_select: false,
            selection: EdgeSelection::new(),
            drag: None,
            last_ray: None,
            analysis: None,
            base: None,
            cutters: Vec::new(),
            realtime: true,
            preview: Preview::new(),
            last_rebuild: None,
        }
    }

    /// A session that loads its settings from `store` and saves them back on
    /// commit.
    pub fn with_store(scene: Scene, config: HyperBevelConfig, store: SettingsStore) -> Result<Self> {
        let settings = store.load()?;
        let mut session = Self::new(scene, config, settings);
        session.store = Some(store);
        Ok(session)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Tool configuration.
    pub fn config(&self) -> &HyperBevelConfig {
        &self.config
    }

    /// Settings the session started from.
    pub fn settings(&self) -> &BevelSettings {
        &self.settings
    }

    /// The scene being edited.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Hand the scene back.
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Edge selection so far.
    pub fn selection(&self) -> &EdgeSelection {
        &self.selection
    }

    /// Analysis of the selection, once dragging starts.
    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    /// Current base cutter.
    pub fn base(&self) -> Option<&BaseCutter> {
        self.base.as_ref()
    }

    /// Gizmo state.
    pub fn gizmos(&self) -> &GizmoState {
        &self.gizmos
    }

    /// Gizmo state for a UI backend. Edits take effect once an update is
    /// pushed and the session ticks.
    pub fn gizmos_mut(&mut self) -> &mut GizmoState {
        &mut self.gizmos
    }

    /// Bevel shape applied to the cutters.
    pub fn shape(&self) -> &BevelShape {
        &self.shape
    }

    /// Current width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Names of the cutters this session created.
    pub fn cutters(&self) -> &[String] {
        &self.cutters
    }

    /// Geometry to draw this frame.
    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Picking happens on the welded copy.
    pub fn use_weld(&self) -> bool {
        self.use_weld
    }

    /// Weld merge distance.
    pub fn weld_threshold(&self) -> f64 {
        self.weld_threshold
    }

    /// Picks grow into loops.
    pub fn loop_select(&self) -> bool {
        self.loop_select
    }

    /// Loop angle in degrees.
    pub fn loop_angle(&self) -> f64 {
        self.loop_angle
    }

    /// Cutter booleans show in the viewport.
    pub fn realtime(&self) -> bool {
        self.realtime
    }

    /// The analysis hit degenerate geometry that welding might fix.
    pub fn weld_suggestion(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.weld_suggestion)
    }

    /// How long the last rebuild took.
    pub fn last_rebuild(&self) -> Option<Duration> {
        self.last_rebuild
    }

    /// Cadence at which a UI should send [`Command::Tick`] while adjusting.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.config.update_interval_ms)
    }

    /// Add edges of the current target mesh to the explicit selection
    /// without picking them. Only works while selecting. Returns how many
    /// were new.
    pub fn select_edges(&mut self, edges: &[EdgeId]) -> usize {
        if self.phase != Phase::Selecting {
            return 0;
        }
        let name = self.target_name();
        let Some(target) = self.snap.target(&name, self.source()) else {
            return 0;
        };
        let before = self.selection.edges.len();
        for &edge in edges.iter().filter(|&&e| target.mesh.contains_edge(e)) {
            if !self.selection.edges.iter().any(|r| r.edge == edge) {
                self.selection.edges.push(EdgeRecord::from_edge(&target, edge));
            }
        }
        let added = self.selection.edges.len() - before;
        debug!(added, requested = edges.len(), "selected edges");
        self.refresh_preview();
        added
    }

    /// Run one command.
    pub fn handle(&mut self, command: Command) -> Outcome {
        match self.phase {
            Phase::Finished => return Outcome::Finished,
            Phase::Cancelled => return Outcome::Cancelled,
            _ => {}
        }
        let phase = self.phase;
        match self.dispatch(command) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, ?phase, "bevel command failed");
                Outcome::Running
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        use Command::*;
        use Phase::*;

        match (self.phase, command) {
            (_, Cancel) => return Ok(self.cancel()),

            (Idle, Begin) => self.begin(),

            (Selecting, PickEdge { origin, dir }) => self.pick(origin, dir),
            (Selecting, UpdateSelection(mode)) => {
                self.selection.update(mode);
                self.refresh_preview();
            }
            (Selecting, ToggleLoop) => {
                self.loop_select = !self.loop_select;
                self.refresh_loop();
            }
            (Selecting, ToggleWeld) => {
                self.use_weld = !self.use_weld;
                if self.use_weld {
                    self.ensure_weld()?;
                }
                self.retarget();
            }
            (Selecting, AdjustWeldThreshold(delta)) => {
                self.weld_threshold = (self.weld_threshold + delta).max(MIN_WELD_THRESHOLD);
                let weld = self.weld_name();
                self.snap.remove(&weld);
                if self.use_weld {
                    self.ensure_weld()?;
                    self.retarget();
                }
                debug!(threshold = self.weld_threshold, "weld threshold changed");
            }
            (Selecting, AdjustLoopAngle(delta)) => {
                self.loop_angle = (self.loop_angle - delta).clamp(0.0, 180.0);
                self.refresh_loop();
            }
            (Selecting, BeginDrag) => self.begin_drag()?,
            (Selecting, EnterAdjust) => {
                if self.prepare_analysis()? {
                    self.width = self.settings.width.max(self.config.min_width);
                    if let (Some(profile), false) = (&self.settings.custom_profile, self.shape.chamfer) {
                        self.shape.set_profile(Some(profile.clone()));
                    }
                    self.enter_adjust()?;
                }
            }
            (Selecting, Commit) => return Ok(self.end(Finished)),

            (Dragging, DragTo { origin, dir }) => {
                if let Some(width) = self.width_from_ray(&origin, &dir) {
                    self.set_width(width)?;
                }
            }
            (Dragging | Adjusting, AdjustWidth(delta)) => {
                let width = self.width + delta;
                if self.phase == Adjusting {
                    self.gizmos.push(PushUpdate::Width(width));
                    self.process_updates()?;
                } else {
                    self.set_width(width)?;
                }
            }
            (Dragging, ToggleInbetweenAlign) => {
                if let Some(analysis) = self.analysis.as_mut().filter(|a| a.has_inbetween_align) {
                    let on = !analysis.use_inbetween_align;
                    analysis.set_global_inbetween_align(on);
                    self.rebuild()?;
                }
            }
            (Dragging, ToggleCenterAim) => {
                if let Some(analysis) = self.analysis.as_mut().filter(|a| a.has_center_aim) {
                    let on = !analysis.use_center_aim;
                    analysis.set_global_center_aim(on);
                    self.rebuild()?;
                }
            }
            (Dragging, EnterAdjust) => self.enter_adjust()?,
            (Dragging, Commit) => {
                self.enter_adjust()?;
                return Ok(self.commit());
            }

            (Adjusting, ToggleSweep { key, shift }) => {
                let toggled = match self.analysis.as_ref() {
                    Some(analysis) => self.gizmos.toggle_sweep(key, shift, analysis),
                    None => None,
                };
                if let Some(option) = toggled {
                    self.gizmos.push(PushUpdate::Sweeps(option));
                    self.process_updates()?;
                }
            }
            (Adjusting, AdjustExtend { sequence, index, delta, shift }) => {
                if self.gizmos.adjust_extend(sequence, index, delta, shift) {
                    self.gizmos.push(PushUpdate::Extend);
                    self.process_updates()?;
                }
            }
            (Adjusting, ResetExtend { sequence, index, shift }) => {
                if self.gizmos.reset_extend(sequence, index, shift) {
                    self.gizmos.push(PushUpdate::Extend);
                    self.process_updates()?;
                }
            }
            (Adjusting, SetSegments(segments)) => {
                self.shape.set_segments(segments);
                self.sync_bevels();
            }
            (Adjusting, AdjustSegments(delta)) => {
                if self.shape.adjust_segments(delta) {
                    self.sync_bevels();
                }
            }
            (Adjusting, SetChamfer(on)) => {
                if self.shape.chamfer != on {
                    self.shape.toggle_chamfer();
                    self.sync_bevels();
                }
            }
            (Adjusting, ToggleCustomProfile) => {
                match self.settings.custom_profile.clone() {
                    Some(stored) if self.shape.custom_profile.is_none() => self.shape.set_profile(Some(stored)),
                    _ => self.shape.toggle_custom(),
                }
                self.sync_bevels();
            }
            (Adjusting, SetProfile(points)) => {
                let profile = points.map(CustomProfile::new).transpose()?;
                self.shape.set_profile(profile);
                self.sync_bevels();
            }
            (Adjusting, FlipProfile) => {
                if let Some(profile) = self.shape.custom_profile.as_mut() {
                    profile.flip();
                    self.sync_bevels();
                }
            }
            (Adjusting, FlopProfile) => {
                if let Some(profile) = self.shape.custom_profile.as_mut() {
                    profile.flop();
                    self.sync_bevels();
                }
            }
            (Adjusting, ToggleRealtime) => {
                self.realtime = !self.realtime;
                for cutter in &self.cutters {
                    self.scene.set_boolean_viewport(cutter, self.realtime);
                }
                debug!(realtime = self.realtime, "toggled realtime booleans");
            }
            (Adjusting, ToggleShowSweeps) => {
                self.gizmos.show_sweeps = !self.gizmos.show_sweeps;
                self.refresh_preview();
            }
            (Selecting | Dragging | Adjusting, ToggleWireframe) => {
                self.scene.host.show_wire = !self.scene.host.show_wire;
            }
            (Adjusting, MoveInStack(direction)) => self.move_in_stack(direction),
            (Adjusting, Tick) => self.process_updates()?,
            (Adjusting, Commit) => return Ok(self.commit()),

            (Dragging | Adjusting, CommitToEditMode) => return self.commit_to_edit_mode(),

            (phase, command) => debug!(?phase, ?command, "ignored bevel command"),
        }
        Ok(Outcome::Running)
    }

    fn begin(&mut self) {
        let host = &self.scene.host;
        self.snap
            .insert(host.name.clone(), host.mesh.clone(), host.transform.clone());
        self.show_wire = host.show_wire;
        self.phase = Phase::Selecting;
        info!(host = %self.scene.host.name, "bevel session started");
        self.refresh_preview();
    }

    fn weld_name(&self) -> String {
        format!("{} (weld)", self.scene.host.name)
    }

    fn source(&self) -> EdgeSource {
        if self.use_weld {
            EdgeSource::Weld
        } else {
            EdgeSource::Orig
        }
    }

    /// Snap cache key of the mesh picks and analysis run on.
    fn target_name(&self) -> String {
        if self.use_weld {
            self.weld_name()
        } else {
            self.scene.host.name.clone()
        }
    }

    fn ensure_weld(&mut self) -> Result<()> {
        let name = self.weld_name();
        if self.snap.contains(&name) {
            return Ok(());
        }
        let welded = weld(&self.scene.host.mesh, self.weld_threshold)?;
        debug!(merged = welded.merged, threshold = self.weld_threshold, "built welded twin");
        self.snap.insert(name, welded.mesh, self.scene.host.transform.clone());
        Ok(())
    }

    fn pick(&mut self, origin: Point3, dir: Vec3) {
        self.last_ray = Some((origin, dir));
        let name = self.target_name();
        let pick = self
            .snap
            .target(&name, self.source())
            .and_then(|target| pick_active_edge(&target, &origin, &dir));

        self.drag = pick.map(|p| DragPlane {
            origin: p.drag_origin,
            normal: p.drag_normal,
        });
        if self.selection.set_active(pick.map(|p| p.record)) {
            self.refresh_loop();
        } else {
            self.refresh_preview();
        }
    }

    fn refresh_loop(&mut self) {
        let name = self.target_name();
        if let Some(target) = self.snap.target(&name, self.source()) {
            self.selection.refresh_loop(&target, self.loop_select, self.loop_angle);
        }
        self.refresh_preview();
    }

    /// Move the selection onto the current target mesh.
    fn retarget(&mut self) {
        let name = self.target_name();
        if let Some(target) = self.snap.target(&name, self.source()) {
            if let Some(active) = self.selection.active {
                self.drag = transfer_active(&active, &target).map(|p| DragPlane {
                    origin: p.drag_origin,
                    normal: p.drag_normal,
                });
            }
            self.selection.transfer(&target);
            self.selection.refresh_loop(&target, self.loop_select, self.loop_angle);
        }
        self.refresh_preview();
    }

    /// Partition and analyze the selection. False when nothing is selected.
    fn prepare_analysis(&mut self) -> Result<bool> {
        let edges = self.selection.total_edges();
        let name = self.target_name();
        let Some(entry) = self.snap.get(&name) else {
            return Ok(false);
        };
        let sequences = partition(&entry.mesh, &edges);
        if sequences.is_empty() {
            return Ok(false);
        }
        let options = AnalyzeOptions {
            host_kind: self.scene.host.kind,
        };
        let analysis = analyze(&entry.mesh, &sequences, &options)?;
        if analysis.weld_suggestion {
            warn!("degenerate geometry in selection, try weld pre-processing");
        }
        debug!(sequences = analysis.sequences.len(), edges = edges.len(), "analyzed selection");
        self.analysis = Some(analysis);
        Ok(true)
    }

    fn begin_drag(&mut self) -> Result<()> {
        if self.selection.active.is_none() || !self.prepare_analysis()? {
            return Ok(());
        }
        self.phase = Phase::Dragging;
        info!(edges = self.selection.total_edges().len(), "width drag started");
        let width = self
            .last_ray
            .and_then(|(origin, dir)| self.width_from_ray(&origin, &dir))
            .unwrap_or(self.width);
        self.set_width(width)
    }

    /// Distance from the active edge's line to where a ray meets the drag
    /// plane, measured in the host's local frame.
    fn width_from_ray(&self, origin: &Point3, dir: &Vec3) -> Option<f64> {
        let plane = self.drag?;
        let active = self.selection.active?;
        let hit = intersect_line_plane(origin, &(origin + dir), &plane.origin, &plane.normal)?;
        let inverse = self.scene.host.transform.inverse()?;
        let local = inverse.apply_point(&hit);
        let [a, b] = active.coords.map(|c| inverse.apply_point(&c));
        let (on_line, _) = closest_point_on_line(&local, &a, &b)?;
        Some((local - on_line).norm())
    }

    fn set_width(&mut self, width: f64) -> Result<()> {
        self.width = width.max(self.config.min_width);
        if self.phase == Phase::Adjusting {
            self.gizmos.set_width(self.width);
        }
        self.rebuild()
    }

    fn enter_adjust(&mut self) -> Result<()> {
        let Some(analysis) = self.analysis.as_ref() else {
            return Ok(());
        };
        let active = self
            .selection
            .active
            .zip(self.drag)
            .map(|(record, plane)| (record.edge, plane.origin));
        self.gizmos.init(
            analysis,
            self.width,
            self.config.extend_factor,
            &self.scene.host.transform,
            active,
        );

        self.phase = Phase::Adjusting;
        let base = self.build_base_data()?;
        self.create_cutters(&base)?;
        self.base = Some(base);
        self.refresh_preview();
        info!(cutters = self.cutters.len(), width = self.width, "adjusting cutters");
        Ok(())
    }

    fn build_base_data(&self) -> Result<BaseCutter> {
        let adjustments = if self.phase == Phase::Adjusting {
            self.gizmos.adjustments()
        } else {
            Adjustments::default()
        };
        let params = BaseParams {
            width: self.width,
            extend_factor: self.config.extend_factor,
        };
        let empty = Analysis::default();
        let analysis = self.analysis.as_ref().unwrap_or(&empty);
        Ok(build_base(analysis, &params, &adjustments)?)
    }

    fn finish_sequence(&self, seq: &BaseSequence) -> Result<FinishedCutter> {
        let ribbon = build_ribbon(seq, self.scene.host.is_smooth())?;
        let params = FinishParams {
            width: self.width,
            extrude_factor: self.config.extrude_factor,
        };
        Ok(finish(ribbon, &params)?)
    }

    /// Base data, then every cutter solid, then the preview.
    fn rebuild(&mut self) -> Result<()> {
        if self.analysis.is_none() {
            return Ok(());
        }
        let start = Instant::now();
        let base = self.build_base_data()?;
        for (name, seq) in self.cutters.iter().zip(&base.sequences) {
            let finished = self.finish_sequence(seq)?;
            self.scene.require_cutter_mut(name)?.set_finished(finished);
        }
        self.base = Some(base);
        self.refresh_preview();

        let elapsed = start.elapsed();
        self.last_rebuild = Some(elapsed);
        debug!(
            sequences = self.base.as_ref().map_or(0, |b| b.sequences.len()),
            width = self.width,
            elapsed_us = elapsed.as_micros() as u64,
            "rebuilt cutters"
        );
        Ok(())
    }

    fn create_cutters(&mut self, base: &BaseCutter) -> Result<()> {
        let existing = self.scene.host.modifiers.len();
        for seq in &base.sequences {
            let finished = self.finish_sequence(seq)?;
            let convex = finished.convex;
            let name = self.scene.add_cutter(Mesh::new(), self.width);
            let cutter = self.scene.require_cutter_mut(&name)?;
            cutter.set_finished(finished);
            cutter.manifest.bevel = Some(BevelRequest::new(&self.shape));
            cutter.manifest.weld = Some(WeldRequest::default());

            let boolean = self.scene.host.modifiers.new_mod_name(HYPER_BEVEL);
            let mut request = BooleanRequest::new(boolean, &name, convex, self.config.prefer_manifold_solver);
            request.show_viewport = self.realtime;
            self.scene.attach_boolean(&name, request)?;
            self.cutters.push(name);
        }
        self.place_booleans(existing);
        Ok(())
    }

    /// Slot new booleans in after the last split, or sort the whole stack.
    fn place_booleans(&mut self, existing: usize) {
        let names: Vec<String> = self
            .cutters
            .iter()
            .filter_map(|c| self.scene.boolean_name(c).map(String::from))
            .collect();
        let Some(first) = names.first() else {
            return;
        };

        if existing > 0 {
            if let Some((renamed, mut index)) = self.scene.host.modifiers.sort_after_split(first) {
                self.scene.sync_boolean_name(&self.cutters[0], &renamed);
                for (cutter, name) in self.cutters.iter().zip(&names).skip(1) {
                    index += 1;
                    self.scene.host.modifiers.move_to(name, index);
                    if let Some(renamed) = self.scene.host.modifiers.rename(name, format!("+ {name}")) {
                        self.scene.sync_boolean_name(cutter, &renamed);
                    }
                }
                return;
            }
        }
        self.sort_stack();
    }

    /// Sort the host stack and pick up any prefix changes.
    fn sort_stack(&mut self) {
        if !self.scene.host.modifiers.sort() {
            warn!("keeping modifier order, booleans stay appended");
        }
        for cutter in &self.cutters {
            let Some(current) = self.scene.boolean_name(cutter).map(String::from) else {
                continue;
            };
            if self.scene.host.modifiers.get(&current).is_some() {
                continue;
            }
            let found = self
                .scene
                .host
                .modifiers
                .iter()
                .find(|m| base_name(&m.name) == base_name(&current))
                .map(|m| m.name.clone());
            if let Some(found) = found {
                self.scene.sync_boolean_name(cutter, &found);
            }
        }
    }

    fn move_in_stack(&mut self, direction: StackDirection) {
        let stack = &self.scene.host.modifiers;
        let mut block: Vec<(usize, String, String)> = self
            .cutters
            .iter()
            .filter_map(|c| {
                let boolean = self.scene.boolean_name(c)?;
                Some((stack.index_of(boolean)?, boolean.to_string(), c.clone()))
            })
            .collect();
        block.sort();
        let names: Vec<String> = block.iter().map(|(_, b, _)| b.clone()).collect();

        match self.scene.host.modifiers.move_block(&names, direction) {
            Some(renamed) => {
                for ((_, _, cutter), new_name) in block.iter().zip(&renamed) {
                    self.scene.sync_boolean_name(cutter, new_name);
                }
                debug!(?direction, names = ?renamed, "moved booleans");
            }
            None => debug!(?direction, "booleans cannot move further"),
        }
    }

    fn sync_bevels(&mut self) {
        let request = BevelRequest::new(&self.shape);
        for name in &self.cutters {
            if let Some(cutter) = self.scene.cutter_mut(name) {
                cutter.manifest.bevel = Some(request.clone());
            }
        }
        debug!(segments = request.segments, profile = ?request.profile_type, "updated edge bevels");
    }

    /// Apply pending gizmo updates.
    fn process_updates(&mut self) -> Result<()> {
        while let Some(update) = self.gizmos.take_update() {
            match update {
                PushUpdate::Width(width) => self.set_width(width)?,
                PushUpdate::Sweeps(_) | PushUpdate::Extend => self.rebuild()?,
            }
        }
        Ok(())
    }

    fn refresh_preview(&mut self) {
        let mut preview = Preview::new();
        let transform = &self.scene.host.transform;
        match self.phase {
            Phase::Selecting => {
                if let Some(entry) = self.snap.get(&self.scene.host.name) {
                    preview.push_lines(LineLayer::Wireframe, wireframe(&entry.mesh, transform));
                }
                if self.use_weld {
                    if let Some(entry) = self.snap.get(&self.weld_name()) {
                        preview.push_lines(LineLayer::WeldWireframe, wireframe(&entry.mesh, transform));
                    }
                }
                preview.add_selection(&self.selection);
            }
            Phase::Dragging | Phase::Adjusting => {
                let sweeps = self.phase == Phase::Dragging || self.gizmos.show_sweeps;
                if let (Some(base), true) = (&self.base, sweeps) {
                    preview.add_sweeps(base, transform);
                }
                if let Some(analysis) = &self.analysis {
                    preview.add_spine(analysis, transform);
                }
                for cutter in self.cutters.iter().filter_map(|c| self.scene.cutter(c)) {
                    preview.add_cutter(&cutter.mesh, &cutter.transform);
                }
            }
            _ => {}
        }
        self.preview = preview;
    }

    fn commit(&mut self) -> Outcome {
        for cutter in &self.cutters {
            if !self.realtime {
                self.scene.set_boolean_viewport(cutter, true);
            }
            if let Some(c) = self.scene.cutter_mut(cutter) {
                c.hidden = false;
            }
        }
        self.sort_stack();
        self.settings.record(self.width, &self.shape);
        self.save_settings();
        self.end(Phase::Finished)
    }

    fn commit_to_edit_mode(&mut self) -> Result<Outcome> {
        if self.cutters.is_empty() {
            self.enter_adjust()?;
        }
        let Some(base) = self.base.take() else {
            return Ok(self.end(Phase::Finished));
        };

        let stack = &self.scene.host.modifiers;
        let keys: Vec<EditKeys> = self
            .cutters
            .iter()
            .map(|c| {
                let modname = self.scene.boolean_name(c).map(String::from);
                EditKeys {
                    segments: Some(self.shape.bevel_segments()),
                    profile: self.shape.custom_profile.clone(),
                    index: modname.as_deref().and_then(|m| stack.index_of(m)),
                    modname,
                }
            })
            .collect();

        let smooth = self.scene.host.is_smooth();
        for ((name, seq), keys) in self.cutters.iter().zip(&base.sequences).zip(keys) {
            let ribbon = build_ribbon(seq, smooth)?;
            self.scene.detach_boolean(name);
            let cutter = self.scene.require_cutter_mut(name)?;
            cutter.mesh = ribbon.mesh;
            cutter.manifest.edit = keys;
            cutter.manifest.bevel = None;
            cutter.manifest.weld = None;
            cutter.manifest.vertex_group.clear();
            cutter.manifest.flags.is_finished_hyper_bevel = false;
            cutter.hidden = false;
        }
        info!(cutters = self.cutters.len(), "handed cutters to edit mode");
        Ok(self.end(Phase::Finished))
    }

    fn cancel(&mut self) -> Outcome {
        for cutter in std::mem::take(&mut self.cutters) {
            self.scene.remove_cutter(&cutter);
        }
        self.end(Phase::Cancelled)
    }

    fn save_settings(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&self.settings) {
            warn!(%err, path = %store.path().display(), "could not save bevel settings");
        }
    }

    fn end(&mut self, phase: Phase) -> Outcome {
        self.scene.host.show_wire = self.show_wire;
        self.gizmos.clear();
        self.snap.clear();
        self.selection.clear();
        self.analysis = None;
        self.base = None;
        self.drag = None;
        self.preview = Preview::new();
        self.phase = phase;
        info!(?phase, cutters = self.cutters.len(), "bevel session ended");
        match phase {
            Phase::Cancelled => Outcome::Cancelled,
            _ => Outcome::Finished,
        }
    }
}
