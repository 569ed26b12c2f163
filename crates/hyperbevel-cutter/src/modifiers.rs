//! Declarative modifier requests emitted for a finished cutter.
//!
//! Nothing here evaluates a modifier. The host applies the requests to its own
//! modifier stack; the cutter only describes what to attach and with which
//! parameters.

use serde::{Deserialize, Serialize};

use crate::profile::CustomProfile;

/// Base name of the host boolean.
pub const HYPER_BEVEL: &str = "Hyper Bevel";
/// Name of the cutter's bevel modifier and of its vertex group.
pub const EDGE_BEVEL: &str = "Edge Bevel";
/// Name of the cutter's weld modifier.
pub const WELD: &str = "Weld";
/// Merge distance of the cutter's weld modifier.
pub const WELD_DISTANCE: f64 = 1e-6;

/// Bevel profile shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    /// The built-in profile, driven by the `profile` shape factor.
    #[default]
    Superellipse,
    /// A user polyline.
    Custom,
}

/// Which edges a bevel acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitMethod {
    /// Edges whose vertices are all in the named vertex group.
    #[default]
    Vgroup,
}

/// Segment count, chamfer and profile of the edge bevel.
///
/// The toggles mirror the adjustment keys: the most recent toggle wins when
/// chamfer and a custom profile would both be on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BevelShape {
    /// User segment count. 0 is a single bevel segment.
    pub segments: u32,
    /// One bevel segment regardless of `segments`.
    pub chamfer: bool,
    /// Polyline profile, if attached.
    pub custom_profile: Option<CustomProfile>,
}

impl Default for BevelShape {
    fn default() -> Self {
        Self {
            segments: 12,
            chamfer: false,
            custom_profile: None,
        }
    }
}

impl BevelShape {
    /// Segments the bevel modifier is asked for.
    pub fn bevel_segments(&self) -> u32 {
        if self.chamfer {
            1
        } else if let Some(profile) = &self.custom_profile {
            profile.segments() as u32 + 1
        } else {
            self.segments + 1
        }
    }

    /// Scroll adjustment. Ignored while a chamfer or custom profile is on.
    pub fn adjust_segments(&mut self, delta: i32) -> bool {
        if self.chamfer || self.custom_profile.is_some() {
            return false;
        }
        self.segments = self.segments.saturating_add_signed(delta);
        true
    }

    /// Preset segment count. Clears the chamfer.
    pub fn set_segments(&mut self, segments: u32) {
        self.segments = segments;
        self.chamfer = false;
    }

    /// Flip the chamfer. The segment count is kept for when it goes off.
    pub fn toggle_chamfer(&mut self) {
        self.chamfer = !self.chamfer;
    }

    /// Attach or detach a profile. Attaching clears the chamfer.
    pub fn set_profile(&mut self, profile: Option<CustomProfile>) {
        if profile.is_some() {
            self.chamfer = false;
        }
        self.custom_profile = profile;
    }

    /// With both a profile and a chamfer on, drop the chamfer. Otherwise
    /// attach a straight profile or detach the current one.
    pub fn toggle_custom(&mut self) {
        if self.custom_profile.is_some() && self.chamfer {
            self.chamfer = false;
        } else if self.custom_profile.is_some() {
            self.custom_profile = None;
        } else {
            let segments = (self.segments as usize).max(1);
            self.set_profile(Some(CustomProfile::linear(segments)));
        }
    }

    /// Custom when a profile is attached.
    pub fn profile_type(&self) -> ProfileType {
        if self.custom_profile.is_some() {
            ProfileType::Custom
        } else {
            ProfileType::Superellipse
        }
    }
}

/// The cutter's edge bevel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BevelRequest {
    /// Modifier name.
    pub name: String,
    /// Absolute width. Always 0, the percent width drives the bevel.
    pub width: f64,
    /// Width as a percentage of the vertex group's offset.
    pub width_pct: f64,
    /// Superellipse shape factor. 0.5 is a round arc.
    pub profile: f64,
    /// Segment count, see [`BevelShape::bevel_segments`].
    pub segments: u32,
    /// Keep bevel vertices on their original edges.
    pub loop_slide: bool,
    /// Which edges the bevel acts on.
    pub limit_method: LimitMethod,
    /// Vertex group holding the cutter's spine.
    pub vertex_group: String,
    /// Superellipse or custom.
    pub profile_type: ProfileType,
    /// The polyline for [`ProfileType::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_profile: Option<CustomProfile>,
}

impl BevelRequest {
    /// Request for `shape`, limited to the [`EDGE_BEVEL`] group.
    pub fn new(shape: &BevelShape) -> Self {
        Self {
            name: EDGE_BEVEL.to_string(),
            width: 0.0,
            width_pct: 100.0,
            profile: 0.5,
            segments: shape.bevel_segments(),
            loop_slide: true,
            limit_method: LimitMethod::Vgroup,
            vertex_group: EDGE_BEVEL.to_string(),
            profile_type: shape.profile_type(),
            custom_profile: shape.custom_profile.clone(),
        }
    }
}

/// Weld merge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeldMode {
    /// Only merge along connected edges.
    #[default]
    Connected,
    /// Merge any vertices within the distance.
    All,
}

/// The cutter's weld, closing the seams the bevel opens at caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeldRequest {
    /// Modifier name.
    pub name: String,
    /// Merge distance.
    pub distance: f64,
    /// Merge mode.
    pub mode: WeldMode,
}

impl Default for WeldRequest {
    fn default() -> Self {
        Self {
            name: WELD.to_string(),
            distance: WELD_DISTANCE,
            mode: WeldMode::Connected,
        }
    }
}

/// Boolean operation on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanOperation {
    /// Cut the cutter out of the host.
    Difference,
    /// Add the cutter to the host.
    Union,
}

impl BooleanOperation {
    /// Convex edges are cut away, concave edges are filled.
    pub fn for_polarity(convex: bool) -> Self {
        if convex {
            BooleanOperation::Difference
        } else {
            BooleanOperation::Union
        }
    }

    /// Polarity recovered from an existing boolean.
    pub fn is_convex(self) -> bool {
        self != BooleanOperation::Union
    }
}

/// Boolean solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanSolver {
    /// Fast solver for closed manifold operands.
    Manifold,
    /// Robust solver for anything else.
    Exact,
}

impl BooleanSolver {
    /// Solver for the config's manifold preference.
    pub fn preferred(prefer_manifold: bool) -> Self {
        if prefer_manifold {
            BooleanSolver::Manifold
        } else {
            BooleanSolver::Exact
        }
    }
}

/// The host boolean pointing at a cutter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanRequest {
    /// Modifier name, e.g. "Hyper Bevel.001".
    pub name: String,
    /// Difference or union, from the cutter's polarity.
    pub operation: BooleanOperation,
    /// Solver.
    pub solver: BooleanSolver,
    /// Cutter object name.
    pub operand: String,
    /// Cleared while realtime updates are off.
    pub show_viewport: bool,
}

impl BooleanRequest {
    /// Visible boolean named `name` against the cutter `operand`.
    pub fn new(name: impl Into<String>, operand: impl Into<String>, convex: bool, prefer_manifold: bool) -> Self {
        Self {
            name: name.into(),
            operation: BooleanOperation::for_polarity(convex),
            solver: BooleanSolver::preferred(prefer_manifold),
            operand: operand.into(),
            show_viewport: true,
        }
    }
}

/// Any of the requests, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierRequest {
    /// The cutter's edge bevel.
    Bevel(BevelRequest),
    /// The cutter's weld.
    Weld(WeldRequest),
    /// The host boolean.
    Boolean(BooleanRequest),
}

impl ModifierRequest {
    /// Modifier name.
    pub fn name(&self) -> &str {
        match self {
            ModifierRequest::Bevel(r) => &r.name,
            ModifierRequest::Weld(r) => &r.name,
            ModifierRequest::Boolean(r) => &r.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_rule() {
        let mut shape = BevelShape::default();
        assert_eq!(shape.bevel_segments(), 13);

        shape.toggle_chamfer();
        assert_eq!(shape.bevel_segments(), 1);
        assert!(!shape.adjust_segments(1));

        shape.set_segments(6);
        assert!(!shape.chamfer);
        assert_eq!(shape.bevel_segments(), 7);

        shape.set_segments(0);
        assert_eq!(shape.bevel_segments(), 1);
        assert!(shape.adjust_segments(-1));
        assert_eq!(shape.segments, 0);
    }

    #[test]
    fn test_latest_toggle_wins() {
        let mut shape = BevelShape::default();
        shape.toggle_chamfer();
        shape.toggle_custom();
        assert!(!shape.chamfer);
        assert_eq!(shape.profile_type(), ProfileType::Custom);
        assert_eq!(shape.bevel_segments(), 13);

        shape.toggle_chamfer();
        assert_eq!(shape.bevel_segments(), 1);
        // First press drops the chamfer, the second detaches the profile.
        shape.toggle_custom();
        assert!(!shape.chamfer);
        assert!(shape.custom_profile.is_some());
        shape.toggle_custom();
        assert!(shape.custom_profile.is_none());
        assert_eq!(shape.profile_type(), ProfileType::Superellipse);
    }

    #[test]
    fn test_bevel_request_defaults() {
        let request = BevelRequest::new(&BevelShape::default());
        assert_eq!(request.name, "Edge Bevel");
        assert_eq!(request.vertex_group, "Edge Bevel");
        assert_eq!(request.width, 0.0);
        assert_eq!(request.width_pct, 100.0);
        assert_eq!(request.profile, 0.5);
        assert!(request.loop_slide);
        assert_eq!(request.segments, 13);

        let weld = WeldRequest::default();
        assert_eq!(weld.distance, 1e-6);
        assert_eq!(weld.mode, WeldMode::Connected);
    }

    #[test]
    fn test_boolean_polarity() {
        let cut = BooleanRequest::new("Hyper Bevel", "Cutter", true, true);
        assert_eq!(cut.operation, BooleanOperation::Difference);
        assert_eq!(cut.solver, BooleanSolver::Manifold);
        assert!(cut.operation.is_convex());

        let fill = BooleanRequest::new("Hyper Bevel", "Cutter", false, false);
        assert_eq!(fill.operation, BooleanOperation::Union);
        assert_eq!(fill.solver, BooleanSolver::Exact);
        assert!(!fill.operation.is_convex());
    }

    #[test]
    fn test_request_json_is_tagged() {
        let request = ModifierRequest::Boolean(BooleanRequest::new("Hyper Bevel.001", "Cutter", true, true));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "BOOLEAN");
        assert_eq!(json["operation"], "DIFFERENCE");
        assert_eq!(json["solver"], "MANIFOLD");
        assert_eq!(request.name(), "Hyper Bevel.001");
    }
}
