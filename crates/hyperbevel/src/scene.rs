//! The objects a session works on: one host and the cutters parented to it.
//!
//! The host owns a [`ModifierStack`] of names and kinds. The parameters of a
//! cutter's host boolean, bevel and weld live in its [`CutterManifest`], so
//! the manifest alone is enough to recreate the modifiers elsewhere.

use hyperbevel_analyze::HostKind;
use hyperbevel_cutter::{
    BevelRequest, BooleanRequest, CustomProfile, FinishedCutter, Modifier, ModifierKind, ModifierStack, WeldRequest,
    EDGE_BEVEL,
};
use hyperbevel_math::Transform;
use hyperbevel_mesh::{Mesh, PolygonMesh};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HyperBevelError, Result};

/// Object and mesh name of new cutters.
pub const CUTTER_NAME: &str = "Hyper Bevel";

/// How the host tool classifies the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    /// Plain mesh object.
    #[default]
    Cube,
}

/// Viewport display of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayType {
    /// Bounds only.
    #[default]
    Wire,
    /// Shaded.
    Textured,
}

/// Object-level flags every cutter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutterFlags {
    /// Created by this tool family.
    pub is_hyper: bool,
    /// Host-side object class.
    pub object_type: ObjectType,
    /// Created by the bevel tool.
    pub is_hyper_bevel: bool,
    /// Cleared while the cutter is a bare base ribbon being edited.
    pub is_finished_hyper_bevel: bool,
}

impl Default for CutterFlags {
    fn default() -> Self {
        Self {
            is_hyper: true,
            object_type: ObjectType::Cube,
            is_hyper_bevel: true,
            is_finished_hyper_bevel: false,
        }
    }
}

/// Keys stashed on a cutter while its base ribbon is edited by hand, so the
/// next finalize can restore what the session had set up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditKeys {
    /// Segment count of the stashed bevel.
    #[serde(rename = "hyperbevel_segments", skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
    /// Custom profile of the stashed bevel.
    #[serde(rename = "hyperbevel_profile", skip_serializing_if = "Option::is_none")]
    pub profile: Option<CustomProfile>,
    /// Name of the host boolean modifier.
    #[serde(rename = "hyperbevel_modname", skip_serializing_if = "Option::is_none")]
    pub modname: Option<String>,
    /// Position of that modifier in the host stack.
    #[serde(rename = "hyperbevel_index", skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl EditKeys {
    /// No key is set.
    pub fn is_empty(&self) -> bool {
        self.segments.is_none() && self.profile.is_none() && self.modname.is_none() && self.index.is_none()
    }
}

/// Everything a host needs to know about a cutter besides its mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutterManifest {
    /// Object name, unique in the scene.
    pub name: String,
    /// Host object name.
    pub parent: String,
    /// Object-level flags.
    pub flags: CutterFlags,
    /// Viewport display.
    pub display: DisplayType,
    /// Hidden from renders.
    pub hide_render: bool,
    /// Bevel on the cutter's spine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bevel: Option<BevelRequest>,
    /// Weld on the cutter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weld: Option<WeldRequest>,
    /// The boolean on the host pointing at this cutter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<BooleanRequest>,
    /// Name of the bevel vertex group.
    pub vertex_group_name: String,
    /// Spine vertex indices into the exported mesh.
    pub vertex_group: Vec<usize>,
    /// Width the cutter was last built with.
    pub width: f64,
    /// Keys stashed while the base ribbon is edited.
    #[serde(default, skip_serializing_if = "EditKeys::is_empty")]
    pub edit: EditKeys,
}

impl CutterManifest {
    /// Manifest with default flags and no modifiers.
    pub fn new(name: impl Into<String>, parent: impl Into<String>, width: f64) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            flags: CutterFlags::default(),
            display: DisplayType::Wire,
            hide_render: true,
            bevel: None,
            weld: None,
            boolean: None,
            vertex_group_name: EDGE_BEVEL.to_string(),
            vertex_group: Vec::new(),
            width,
            edit: EditKeys::default(),
        }
    }
}

/// A cutter object. Its mesh is in the host's local frame.
#[derive(Debug, Clone)]
pub struct CutterObject {
    /// Name, flags and modifier parameters.
    pub manifest: CutterManifest,
    /// Cutter geometry.
    pub mesh: Mesh,
    /// Object transform.
    pub transform: Transform,
    /// Hidden in the viewport.
    pub hidden: bool,
}

impl CutterObject {
    /// Object name.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Take over a freshly built solid: mesh, width and bevel vertex group.
    pub fn set_finished(&mut self, finished: FinishedCutter) {
        let (_, group) = finished.to_polygon();
        self.manifest.vertex_group = group;
        self.manifest.width = finished.width;
        self.manifest.flags.is_finished_hyper_bevel = true;
        self.mesh = finished.mesh;
    }

    /// Mesh and manifest, ready to write out.
    pub fn export(&self) -> CutterExport {
        CutterExport {
            manifest: self.manifest.clone(),
            mesh: PolygonMesh::from_mesh(&self.mesh),
        }
    }
}

/// Serializable form of a cutter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutterExport {
    /// Name, flags and modifier parameters.
    pub manifest: CutterManifest,
    /// Cutter geometry.
    pub mesh: PolygonMesh,
}

/// The mesh object being beveled.
#[derive(Debug, Clone)]
pub struct HostObject {
    /// Object name.
    pub name: String,
    /// Host geometry.
    pub mesh: Mesh,
    /// Object transform.
    pub transform: Transform,
    /// Mesh or curve-derived host.
    pub kind: HostKind,
    /// Modifiers on the host, in evaluation order.
    pub modifiers: ModifierStack,
    /// Wireframe overlay in the viewport.
    pub show_wire: bool,
}

impl HostObject {
    /// Mesh host at the origin with an empty stack.
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Transform::identity(),
            kind: HostKind::Mesh,
            modifiers: ModifierStack::new(),
            show_wire: false,
        }
    }

    /// Shading of the first face. Cutters copy it.
    pub fn is_smooth(&self) -> bool {
        self.mesh.faces().next().is_some_and(|f| self.mesh.face(f).smooth)
    }
}

/// A host and its cutters.
#[derive(Debug, Clone)]
pub struct Scene {
    /// The object being beveled.
    pub host: HostObject,
    /// Cutters parented to the host.
    pub cutters: Vec<CutterObject>,
}

impl Scene {
    /// Scene with no cutters.
    pub fn new(host: HostObject) -> Self {
        Self {
            host,
            cutters: Vec::new(),
        }
    }

    /// First free object name: `base`, then `base.001` and up.
    pub fn new_object_name(&self, base: &str) -> String {
        let taken = |name: &str| name == self.host.name || self.cutters.iter().any(|c| c.name() == name);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}.{i:03}"))
            .find(|name| !taken(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Create a hidden cutter parented to the host. Returns its name.
    pub fn add_cutter(&mut self, mesh: Mesh, width: f64) -> String {
        let name = self.new_object_name(CUTTER_NAME);
        let manifest = CutterManifest::new(&name, &self.host.name, width);
        self.cutters.push(CutterObject {
            manifest,
            mesh,
            transform: self.host.transform.clone(),
            hidden: true,
        });
        debug!(cutter = %name, host = %self.host.name, "added cutter");
        name
    }

    /// Cutter named `name`.
    pub fn cutter(&self, name: &str) -> Option<&CutterObject> {
        self.cutters.iter().find(|c| c.name() == name)
    }

    /// Mutable cutter named `name`.
    pub fn cutter_mut(&mut self, name: &str) -> Option<&mut CutterObject> {
        self.cutters.iter_mut().find(|c| c.name() == name)
    }

    pub(crate) fn require_cutter(&self, name: &str) -> Result<&CutterObject> {
        self.cutter(name).ok_or_else(|| HyperBevelError::UnknownCutter(name.to_string()))
    }

    pub(crate) fn require_cutter_mut(&mut self, name: &str) -> Result<&mut CutterObject> {
        self.cutter_mut(name)
            .ok_or_else(|| HyperBevelError::UnknownCutter(name.to_string()))
    }

    /// Attach `request` to the host stack and record it on the cutter.
    pub fn attach_boolean(&mut self, cutter: &str, request: BooleanRequest) -> Result<()> {
        let mut modifier = Modifier::new(&request.name, ModifierKind::Boolean);
        modifier.show_viewport = request.show_viewport;
        self.require_cutter_mut(cutter)?.manifest.boolean = Some(request);
        self.host.modifiers.push(modifier);
        Ok(())
    }

    /// Remove the cutter's host boolean, if it has one.
    pub fn detach_boolean(&mut self, cutter: &str) -> Option<BooleanRequest> {
        let request = self.cutter_mut(cutter)?.manifest.boolean.take()?;
        self.host.modifiers.remove(&request.name);
        Some(request)
    }

    /// Show or hide a cutter's boolean in the viewport.
    pub fn set_boolean_viewport(&mut self, cutter: &str, show: bool) {
        let Some(request) = self.cutter_mut(cutter).and_then(|c| c.manifest.boolean.as_mut()) else {
            return;
        };
        request.show_viewport = show;
        let name = request.name.clone();
        if let Some(m) = self.host.modifiers.get_mut(&name) {
            m.show_viewport = show;
        }
    }

    /// Pick up boolean renames made directly on the host stack.
    pub fn sync_boolean_name(&mut self, cutter: &str, new_name: &str) {
        if let Some(request) = self.cutter_mut(cutter).and_then(|c| c.manifest.boolean.as_mut()) {
            request.name = new_name.to_string();
        }
    }

    /// Host boolean name of a cutter.
    pub fn boolean_name(&self, cutter: &str) -> Option<&str> {
        self.cutter(cutter)?.manifest.boolean.as_ref().map(|b| b.name.as_str())
    }

    /// Delete a cutter along with its host boolean.
    pub fn remove_cutter(&mut self, name: &str) -> Option<CutterObject> {
        self.detach_boolean(name);
        let idx = self.cutters.iter().position(|c| c.name() == name)?;
        debug!(cutter = %name, "removed cutter");
        Some(self.cutters.remove(idx))
    }
}
