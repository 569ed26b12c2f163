//! Cutters outside a session: finishing a hand-edited base ribbon, and
//! reopening a committed cutter for width and extend edits.

use hyperbevel_cutter::{
    reopen, BaseRibbon, BevelRequest, BevelShape, BooleanRequest, ReopenedCutter, WeldRequest, HYPER_BEVEL,
};
use tracing::info;

use crate::config::HyperBevelConfig;
use crate::error::{HyperBevelError, Result};
use crate::scene::{EditKeys, Scene};

/// Turn a cutter left as a base ribbon back into a finished cutter.
///
/// Polarity comes from the ribbon's first spine edge and the width from its
/// rails. The boolean name, stack index, segment count and profile stashed
/// in the cutter's [`EditKeys`] are restored and then cleared. On a parse
/// failure the cutter is left untouched. Returns the boolean's name.
pub fn finalize_cutter(scene: &mut Scene, name: &str, config: &HyperBevelConfig) -> Result<String> {
    let cutter = scene.require_cutter(name)?;
    let ribbon = BaseRibbon::parse(cutter.mesh.clone(), None).inspect_err(|err| {
        info!(cutter = %name, %err, "finalize failed");
    })?;
    let finished = ReopenedCutter::from_ribbon(ribbon, None)?.finalize(config.extrude_factor)?;
    let convex = finished.convex;
    let keys = cutter.manifest.edit.clone();

    let shape = BevelShape {
        custom_profile: keys.profile.clone(),
        ..BevelShape::default()
    };
    let mut bevel = BevelRequest::new(&shape);
    if let Some(segments) = keys.segments {
        bevel.segments = segments;
    }

    let boolean = match keys.modname {
        Some(modname) if scene.host.modifiers.get(&modname).is_none() => modname,
        _ => scene.host.modifiers.new_mod_name(HYPER_BEVEL),
    };

    let cutter = scene.require_cutter_mut(name)?;
    cutter.set_finished(finished);
    cutter.manifest.bevel = Some(bevel);
    cutter.manifest.weld = Some(WeldRequest::default());
    cutter.manifest.edit = EditKeys::default();

    let request = BooleanRequest::new(&boolean, name, convex, config.prefer_manifold_solver);
    scene.attach_boolean(name, request)?;
    if let Some(index) = keys.index {
        scene.host.modifiers.move_to(&boolean, index);
    }
    info!(cutter = %name, boolean = %boolean, convex, "finalized cutter");
    Ok(boolean)
}

/// Strip a committed cutter back to its base ribbon for editing.
///
/// Polarity is read from its host boolean and the width from its manifest.
pub fn reopen_cutter(scene: &Scene, name: &str) -> Result<ReopenedCutter> {
    let cutter = scene.require_cutter(name)?;
    let operation = cutter
        .manifest
        .boolean
        .as_ref()
        .map(|b| b.operation)
        .ok_or_else(|| HyperBevelError::MissingBoolean(name.to_string()))?;
    let reopened = reopen(cutter.mesh.clone(), operation, Some(cutter.manifest.width)).inspect_err(|err| {
        info!(cutter = %name, %err, "reopen failed");
    })?;
    Ok(reopened)
}

/// Finish an edited cutter and write it back.
pub fn apply_reopened(scene: &mut Scene, name: &str, reopened: ReopenedCutter, extrude_factor: f64) -> Result<()> {
    let finished = reopened.finalize(extrude_factor)?;
    scene.require_cutter_mut(name)?.set_finished(finished);
    info!(cutter = %name, "applied cutter edit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HostObject;
    use hyperbevel_cutter::CutterError;
    use hyperbevel_mesh::{primitives, Mesh};

    #[test]
    fn test_finalize_rejects_bare_mesh() {
        let (cube, _) = primitives::cube(1.0).to_mesh().unwrap();
        let mut scene = Scene::new(HostObject::new("Cube", cube.clone()));
        let name = scene.add_cutter(cube, 0.1);

        let err = finalize_cutter(&mut scene, &name, &HyperBevelConfig::default()).unwrap_err();
        assert!(matches!(err, HyperBevelError::Cutter(CutterError::NoCenterEdges)));
        assert_eq!(err.to_string(), "no center edges");
        assert!(scene.host.modifiers.is_empty());
        assert_eq!(scene.cutter(&name).unwrap().mesh.face_count(), 6);
    }

    #[test]
    fn test_reopen_needs_boolean() {
        let (cube, _) = primitives::cube(1.0).to_mesh().unwrap();
        let mut scene = Scene::new(HostObject::new("Cube", cube));
        let name = scene.add_cutter(Mesh::new(), 0.1);

        assert!(matches!(
            reopen_cutter(&scene, &name),
            Err(HyperBevelError::MissingBoolean(n)) if n == name
        ));
        assert!(matches!(reopen_cutter(&scene, "nope"), Err(HyperBevelError::UnknownCutter(_))));
    }
}
