//! Tunables and the per-user bevel settings record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hyperbevel_cutter::{BevelShape, CustomProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HyperBevelError, Result};

/// Session tunables. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperBevelConfig {
    /// Minimum angle in degrees between two edges for a loop to continue.
    pub loop_angle: f64,
    /// Merge distance of the weld preprocessor.
    pub weld_threshold: f64,
    /// Sweep gizmo distance from the spine, as a fraction of the width.
    pub sweep_distance: f64,
    /// Default extend at convex open ends, as a fraction of the width.
    pub extend_factor: f64,
    /// Cutter extrusion depth, as a fraction of the width.
    pub extrude_factor: f64,
    /// Smallest width a drag can produce.
    pub min_width: f64,
    /// Ask for the manifold boolean solver rather than the exact one.
    pub prefer_manifold_solver: bool,
    /// Push-update timer cadence.
    pub update_interval_ms: u64,
}

impl Default for HyperBevelConfig {
    fn default() -> Self {
        Self {
            loop_angle: 150.0,
            weld_threshold: 1e-4,
            sweep_distance: 0.3,
            extend_factor: 0.02,
            extrude_factor: 0.1,
            min_width: 1e-6,
            prefer_manifold_solver: true,
            update_interval_ms: 10,
        }
    }
}

impl HyperBevelConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|source| HyperBevelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded hyperbevel config");
        Ok(config)
    }
}

/// What a finished session remembers for the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BevelSettings {
    /// Last committed width, in host local units.
    pub width: f64,
    /// Last user segment count.
    pub segments: u32,
    /// Chamfer was on.
    pub chamfer: bool,
    /// Last attached profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_profile: Option<CustomProfile>,
}

impl Default for BevelSettings {
    fn default() -> Self {
        let shape = BevelShape::default();
        Self {
            width: 0.1,
            segments: shape.segments,
            chamfer: shape.chamfer,
            custom_profile: None,
        }
    }
}

impl BevelSettings {
    /// Segment count and chamfer as a bevel shape. The stored profile is
    /// only attached on request, the way the previous session left it.
    pub fn shape(&self) -> BevelShape {
        BevelShape {
            segments: self.segments,
            chamfer: self.chamfer,
            custom_profile: None,
        }
    }

    /// Record a session's final state.
    pub fn record(&mut self, width: f64, shape: &BevelShape) {
        self.width = width;
        self.segments = shape.segments;
        self.chamfer = shape.chamfer;
        self.custom_profile = shape.custom_profile.clone();
    }
}

/// TOML file holding [`BevelSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or defaults if the file does not exist yet.
    pub fn load(&self) -> Result<BevelSettings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BevelSettings::default()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&text).map_err(|source| HyperBevelError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write settings, creating parent directories as needed.
    pub fn save(&self, settings: &BevelSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(settings)?)?;
        info!(path = %self.path.display(), "saved bevel settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperbevel_cutter::ProfilePoint;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("hyperbevel-{}-{name}", std::process::id()))
            .join("settings.toml")
    }

    #[test]
    fn test_partial_config() {
        let config = HyperBevelConfig::from_toml_str("loop_angle = 120.0\nprefer_manifold_solver = false\n").unwrap();
        assert_eq!(config.loop_angle, 120.0);
        assert!(!config.prefer_manifold_solver);
        assert_eq!(config.weld_threshold, 1e-4);
        assert_eq!(config.update_interval_ms, 10);

        assert!(HyperBevelConfig::from_toml_str("loop_angle = \"wide\"").is_err());
    }

    #[test]
    fn test_missing_settings_are_defaults() {
        let store = SettingsStore::new(scratch("missing"));
        let settings = store.load().unwrap();
        assert_eq!(settings, BevelSettings::default());
        assert_eq!(settings.width, 0.1);
        assert_eq!(settings.segments, 12);
        assert!(!settings.chamfer);
        assert!(settings.custom_profile.is_none());
    }

    #[test]
    fn test_settings_round_trip_with_profile() {
        let path = scratch("profile");
        let store = SettingsStore::new(&path);

        let mut shape = BevelShape::default();
        shape.set_profile(Some(
            CustomProfile::new(vec![
                ProfilePoint::new(1.0, 0.0),
                ProfilePoint::new(0.5, 0.25),
                ProfilePoint::new(0.0, 1.0),
            ])
            .unwrap(),
        ));
        let mut settings = BevelSettings::default();
        settings.record(0.25, &shape);
        store.save(&settings).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("width = 0.25"));
        assert!(text.contains("[custom_profile]"));

        let back = store.load().unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.custom_profile.unwrap().segments(), 2);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_shape_leaves_profile_detached() {
        let settings = BevelSettings {
            width: 0.2,
            segments: 4,
            chamfer: true,
            custom_profile: Some(CustomProfile::linear(3)),
        };
        let shape = settings.shape();
        assert_eq!(shape.segments, 4);
        assert!(shape.chamfer);
        assert!(shape.custom_profile.is_none());
    }
}
