use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Camera control scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    /// Damped orbit around the scene center.
    #[default]
    Orbit,
    /// Pointer-lock first-person movement.
    Fps,
}

/// Errors from loading a scene configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Scene configuration.
///
/// Defaults produce the full night-ocean scene; a YAML file and CLI flags
/// can override any field. All paths are relative to `assets_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub assets_dir: PathBuf,
    pub controls: ControlScheme,
    pub water: bool,
    pub lamp: bool,
    pub audio: bool,
    pub fog: bool,
    pub debug_grid: bool,
    pub boat_model: String,
    /// Optional lamp model; a built-in primitive fixture is used when absent.
    pub lamp_model: Option<String>,
    pub sky_dir: String,
    pub water_normals: String,
    pub moon_texture: Option<String>,
    pub music: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            controls: ControlScheme::default(),
            water: true,
            lamp: true,
            audio: true,
            fog: false,
            debug_grid: false,
            boat_model: "models/boat.glb".to_string(),
            lamp_model: None,
            sky_dir: "textures/night_sky".to_string(),
            water_normals: "textures/ocean/normal.png".to_string(),
            moon_texture: Some("textures/moon.jpeg".to_string()),
            music: "audio/night_ocean.ogg".to_string(),
        }
    }
}

impl SceneConfig {
    /// Load a configuration from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Resolve an asset-relative path against the asset directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.assets_dir.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_full_scene() {
        let cfg = SceneConfig::default();
        assert!(cfg.water && cfg.lamp && cfg.audio);
        assert!(!cfg.fog);
        assert_eq!(cfg.controls, ControlScheme::Orbit);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let cfg: SceneConfig = serde_yaml::from_str("controls: fps\nwater: false\n").unwrap();
        assert_eq!(cfg.controls, ControlScheme::Fps);
        assert!(!cfg.water);
        // Untouched fields keep their defaults.
        assert!(cfg.lamp);
        assert_eq!(cfg.boat_model, "models/boat.glb");
    }

    #[test]
    fn yaml_round_trip() {
        let cfg = SceneConfig {
            fog: true,
            lamp_model: Some("models/lamp.glb".to_string()),
            ..SceneConfig::default()
        };
        let text = serde_yaml::to_string(&cfg).unwrap();
        let back: SceneConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn resolve_joins_the_asset_dir() {
        let cfg = SceneConfig::default();
        assert_eq!(
            cfg.resolve("models/boat.glb"),
            PathBuf::from("assets/models/boat.glb")
        );
    }
}
