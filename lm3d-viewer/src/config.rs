//! Viewer configuration, read from a JSON file.

use std::path::{Path, PathBuf};

use lumen3d::abs::RenderSettings;
use serde::Deserialize;

/// How the window occupies the screen.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    #[default]
    Windowed,
    Borderless,
    Fullscreen,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub mode: WindowMode,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen3d viewer".to_owned(),
            width: 1280,
            height: 720,
            mode: WindowMode::Windowed,
            vsync: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
            speed: 50.0,
            sensitivity: 0.05,
            position: [0.0, 20.0, 40.0],
        }
    }
}

/// A model to display and where to place it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Rotation around +Y in degrees.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    pub enabled: bool,
    /// Edge length in world units.
    pub size: f32,
    /// Vertices along each edge.
    pub resolution: u32,
    pub height_scale: f32,
    pub frequency: f32,
    pub octaves: i32,
    /// Noise seed. A random one is picked when absent.
    pub seed: Option<i32>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 200.0,
            resolution: 128,
            height_scale: 12.0,
            frequency: 0.01,
            octaves: 4,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    pub log_level: String,
    pub camera: CameraConfig,
    pub model: Option<ModelConfig>,
    /// Cubemap faces in the order +X, -X, +Y, -Y, +Z, -Z.
    pub skybox: Option<Vec<PathBuf>>,
    pub terrain: TerrainConfig,
    /// Render through an off-screen framebuffer and blit it to the window.
    pub offscreen: bool,
    pub render: RenderSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
            log_level: "info".to_owned(),
            camera: CameraConfig::default(),
            model: None,
            skybox: None,
            terrain: TerrainConfig::default(),
            offscreen: false,
            render: RenderSettings::default(),
        }
    }
}

impl ViewerConfig {
    /// `<config dir>/lm3d/viewer.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lm3d").join("viewer.json"))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Reads the given file, else the default path if it exists, else returns defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let json = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_json(&json).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            eprintln!("Unknown log level '{}', using info", self.log_level);
            log::LevelFilter::Info
        })
    }
}

#[cfg(test)]
mod tests {
    use lumen3d::abs::DepthFunc;

    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn nested_sections_fill_missing_fields() {
        let config = ViewerConfig::from_json(
            r#"{
                "window": { "mode": "borderless", "vsync": false },
                "camera": { "fov": 90.0 },
                "model": { "path": "assets/helmet.glb", "scale": 2.0 },
                "terrain": { "seed": 42 },
                "render": { "depth_func": "less_equal" },
                "log_level": "debug"
            }"#,
        )
        .unwrap();

        assert_eq!(config.window.mode, WindowMode::Borderless);
        assert!(!config.window.vsync);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.camera.fov, 90.0);
        assert_eq!(config.camera.far, 1000.0);

        let model = config.model.as_ref().unwrap();
        assert_eq!(model.path, PathBuf::from("assets/helmet.glb"));
        assert_eq!(model.scale, 2.0);
        assert_eq!(model.translation, [0.0; 3]);

        assert_eq!(config.terrain.seed, Some(42));
        assert_eq!(config.terrain.resolution, 128);
        assert_eq!(config.render.depth_func, DepthFunc::LessEqual);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ViewerConfig::from_json(r#"{ "fullscreen": true }"#).is_err());
        assert!(ViewerConfig::from_json(r#"{ "window": { "dpi": 2 } }"#).is_err());
        assert!(ViewerConfig::from_json(r#"{ "model": { "scale": 2.0 } }"#).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ViewerConfig::load(Some(Path::new("does/not/exist.json"))).unwrap_err();
        assert!(err.contains("does/not/exist.json"));
    }
}
