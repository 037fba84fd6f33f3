//! The `config.ron` schema. Every section is `#[serde(default)]`, so a file
//! may name only the settings it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub terrain: TerrainConfig,
    pub water: WaterConfig,
    pub assets: AssetsConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Logical size.
    pub width: u32,
    pub height: u32,
    /// Base title; frame statistics are appended at runtime.
    pub title: String,
    /// Enable vsync. When off the surface asks for `PresentMode::Immediate`.
    pub vsync: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Mouse look sensitivity in degrees per pixel.
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Spawn position. The camera initially faces the world origin.
    pub start_position: [f32; 3],
}

/// Noise parameters shared by terrain displacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    pub frequency: f32,
    pub amplitude: f32,
    pub octaves: u32,
    pub seed: u32,
}

/// Terrain surface and the chunk window it is drawn through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World-space edge length of one chunk.
    pub chunk_size: f32,
    /// Chunk window size `C`; `(C + 1)^2` chunks are drawn per frame.
    pub chunk_count: i32,
    /// Height noise.
    pub noise: NoiseConfig,
    /// Four colour stops, low to high.
    pub gradient_colors: [[f32; 3]; 4],
    /// Normalized heights of the four colour stops.
    pub gradient_weights: [f32; 4],
    /// Distance fog.
    pub fog: bool,
    /// Chebyshev ring thresholds (in chunks) for each level of detail.
    /// Chunks beyond the last ring use the coarsest level.
    pub lod_rings: Vec<u32>,
    /// Subdivisions per chunk edge at the finest level of detail.
    pub max_subdivision: u32,
}

/// How water is rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WaterMode {
    /// Noise-displaced water patches drawn through the chunk window.
    #[default]
    Chunked,
    /// A single full-screen pass that ray-marches the water plane.
    ScreenSpace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterConfig {
    pub mode: WaterMode,
    /// Water plane height.
    pub level: f32,
    /// Chunk window size for chunked water. Independent from terrain.
    pub chunk_count: i32,
    pub shallow_color: [f32; 3],
    pub deep_color: [f32; 3],
    pub wave_speed: f32,
    pub wave_amplitude: f32,
    /// Surface opacity used for blending.
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Asset root. Relative paths resolve against the working directory.
    pub root: PathBuf,
}

/// Initial toggles and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Start in wireframe mode.
    pub wireframe: bool,
    /// Start with back-face culling enabled.
    pub cull_face: bool,
    /// Seconds between frame statistics reports. Zero disables them.
    pub stats_interval_secs: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 800,
            title: "Terra Explorer".to_string(),
            vsync: false,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            sensitivity: 0.1,
            fov_degrees: 45.0,
            near: 0.1,
            start_position: [0.0, 20.0, 0.0],
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            frequency: 0.004,
            amplitude: 60.0,
            octaves: 6,
            seed: 0,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32.0,
            chunk_count: 128,
            noise: NoiseConfig::default(),
            gradient_colors: [
                [0.76, 0.70, 0.50],
                [0.25, 0.45, 0.15],
                [0.40, 0.35, 0.30],
                [0.95, 0.95, 0.97],
            ],
            gradient_weights: [0.0, 0.25, 0.6, 0.85],
            fog: true,
            lod_rings: vec![2, 6, 16, 40],
            max_subdivision: 32,
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            mode: WaterMode::Chunked,
            level: 0.0,
            chunk_count: 128,
            shallow_color: [0.10, 0.45, 0.55],
            deep_color: [0.02, 0.10, 0.25],
            wave_speed: 0.5,
            wave_amplitude: 0.4,
            alpha: 0.8,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            wireframe: false,
            cull_face: true,
            stats_interval_secs: 1.0,
        }
    }
}

impl Config {
    /// Read `config.ron` from `config_dir`, writing the defaults there first
    /// if the file doesn't exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Config: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Config: wrote defaults to {}", config_path.display());
            Ok(config)
        }
    }

    /// Write `config.ron`, creating `config_dir` if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .struct_names(false)
            .indentor("    ".to_string());
        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(write_error)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
