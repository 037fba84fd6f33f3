//! Configuration system for the terrain explorer.
//!
//! Settings persist to disk as a RON file, every section falls back to its
//! defaults when missing, and command-line flags override loaded values.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetsConfig, CameraConfig, Config, DebugConfig, NoiseConfig, TerrainConfig, WaterConfig,
    WaterMode, WindowConfig,
};
pub use error::ConfigError;
