//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Flags take precedence over `config.ron`; anything left unset keeps the
/// loaded value.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Chunked terrain and water explorer")]
pub struct CliArgs {
    /// Window width in logical pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in logical pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Chunk window size for terrain and chunked water.
    #[arg(long)]
    pub chunks: Option<i32>,

    /// World-space chunk edge length.
    #[arg(long)]
    pub chunk_size: Option<f32>,

    /// Enable or disable vsync.
    #[arg(long)]
    pub vsync: Option<bool>,

    /// Start in wireframe mode.
    #[arg(long)]
    pub wireframe: bool,

    /// Log filter level such as `debug` or `warn`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory holding `config.ron` instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Asset root directory.
    #[arg(long)]
    pub assets: Option<PathBuf>,
}

impl Config {
    /// Overlay flags given on the command line. `--chunks` resizes both the
    /// terrain and the chunked-water windows.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        override_with(&mut self.window.width, args.width);
        override_with(&mut self.window.height, args.height);
        override_with(&mut self.window.vsync, args.vsync);
        override_with(&mut self.terrain.chunk_count, args.chunks);
        override_with(&mut self.water.chunk_count, args.chunks);
        override_with(&mut self.terrain.chunk_size, args.chunk_size);
        override_with(&mut self.debug.log_level, args.log_level.clone());
        override_with(&mut self.assets.root, args.assets.clone());
        self.debug.wireframe |= args.wireframe;
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_loaded_values() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            chunks: Some(16),
            wireframe: true,
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.terrain.chunk_count, 16);
        assert_eq!(config.water.chunk_count, 16);
        assert!(config.debug.wireframe);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.terrain.chunk_size, 32.0);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        config.terrain.chunk_count = 24;
        let loaded = config.clone();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "terra",
            "--chunk-size",
            "16",
            "--vsync",
            "true",
            "--assets",
            "/tmp/assets",
        ]);
        assert_eq!(args.chunk_size, Some(16.0));
        assert_eq!(args.vsync, Some(true));
        assert_eq!(args.assets, Some(PathBuf::from("/tmp/assets")));
        assert!(!args.wireframe);
    }
}
