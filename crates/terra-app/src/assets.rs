//! Asset path resolution.

use std::path::{Path, PathBuf};

use terra_config::AssetsConfig;
use terra_render::ShaderSources;

const SHADER_DIR: &str = "shaders";
const COMMON_INCLUDE: &str = "common.wgsl";

/// Resolves files under the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A relative root that doesn't exist from the working directory falls
    /// back to the workspace `assets/` directory, so `cargo run` works from
    /// any directory.
    pub fn from_config(config: &AssetsConfig) -> Self {
        let root = &config.root;
        if root.is_absolute() || root.exists() {
            return Self::new(root);
        }
        let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(root);
        if workspace.exists() {
            tracing::debug!("Using workspace asset root {}", workspace.display());
            Self::new(workspace)
        } else {
            Self::new(root)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shader(&self, file: &str) -> PathBuf {
        self.root.join(SHADER_DIR).join(file)
    }

    /// Sources of a program whose stages share one file, with the common
    /// noise include in front.
    pub fn program(&self, file: &str) -> ShaderSources {
        let path = self.shader(file);
        ShaderSources::new(&path)
            .with_fragment(path)
            .with_include(self.shader(COMMON_INCLUDE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_paths() {
        let assets = AssetPaths::new("/data/terra");
        assert_eq!(
            assets.shader("sky.wgsl"),
            PathBuf::from("/data/terra/shaders/sky.wgsl")
        );
    }

    #[test]
    fn test_program_includes_common() {
        let sources = AssetPaths::new("/a").program("terrain.wgsl");
        assert_eq!(sources.vertex, PathBuf::from("/a/shaders/terrain.wgsl"));
        assert_eq!(sources.fragment, Some(sources.vertex.clone()));
        assert_eq!(sources.includes, vec![PathBuf::from("/a/shaders/common.wgsl")]);
    }

    #[test]
    fn test_existing_root_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetsConfig {
            root: dir.path().to_path_buf(),
        };
        assert_eq!(AssetPaths::from_config(&config).root(), dir.path());
    }

    #[test]
    fn test_default_root_finds_workspace_shaders() {
        let assets = AssetPaths::from_config(&AssetsConfig::default());
        assert!(assets.shader("terrain.wgsl").exists());
    }
}
