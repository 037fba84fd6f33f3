//! OS-specific directories.

use std::path::PathBuf;

use crate::error::PlatformError;

const APP_NAME: &str = "terra";

/// Where configuration and logs live on this platform (XDG on Linux, Known
/// Folders on Windows, Library on macOS).
#[derive(Debug, Clone)]
pub struct PlatformDirs {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve without touching the filesystem.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_dir = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join(APP_NAME).join("logs"))
            .unwrap_or_else(|| config_dir.join("logs"));

        Ok(Self {
            config_dir,
            log_dir,
        })
    }

    /// Resolve and create both directories.
    pub fn resolve_and_create() -> Result<Self, PlatformError> {
        let dirs = Self::resolve()?;
        dirs.create()?;
        Ok(dirs)
    }

    fn create(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_app_specific() {
        let Ok(dirs) = PlatformDirs::resolve() else {
            return;
        };
        assert!(dirs.config_dir.ends_with(APP_NAME));
        assert!(dirs.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_create_makes_both_directories() {
        let root = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs {
            config_dir: root.path().join("config"),
            log_dir: root.path().join("nested").join("logs"),
        };
        dirs.create().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }

    #[test]
    fn test_platform_error_display() {
        assert_eq!(
            PlatformError::NoConfigDir.to_string(),
            "could not determine OS configuration directory"
        );
    }
}
