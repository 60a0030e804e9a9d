//! Path management for Aura configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/aura/              # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Resolves Aura's on-disk locations.
///
/// Without a base override everything lives under the platform config
/// directory (`dirs::config_dir()/aura`). Tests pass a temporary directory.
#[derive(Debug, Clone, Default)]
pub struct AuraPaths {
    base_override: Option<PathBuf>,
}

impl AuraPaths {
    pub fn new(base_override: Option<PathBuf>) -> Self {
        Self { base_override }
    }

    /// Returns the Aura configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_override {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join("aura"))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
