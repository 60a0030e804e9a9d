//! Configuration service implementation.
//!
//! Loads [`AuraConfig`] from `config.toml` under [`AuraPaths`], applying
//! environment overrides on top of the file contents.

use crate::paths::AuraPaths;
use crate::storage::AtomicTomlFile;
use aura_core::config::AuraConfig;
use aura_core::{AuraError, Result};
use std::path::PathBuf;

/// Environment variable that overrides `[ai] api_key`.
pub const API_KEY_ENV: &str = "AURA_API_KEY";

/// Loads and saves the application configuration.
pub struct ConfigService {
    file: AtomicTomlFile<AuraConfig>,
}

impl ConfigService {
    pub fn new(paths: &AuraPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| AuraError::config(e.to_string()))?;
        Ok(Self::at(path))
    }

    /// Service bound to an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Loads the configuration with environment overrides applied.
    ///
    /// A missing file is created with defaults. Overrides are never written
    /// back.
    pub fn load(&self) -> Result<AuraConfig> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads the file contents only.
    pub fn load_file(&self) -> Result<AuraConfig> {
        match self.file.load()? {
            Some(config) => Ok(config),
            None => {
                let config = AuraConfig::default();
                self.file.save(&config)?;
                tracing::info!(
                    "[ConfigService] Wrote default configuration to {}",
                    self.file.path().display()
                );
                Ok(config)
            }
        }
    }

    pub fn save(&self, config: &AuraConfig) -> Result<()> {
        self.file.save(config)?;
        tracing::debug!("[ConfigService] Saved {}", self.file.path().display());
        Ok(())
    }
}

/// Overlays values from `lookup` (normally the process environment).
///
/// Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut AuraConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        tracing::debug!("[ConfigService] API key taken from {}", API_KEY_ENV);
        config.ai.api_key = Some(key.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(&AuraPaths::new(Some(temp_dir.path().to_path_buf())))
            .unwrap();

        let config = service.load_file().unwrap();
        assert_eq!(config, AuraConfig::default());
        assert!(service.config_path().exists());
    }

    #[test]
    fn saved_values_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::at(temp_dir.path().join("config.toml"));

        let mut config = AuraConfig::default();
        config.session.fallback_message = "Back in a moment.".into();
        config.ai.request_timeout_secs = 5;
        service.save(&config).unwrap();

        assert_eq!(service.load_file().unwrap(), config);
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut config = AuraConfig::default();
        config.ai.api_key = Some("from-file".into());

        apply_env_overrides(&mut config, |key| {
            (key == API_KEY_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(config.ai.api_key.as_deref(), Some("from-env"));

        apply_env_overrides(&mut config, |_| Some("   ".to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("from-env"));
    }
}
