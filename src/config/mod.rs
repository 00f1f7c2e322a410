//! Configuration management for imagemill

pub mod schema;

pub use schema::Config;

use crate::error::{MillError, MillResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_NAME: &str = "imagemill.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imagemill")
            .join("config.toml")
    }

    /// Look for a project-local config in `dir`
    pub fn find_local_config(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(LOCAL_CONFIG_NAME);
        candidate.is_file().then_some(candidate)
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> MillResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        Self::load_from_file(&self.config_path).await
    }

    /// Load the local config when given, otherwise the managed one.
    ///
    /// Local files replace the global file wholesale; missing keys take
    /// their defaults.
    pub async fn load_preferring(&self, local: Option<&Path>) -> MillResult<Config> {
        match local {
            Some(path) => {
                debug!("Using local config {}", path.display());
                Self::load_from_file(path).await
            }
            None => self.load().await,
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(path: &Path) -> MillResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| MillError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| MillError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config).map_err(|reason| MillError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &Config) -> Result<(), String> {
    if config.image.repository.trim().is_empty() {
        return Err("image.repository must not be empty".to_string());
    }
    if config.buildx.platforms.is_empty() {
        return Err("buildx.platforms must list at least one platform".to_string());
    }
    if config.general.docker_binary.trim().is_empty() {
        return Err("general.docker_binary must not be empty".to_string());
    }
    Ok(())
}
