//! Configuration schema for imagemill
//!
//! Global configuration lives at `~/.config/imagemill/config.toml`; a
//! project-local `imagemill.toml` takes precedence when present.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input locations and tool binary
    pub general: GeneralConfig,

    /// Image naming and Dockerfiles
    pub image: ImageConfig,

    /// Multi-architecture builder settings
    pub buildx: BuildxConfig,

    /// Registry login settings
    pub registry: RegistryConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Container build tool to invoke
    pub docker_binary: String,

    /// Version metadata table
    pub buildinfo: PathBuf,

    /// Directory copied into a fresh staging directory for every job
    pub context_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            docker_binary: "docker".to_string(),
            buildinfo: PathBuf::from("buildinfo.json"),
            context_dir: PathBuf::from("docker"),
        }
    }
}

/// Image naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Repository every tag is published under
    pub repository: String,

    /// Dockerfile for regular images, relative to the context
    pub dockerfile: String,

    /// Dockerfile for rootless images, relative to the context
    pub rootless_dockerfile: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            repository: "ronsonm/factorio".to_string(),
            dockerfile: "Dockerfile".to_string(),
            rootless_dockerfile: "Dockerfile.rootless".to_string(),
        }
    }
}

impl ImageConfig {
    /// Full image reference for a tag
    pub fn reference(&self, tag: &str) -> String {
        format!("{}:{}", self.repository, tag)
    }
}

/// buildx settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildxConfig {
    /// Builder names are `<prefix>-multiarch` and `<prefix>-rootless-multiarch`
    pub builder_prefix: String,

    /// Target platforms, passed verbatim in this order
    pub platforms: Vec<String>,
}

impl Default for BuildxConfig {
    fn default() -> Self {
        Self {
            builder_prefix: "ronsonm".to_string(),
            platforms: vec!["linux/arm64".to_string(), "linux/amd64".to_string()],
        }
    }
}

/// Registry credential sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Environment variable holding the registry username
    pub username_env: String,

    /// Environment variable holding the registry password or token
    pub password_env: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            username_env: "DOCKER_USERNAME".to_string(),
            password_env: "DOCKER_PASSWORD".to_string(),
        }
    }
}
