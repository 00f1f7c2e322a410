//! Error types for imagemill
//!
//! All modules use `MillResult<T>` as their return type.

use crate::plan::ImageVariant;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for imagemill operations
pub type MillResult<T> = Result<T, MillError>;

/// All errors that can occur while planning or running a build
#[derive(Error, Debug)]
pub enum MillError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Build info file not found: {0}")]
    BuildInfoNotFound(PathBuf),

    #[error("Invalid build info at {path}: {reason}")]
    BuildInfoInvalid { path: PathBuf, reason: String },

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Registry username and password need to be given (missing {var})")]
    CredentialsMissing { var: String },

    // Registry errors
    #[error("Docker login failed: {0}")]
    LoginFailed(String),

    #[error("Docker push of {reference} failed: {reason}")]
    PushFailed { reference: String, reason: String },

    // Builder errors
    #[error("Creating builder {name} failed: {reason}")]
    BuilderCreate { name: String, reason: String },

    #[error("{} of {variant} image failed for version {version}:\n{reason}", build_action(.multiarch))]
    BuildFailed {
        variant: ImageVariant,
        version: String,
        multiarch: bool,
        reason: String,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

fn build_action(multiarch: &bool) -> &'static str {
    if *multiarch {
        "Build and push"
    } else {
        "Build"
    }
}

impl MillError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// The image variant whose build failed, if this is a build failure
    pub fn failed_variant(&self) -> Option<ImageVariant> {
        match self {
            Self::BuildFailed { variant, .. } => Some(*variant),
            _ => None,
        }
    }

    /// True for errors raised before any build could start
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. }
                | Self::BuildInfoNotFound(_)
                | Self::BuildInfoInvalid { .. }
                | Self::ContextNotFound(_)
                | Self::CredentialsMissing { .. }
                | Self::TomlParse(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CredentialsMissing { .. } => {
                Some("Export DOCKER_USERNAME and DOCKER_PASSWORD, or drop --push-tags")
            }
            Self::BuildInfoNotFound(_) => Some("Pass the version table with --buildinfo <path>"),
            Self::ContextNotFound(_) => Some("Pass the Dockerfile directory with --context <dir>"),
            Self::BuilderCreate { .. } => Some("Check that docker buildx is installed: docker buildx version"),
            Self::CommandFailed { .. } => Some("Is the docker CLI installed and on PATH?"),
            _ => None,
        }
    }
}
