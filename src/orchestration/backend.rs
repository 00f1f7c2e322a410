//! Build backend abstraction
//!
//! The runner only talks to the build tool through `BuildBackend`, so the
//! whole execution path can be exercised with an in-memory backend.

use crate::credentials::RegistryCredentials;
use crate::error::MillResult;
use crate::plan::ImageVariant;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything the build tool needs for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Staged build context; the tool runs with this as its working directory
    pub context: PathBuf,
    /// Dockerfile relative to the context
    pub dockerfile: String,
    /// `--build-arg` pairs in order
    pub build_args: Vec<(String, String)>,
    /// Full image references, one `-t` each
    pub references: Vec<String>,
    /// Which image type this is, for failure reporting
    pub variant: ImageVariant,
    /// Version being built, for failure reporting
    pub version: String,
    /// buildx builder used on the multi-architecture path
    pub builder: String,
    /// Target platforms on the multi-architecture path
    pub platforms: Vec<String>,
}

impl BuildRequest {
    /// Arguments shared by the single- and multi-architecture paths:
    /// `-f <dockerfile> --build-arg K=V ... . -t <ref> ...`
    pub fn job_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.dockerfile.clone()];

        for (key, value) in &self.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push(".".to_string());

        for reference in &self.references {
            args.push("-t".to_string());
            args.push(reference.clone());
        }

        args
    }

    /// Platforms joined the way buildx expects them
    pub fn platform_list(&self) -> String {
        self.platforms.join(",")
    }
}

/// Operations the runner needs from the container build tool
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Log in to the registry
    async fn login(&self, credentials: &RegistryCredentials) -> MillResult<()>;

    /// Create the named multi-architecture builder unless it already exists
    async fn ensure_builder(&self, name: &str, platforms: &[String]) -> MillResult<()>;

    /// Build one image, streaming tool output to `on_output`.
    ///
    /// `push` only applies on the multi-architecture path; single-architecture
    /// images are pushed afterwards with `push_image`.
    async fn build_image(
        &self,
        request: &BuildRequest,
        push: bool,
        multiarch: bool,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> MillResult<()>;

    /// Push a single image reference
    async fn push_image(&self, reference: &str) -> MillResult<()>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}
