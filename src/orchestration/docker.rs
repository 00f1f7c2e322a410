//! Docker CLI backend
//!
//! Single-architecture images go through `docker build`; multi-architecture
//! images through `docker buildx build` on a named builder.

use crate::credentials::RegistryCredentials;
use crate::error::{MillError, MillResult};
use crate::orchestration::backend::{BuildBackend, BuildRequest};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Backend driving the `docker` executable
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Create a backend that runs `binary` (normally `docker`)
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Execute a command and capture its output
    async fn exec(&self, args: &[String]) -> MillResult<std::process::Output> {
        debug!("Executing: {}", self.describe(args));

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MillError::command_failed(self.describe(args), e))
    }

    async fn builder_exists(&self, name: &str) -> bool {
        Command::new(&self.binary)
            .args(["buildx", "inspect", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// Full argument list for a build invocation
pub(crate) fn build_command_args(request: &BuildRequest, push: bool, multiarch: bool) -> Vec<String> {
    let mut args = if multiarch {
        vec![
            "buildx".to_string(),
            "build".to_string(),
            "--platform".to_string(),
            request.platform_list(),
            "--builder".to_string(),
            request.builder.clone(),
        ]
    } else {
        vec!["build".to_string()]
    };

    args.extend(request.job_args());

    if multiarch && push {
        args.push("--push".to_string());
    }

    args
}

fn stderr_text(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl BuildBackend for DockerCli {
    async fn login(&self, credentials: &RegistryCredentials) -> MillResult<()> {
        info!("Logging in as {}", credentials.username);

        let args = [
            "login".to_string(),
            "-u".to_string(),
            credentials.username.clone(),
            "--password-stdin".to_string(),
        ];

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MillError::command_failed(self.describe(&args), e))?;

        // A login that exits early closes stdin; its status and stderr decide
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(credentials.password.as_bytes()).await {
                debug!("docker login stopped reading the password: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| MillError::command_failed(self.describe(&args), e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MillError::LoginFailed(stderr_text(&output)))
        }
    }

    async fn ensure_builder(&self, name: &str, platforms: &[String]) -> MillResult<()> {
        if self.builder_exists(name).await {
            debug!("Builder {} already exists", name);
            return Ok(());
        }

        info!("Creating builder {}", name);
        let args = vec![
            "buildx".to_string(),
            "create".to_string(),
            "--platform".to_string(),
            platforms.join(","),
            "--name".to_string(),
            name.to_string(),
        ];
        let output = self.exec(&args).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MillError::BuilderCreate {
                name: name.to_string(),
                reason: stderr_text(&output),
            })
        }
    }

    async fn build_image(
        &self,
        request: &BuildRequest,
        push: bool,
        multiarch: bool,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> MillResult<()> {
        let args = build_command_args(request, push, multiarch);
        debug!("Building in {}: {}", request.context.display(), self.describe(&args));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .current_dir(&request.context)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MillError::command_failed(self.describe(&args), e))?;

        let all_output = super::stream_child_output(&mut child, on_output).await;

        let status = child
            .wait()
            .await
            .map_err(|e| MillError::command_failed(self.describe(&args), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(MillError::BuildFailed {
                variant: request.variant,
                version: request.version.clone(),
                multiarch,
                reason: super::build_error_output(&all_output),
            })
        }
    }

    async fn push_image(&self, reference: &str) -> MillResult<()> {
        info!("Pushing {}", reference);

        let output = self
            .exec(&["push".to_string(), reference.to_string()])
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MillError::PushFailed {
                reference: reference.to_string(),
                reason: stderr_text(&output),
            })
        }
    }

    fn backend_name(&self) -> &'static str {
        "docker"
    }
}
