//! Per-job build context staging
//!
//! Each job builds from its own temporary copy of the context directory,
//! removed when the job finishes.

use crate::error::{MillError, MillResult};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

/// Temporary copy of a build context
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Copy `source` recursively into a new temporary directory
    ///
    /// The copy runs on the blocking pool.
    pub async fn create(source: &Path) -> MillResult<Self> {
        if !source.is_dir() {
            return Err(MillError::ContextNotFound(source.to_path_buf()));
        }

        let source = source.to_path_buf();
        tokio::task::spawn_blocking(move || Self::create_blocking(&source))
            .await
            .map_err(|e| MillError::io("staging build context", std::io::Error::other(e)))?
    }

    fn create_blocking(source: &Path) -> MillResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("imagemill-")
            .tempdir()
            .map_err(|e| MillError::io("creating staging directory", e))?;

        copy_tree(source, dir.path())?;
        debug!("Staged {} into {}", source.display(), dir.path().display());

        Ok(Self { dir })
    }

    /// Path of the staged context
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn copy_tree(source: &Path, target: &Path) -> MillResult<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            MillError::io(format!("walking {}", path), e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| entry.path());
        if relative.as_os_str().is_empty() {
            continue;
        }
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(|e| {
                MillError::io(format!("creating {}", destination.display()), e)
            })?;
        } else {
            fs::copy(entry.path(), &destination).map_err(|e| {
                MillError::io(format!("copying {}", entry.path().display()), e)
            })?;
        }
    }
    Ok(())
}
