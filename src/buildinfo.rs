//! Version metadata table
//!
//! `buildinfo.json` maps each game version to the hash of its release archive
//! and the image tags it is published under:
//!
//! ```json
//! {
//!   "2.0.28": { "sha256": "…", "tags": ["latest", "2.0", "2.0.28"] },
//!   "1.1.110": { "sha256": "…", "tags": ["stable", "1.1", "1.1.110"] }
//! }
//! ```
//!
//! The whole table is validated on load so a malformed entry aborts the run
//! before any image is built.

use crate::error::{MillError, MillResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Tags that make a version eligible for rootless and stable-only builds
pub const STABLE_MARKERS: [&str; 2] = ["stable", "latest"];

/// Metadata for a single version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// SHA-256 of the release archive, passed to the Dockerfile
    pub sha256: String,
    /// Image tags, in publishing order
    pub tags: Vec<String>,
}

impl VersionEntry {
    /// Whether the tags include "stable" or "latest"
    pub fn is_stable_marked(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| STABLE_MARKERS.contains(&tag.as_str()))
    }
}

/// Entry as it appears on disk. Both fields are optional here so a missing
/// one can be reported against its version.
#[derive(Debug, Deserialize)]
struct RawEntry {
    sha256: Option<String>,
    tags: Option<Vec<String>>,
}

/// The validated version table, loaded once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    entries: BTreeMap<String, VersionEntry>,
}

impl BuildInfo {
    /// Load and validate a table from a JSON file
    pub async fn load(path: &Path) -> MillResult<Self> {
        if !path.exists() {
            return Err(MillError::BuildInfoNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            MillError::io(format!("reading build info from {}", path.display()), e)
        })?;

        let info = Self::from_json(&content, path)?;
        debug!("Loaded {} versions from {}", info.len(), path.display());
        Ok(info)
    }

    /// Parse and validate a table. `origin` is only used in error messages.
    pub fn from_json(content: &str, origin: &Path) -> MillResult<Self> {
        let invalid = |reason: String| MillError::BuildInfoInvalid {
            path: origin.to_path_buf(),
            reason,
        };

        let raw: BTreeMap<String, RawEntry> =
            serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (version, entry) in raw {
            let entry = validate_entry(&version, entry).map_err(invalid)?;
            entries.insert(version, entry);
        }

        Ok(Self { entries })
    }

    /// Build a table directly from validated entries
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, VersionEntry)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up a single version
    pub fn get(&self, version: &str) -> Option<&VersionEntry> {
        self.entries.get(version)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(version: &str, raw: RawEntry) -> Result<VersionEntry, String> {
    if version.trim().is_empty() {
        return Err("empty version identifier".to_string());
    }

    let sha256 = raw
        .sha256
        .ok_or_else(|| format!("version {version}: missing \"sha256\""))?;
    let tags = raw
        .tags
        .ok_or_else(|| format!("version {version}: missing \"tags\""))?;

    // Passed through to the Dockerfile as-is; only an empty value is useless
    if sha256.trim().is_empty() {
        return Err(format!("version {version}: empty \"sha256\""));
    }

    let mut seen = HashSet::new();
    for tag in &tags {
        if tag.trim().is_empty() {
            return Err(format!("version {version}: empty tag"));
        }
        if !seen.insert(tag.as_str()) {
            return Err(format!("version {version}: duplicate tag \"{tag}\""));
        }
    }

    Ok(VersionEntry { sha256, tags })
}
