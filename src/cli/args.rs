//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// imagemill - build and publish container image matrices
///
/// Builds every version listed in the build info table as a regular and/or
/// rootless image, for the host architecture or for all configured
/// platforms, and optionally pushes the results.
#[derive(Parser, Debug)]
#[command(name = "imagemill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Push images to the registry
    #[arg(long)]
    pub push_tags: bool,

    /// Build multi-architecture images
    #[arg(long)]
    pub multiarch: bool,

    /// Build only rootless images
    #[arg(long)]
    pub rootless: bool,

    /// Build both regular and rootless images
    #[arg(long)]
    pub both: bool,

    /// Build only stable and latest versions
    #[arg(long)]
    pub only_stable_latest: bool,

    /// Version table (defaults to general.buildinfo from the config)
    #[arg(long, value_name = "PATH")]
    pub buildinfo: Option<PathBuf>,

    /// Build context directory (defaults to general.context_dir from the config)
    #[arg(long, value_name = "DIR")]
    pub context: Option<PathBuf>,

    /// Print the build plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "IMAGEMILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local imagemill.toml discovery
    #[arg(long)]
    pub no_local: bool,
}
