//! imagemill - container image matrix builder
//!
//! Reads a version table, decides which regular and rootless images to
//! build, and drives docker / docker buildx to build and publish them.

pub mod buildinfo;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod orchestration;
pub mod plan;
pub mod ui;

pub use error::{MillError, MillResult};
