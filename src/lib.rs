#![warn(missing_docs)]
#![allow(clippy::arithmetic_side_effects)] // Counters and byte totals cannot realistically overflow
#![allow(clippy::float_arithmetic)] // Required for size and progress formatting

//! # Treesum - Content-Addressed Tree Snapshots
//!
//! Treesum snapshots a directory tree into a flat text manifest keyed by the
//! SHA-256 of every file, and later compares two manifests to answer "did this
//! file survive, even if it moved or was renamed?" and "what disappeared?".
//!
//! ## Architecture
//!
//! - [`hash`]: content digest of a single file
//! - [`manifest`]: manifest data model, line grammar, parser and writer
//! - [`locate`]: picks the right manifest files for a compare
//! - [`compare`]: hash-based reconciliation of two manifests
//! - [`commands`]: `list` and `compare` command implementations
//! - [`config`]: TOML configuration
//! - [`errors`]: fatal errors and their process exit codes
//! - [`output`]: user-facing messages and progress display
//!
//! ## Example Usage
//!
//! ```no_run
//! use treesum::TreesumContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = TreesumContext::new(None)?;
//!
//! // Snapshot the current directory
//! treesum::commands::list::execute(&ctx, None)?;
//!
//! // Compare the two newest snapshots in the current directory
//! treesum::commands::compare::execute(&ctx, None, None, false)?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// `list` and `compare` command implementations.
pub mod commands;

/// Hash-based reconciliation of two manifests.
pub mod compare;

/// Configuration parsing and validation.
pub mod config;

/// Fatal error kinds and their exit codes.
pub mod errors;

/// Content hashing of individual files.
pub mod hash;

/// Manifest file selection.
pub mod locate;

/// Manifest data model, file format, parser and writer.
pub mod manifest;

/// Output formatting and progress display.
pub mod output;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Current version of the treesum binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Central context for all treesum operations.
///
/// Holds the working directory every relative argument is resolved against
/// and the effective configuration.
#[derive(Debug, Clone)]
pub struct TreesumContext {
    /// Directory that stands in for "the current directory".
    pub cwd: PathBuf,

    /// Effective configuration (file values with CLI overrides applied).
    pub config: config::Config,
}

impl TreesumContext {
    /// Creates a context rooted at the process working directory.
    ///
    /// # Errors
    /// Returns an error if the working directory cannot be determined or the
    /// configuration file cannot be loaded.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let config = match config_path {
            Some(path) => config::Config::load(path)?,
            None => config::Config::default(),
        };
        Ok(Self { cwd, config })
    }

    /// Creates a context with an explicit working directory and configuration.
    ///
    /// Used by tests so they never depend on the process working directory.
    #[must_use]
    pub const fn new_explicit(cwd: PathBuf, config: config::Config) -> Self {
        Self { cwd, config }
    }

    /// Resolves `path` against the context working directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
