//! Command-line interface definitions for treesum.
//!
//! Shared between the main binary and xtask (man page generation).
//!
//! Field-level documentation is provided via clap attributes, so missing_docs
//! is allowed for this module to avoid redundant documentation.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::ffi::OsString;
use std::path::PathBuf;

/// Main CLI structure for treesum.
#[derive(Parser, Debug)]
#[command(
    name = "treesum",
    version = crate::VERSION,
    about = "Hash based, recursive directory comparison",
    long_about = "Answers the question: which files in LEFT are (based on hash) also present in \
                  RIGHT, even if moved or renamed?\n\n  \
                  list:    snapshot every file under a directory into a treesum manifest\n  \
                  compare: compare two manifests by content hash"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Read settings from this TOML file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// All available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a treesum manifest of all files under a directory, recursively
    List {
        /// Directory to snapshot; the manifest is written into it (default: current directory)
        root: Option<PathBuf>,

        /// Abort on the first file that cannot be hashed
        #[arg(long)]
        strict: bool,

        /// Number of hashing workers
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// Follow symbolic links while walking
        #[arg(short = 'L', long)]
        follow_symlinks: bool,

        /// Do not show the progress line
        #[arg(long)]
        no_progress: bool,
    },

    /// Compare two treesum manifests by content hash
    Compare {
        /// Left side: manifest file, or directory whose newest manifest is used (default: current directory)
        #[arg(short, long, value_name = "PATH")]
        left: Option<PathBuf>,

        /// Right side: manifest file, or directory whose newest manifest is used
        #[arg(short, long, value_name = "PATH")]
        right: Option<PathBuf>,

        /// Only print the files missing on the right
        #[arg(short, long)]
        missing_only: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Rewrite the single-dash long options `-left` and `-right` (with or
/// without `=VALUE`) to their `--` forms so older invocations keep working.
pub fn normalize_legacy_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            for name in ["left", "right"] {
                if let Some(rest) = text.strip_prefix('-').and_then(|t| t.strip_prefix(name))
                    && (rest.is_empty() || rest.starts_with('='))
                {
                    return OsString::from(format!("--{name}{rest}"));
                }
            }
            arg
        })
        .collect()
}
