use std::fmt;
use std::path::PathBuf;

/// Which side of a comparison a manifest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The reference side; its entries are checked for presence on the right.
    Left,
    /// The side searched for matching content.
    Right,
}

impl Side {
    /// Upper-case label used in reports and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable process exit codes.
///
/// Tooling and tests assert on these values, so existing numbers must never
/// be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,
    /// Command name not recognized.
    UnknownCommand = 1,
    /// Bad flags or an unclassified failure.
    Usage = 2,
    /// A manifest line violates the grammar.
    MalformedManifest = 3,
    /// A new manifest could not be created or finalized.
    WriteFailure = 4,
    /// Only a LEFT manifest file was given.
    LeftFileOnly = 5,
    /// Fewer than two manifests found when both sides default.
    InsufficientManifests = 6,
    /// No manifest in the resolved LEFT directory.
    NoLeftManifest = 7,
    /// No manifest in the resolved RIGHT directory.
    NoRightManifest = 8,
    /// Strict mode aborted on an unreadable file.
    HashFailure = 9,
    /// A manifest file could not be read.
    ManifestUnreadable = 10,
}

impl ExitCode {
    /// Numeric value handed to `process::exit`.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Fatal, classified failures of the `list` and `compare` operations.
///
/// Raised through `anyhow` and recovered with `downcast_ref` at the top of
/// the binary to choose the exit code.
#[derive(Debug)]
pub enum TreesumError {
    /// A manifest line does not match the line grammar.
    ManifestParse {
        /// Manifest being parsed.
        path: PathBuf,
        /// One-based line number of the offending line.
        line_number: usize,
        /// Why the line was rejected.
        reason: String,
    },
    /// A manifest file exists but its bytes could not be read or decoded.
    ManifestUnreadable {
        /// Manifest being read.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
    /// A resolved directory holds no manifest.
    NoManifest {
        /// Side the directory was resolved for.
        side: Side,
        /// Directory that was searched.
        dir: PathBuf,
    },
    /// Both sides defaulted but the directory holds fewer than two manifests.
    InsufficientManifests {
        /// Directory that was searched.
        dir: PathBuf,
        /// Number of manifests found.
        found: usize,
    },
    /// A LEFT manifest file was given without any RIGHT side.
    LeftFileOnly {
        /// The LEFT file.
        path: PathBuf,
    },
    /// A new manifest could not be created or moved into place.
    ManifestWrite {
        /// Intended final manifest path.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
    /// Strict mode: a file under the root could not be hashed.
    HashFailure {
        /// File that failed.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
}

impl TreesumError {
    /// Exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::ManifestParse { .. } => ExitCode::MalformedManifest,
            Self::ManifestUnreadable { .. } => ExitCode::ManifestUnreadable,
            Self::NoManifest {
                side: Side::Left, ..
            } => ExitCode::NoLeftManifest,
            Self::NoManifest {
                side: Side::Right, ..
            } => ExitCode::NoRightManifest,
            Self::InsufficientManifests { .. } => ExitCode::InsufficientManifests,
            Self::LeftFileOnly { .. } => ExitCode::LeftFileOnly,
            Self::ManifestWrite { .. } => ExitCode::WriteFailure,
            Self::HashFailure { .. } => ExitCode::HashFailure,
        }
    }
}

impl fmt::Display for TreesumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestParse {
                path,
                line_number,
                reason,
            } => write!(
                f,
                "Parsing manifest {} failed at line {line_number}: {reason}",
                path.display()
            ),
            Self::ManifestUnreadable { path, reason } => {
                write!(f, "Cannot read manifest {}: {reason}", path.display())
            }
            Self::NoManifest { side, dir } => {
                write!(f, "No treesum file found for {side} in {}", dir.display())
            }
            Self::InsufficientManifests { dir, found } => write!(
                f,
                "At least 2 treesum files required in {}, found: {found}",
                dir.display()
            ),
            Self::LeftFileOnly { path } => write!(
                f,
                "Only one (LEFT) file given to compare: {}",
                path.display()
            ),
            Self::ManifestWrite { path, reason } => {
                write!(f, "Cannot write manifest {}: {reason}", path.display())
            }
            Self::HashFailure { path, reason } => {
                write!(f, "Cannot hash {} (strict mode): {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for TreesumError {}

/// Maps any error chain to its exit code.
///
/// Classified failures anywhere in the chain win; everything else is a
/// usage-level failure.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TreesumError>())
        .map_or(ExitCode::Usage, TreesumError::exit_code)
}
