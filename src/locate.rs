//! Manifest selection for `compare`.
//!
//! A side argument naming a directory resolves to the newest manifest in
//! that directory, judged by the timestamp embedded in the file name. Any
//! other argument is used as a manifest path as given. When no side is
//! given, the two newest manifests of the current directory are compared.

use crate::errors::{Side, TreesumError};
use crate::manifest::{
    Timestamp,
    naming::{MANIFEST_PREFIX, MANIFEST_SUFFIX},
    parse_manifest_file_name,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A manifest file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Location of the file.
    pub path: PathBuf,
    /// Creation time embedded in its name.
    pub created: Timestamp,
}

/// The two manifests a comparison reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPair {
    /// Manifest whose entries are looked up.
    pub left: PathBuf,
    /// Manifest searched for matching content.
    pub right: PathBuf,
}

/// List the manifests directly inside `dir`, newest first.
///
/// Only regular files whose name follows the convention exactly count.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed.
pub fn find_manifests(dir: &Path) -> Result<Vec<ManifestFile>> {
    let pattern = format!(
        "{}/{MANIFEST_PREFIX}*{MANIFEST_SUFFIX}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let candidates =
        glob::glob(&pattern).with_context(|| format!("Invalid search path: {}", dir.display()))?;

    let candidates: Vec<PathBuf> = candidates
        .collect::<Result<_, _>>()
        .with_context(|| format!("Cannot list manifests in {}", dir.display()))?;

    let mut manifests: Vec<ManifestFile> = candidates
        .into_iter()
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let created = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_manifest_file_name)?;
            Some(ManifestFile { path, created })
        })
        .collect();

    manifests.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
    debug!(dir = %dir.display(), found = manifests.len(), "Listed manifests");
    Ok(manifests)
}

/// Newest manifest in `dir`, resolved for `side`.
///
/// # Errors
///
/// Returns [`TreesumError::NoManifest`] if `dir` holds none.
pub fn newest_manifest(dir: &Path, side: Side) -> Result<PathBuf> {
    find_manifests(dir)?
        .into_iter()
        .next()
        .map(|m| m.path)
        .ok_or_else(|| {
            TreesumError::NoManifest {
                side,
                dir: dir.to_path_buf(),
            }
            .into()
        })
}

/// Two newest manifests in `dir` as (newest, second newest).
///
/// # Errors
///
/// Returns [`TreesumError::InsufficientManifests`] if fewer than two exist.
pub fn two_newest_manifests(dir: &Path) -> Result<ManifestPair> {
    let manifests = find_manifests(dir)?;
    match manifests.as_slice() {
        [newest, second, ..] => Ok(ManifestPair {
            left: newest.path.clone(),
            right: second.path.clone(),
        }),
        _ => Err(TreesumError::InsufficientManifests {
            dir: dir.to_path_buf(),
            found: manifests.len(),
        }
        .into()),
    }
}

/// Resolve one explicit side argument: a directory yields its newest
/// manifest, anything else is taken as the manifest path itself.
///
/// # Errors
///
/// Returns [`TreesumError::NoManifest`] for a directory without manifests.
pub fn resolve_side(arg: &Path, side: Side) -> Result<PathBuf> {
    if arg.is_dir() {
        newest_manifest(arg, side)
    } else {
        Ok(arg.to_path_buf())
    }
}

/// Resolve the LEFT and RIGHT arguments of a comparison.
///
/// Relative arguments must already be resolved against `cwd` by the caller.
///
/// | LEFT      | RIGHT   | result                                       |
/// |-----------|---------|----------------------------------------------|
/// | absent    | absent  | two newest in `cwd`                          |
/// | directory | absent  | two newest in LEFT                           |
/// | file      | absent  | error: only one file given                   |
/// | absent    | present | newest in `cwd` vs. RIGHT resolved           |
/// | present   | present | each side resolved independently             |
///
/// # Errors
///
/// Returns the [`TreesumError`] naming the side and directory that failed.
pub fn resolve_pair(cwd: &Path, left: Option<&Path>, right: Option<&Path>) -> Result<ManifestPair> {
    let pair = match (left, right) {
        (None, None) => two_newest_manifests(cwd)?,
        (Some(left), None) if left.is_dir() => two_newest_manifests(left)?,
        (Some(left), None) => {
            return Err(TreesumError::LeftFileOnly {
                path: left.to_path_buf(),
            }
            .into());
        }
        (left, Some(right)) => ManifestPair {
            left: resolve_side(left.unwrap_or(cwd), Side::Left)?,
            right: resolve_side(right, Side::Right)?,
        },
    };

    debug!(left = %pair.left.display(), right = %pair.right.display(), "Resolved manifests");
    Ok(pair)
}
