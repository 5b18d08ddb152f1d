use super::line::parse_line;
use super::{Manifest, ManifestEntry};
use crate::errors::TreesumError;
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;
use tracing::{Level, debug, span};

/// Manifests at least this large are read through a memory map.
const MMAP_READ_THRESHOLD: u64 = 1_048_576;

/// Read and parse a manifest file.
///
/// Either every line parses and the full manifest is returned, or nothing
/// is: a single malformed line rejects the whole file.
///
/// # Errors
///
/// - [`TreesumError::ManifestUnreadable`] if the file cannot be opened or read
/// - [`TreesumError::ManifestParse`] on invalid UTF-8 or a grammar violation
pub fn read_manifest(path: &Path) -> Result<Manifest, TreesumError> {
    let _span = span!(Level::DEBUG, "read_manifest", path = %path.display()).entered();

    let unreadable = |e: std::io::Error| TreesumError::ManifestUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::open(path).map_err(unreadable)?;
    let len = file.metadata().map_err(unreadable)?.len();

    let entries = if len < MMAP_READ_THRESHOLD {
        let bytes = std::fs::read(path).map_err(unreadable)?;
        parse_manifest_bytes(&bytes, path)?
    } else {
        // SAFETY: manifests are never modified once finalized; the map is
        // read-only and dropped before returning.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(unreadable)?;
        parse_manifest_bytes(&mmap, path)?
    };

    debug!(entries = entries.len(), "Parsed manifest");
    Ok(Manifest {
        path: path.to_path_buf(),
        entries,
    })
}

/// Validate UTF-8 with SIMD, then parse.
fn parse_manifest_bytes(bytes: &[u8], source: &Path) -> Result<Vec<ManifestEntry>, TreesumError> {
    let content = simdutf8::compat::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        TreesumError::ManifestParse {
            path: source.to_path_buf(),
            line_number: valid.iter().filter(|b| **b == b'\n').count() + 1,
            reason: "invalid UTF-8".to_string(),
        }
    })?;
    parse_manifest_str(content, source)
}

/// Parse manifest text. `source` only labels errors.
///
/// Empty lines are ignored; every other line must match the grammar.
///
/// # Errors
///
/// Returns [`TreesumError::ManifestParse`] for the first offending line.
pub fn parse_manifest_str(content: &str, source: &Path) -> Result<Vec<ManifestEntry>, TreesumError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(index, line)| {
            parse_line(line).map_err(|e| TreesumError::ManifestParse {
                path: source.to_path_buf(),
                line_number: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
