use super::{ContentHash, ManifestEntry, Timestamp};
use std::fmt;

/// Why a manifest line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Fewer than four space-separated fields.
    MissingFields(usize),
    /// Hash field has the wrong number of characters.
    HashLength(usize),
    /// Hash field contains a character outside `0-9A-F`.
    HashCharacter(char),
    /// Timestamp is not shaped `YYYY-MM-DD-HHMMSS`.
    TimestampShape(String),
    /// Timestamp is shaped correctly but names no real instant.
    TimestampValue(String),
    /// Size field is not a plain decimal integer.
    Size(String),
    /// Path field is empty.
    EmptyPath,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(found) => {
                write!(f, "expected 4 space-separated fields, found {found}")
            }
            Self::HashLength(len) => write!(
                f,
                "hash must be {} hex characters, found {len}",
                crate::hash::HASH_HEX_LEN
            ),
            Self::HashCharacter(c) => write!(f, "hash contains invalid character {c:?}"),
            Self::TimestampShape(s) => write!(f, "timestamp {s:?} is not YYYY-MM-DD-HHMMSS"),
            Self::TimestampValue(s) => write!(f, "timestamp {s:?} is not a valid date and time"),
            Self::Size(s) => write!(f, "size {s:?} is not a decimal integer"),
            Self::EmptyPath => f.write_str("path is empty"),
        }
    }
}

impl std::error::Error for LineError {}

/// Render an entry as one manifest line, without the trailing newline.
#[must_use]
pub fn format_line(entry: &ManifestEntry) -> String {
    format!(
        "{} {} {} {}",
        entry.hash, entry.modified, entry.size, entry.path
    )
}

/// Parse one manifest line.
///
/// The first three fields are split on single spaces; everything after the
/// third separator is the path, spaces included.
///
/// # Errors
///
/// Returns the first grammar violation found, checking fields left to right.
pub fn parse_line(line: &str) -> Result<ManifestEntry, LineError> {
    let fields: Vec<&str> = line.splitn(4, ' ').collect();
    let &[hash, modified, size, path] = fields.as_slice() else {
        return Err(LineError::MissingFields(fields.len()));
    };

    let hash: ContentHash = hash.parse()?;
    let modified: Timestamp = modified.parse()?;

    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineError::Size(size.to_string()));
    }
    let size: u64 = size
        .parse()
        .map_err(|_| LineError::Size(size.to_string()))?;

    if path.is_empty() {
        return Err(LineError::EmptyPath);
    }

    Ok(ManifestEntry {
        hash,
        modified,
        size,
        path: path.to_string(),
    })
}

/// Whether `path` can be stored in a manifest line and read back unchanged.
#[must_use]
pub fn is_representable(path: &str) -> bool {
    !path.is_empty() && !path.contains(['\n', '\r'])
}
