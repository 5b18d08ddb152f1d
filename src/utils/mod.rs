//! Utility functions and helpers.
//!
//! - [`thread_pool`]: bounded worker pool for parallel hashing
//! - [`format_size`]: human-readable byte counts for summaries
//!
//! # Examples
//!
//! ```
//! use treesum::utils::format_size;
//!
//! assert_eq!(format_size(1024 * 1024), "1.00 MB");
//! ```

/// Thread pool configuration for parallel operations
pub mod thread_pool;

use std::path::Path;

/// Formats a file size in bytes into a human-readable string with appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Absolute form of `path` for display, falling back to `path` itself when
/// it cannot be canonicalized.
#[must_use]
pub fn display_absolute(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
