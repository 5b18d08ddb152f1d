use crate::TreesumContext;
use crate::manifest::{ListSummary, ManifestWriter};
use crate::output;
use crate::utils::format_size;
use anyhow::{Context, Result};
use std::path::Path;

/// Execute the list command: snapshot `root` (default: the context working
/// directory) into a new manifest inside it.
///
/// Files that cannot be hashed are reported as warnings and left out of
/// the manifest; the command still succeeds unless strict mode is on.
///
/// # Errors
///
/// Returns an error if:
/// - The root is not a directory
/// - The manifest cannot be created or finalized
/// - Strict mode is on and a file cannot be hashed
pub fn execute(ctx: &TreesumContext, root: Option<&Path>) -> Result<ListSummary> {
    let root = root.map_or_else(|| ctx.cwd.clone(), |r| ctx.resolve(r));
    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("Cannot access {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    output::action("Scanning", &root.display().to_string());
    let summary = ManifestWriter::new(root, &ctx.config).write()?;

    for skipped in &summary.skipped {
        output::warning(&format!(
            "skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }

    output::success(&format!(
        "Wrote {} ({} files, {})",
        summary.manifest_path.display(),
        summary.recorded,
        format_size(summary.bytes)
    ));
    if !summary.is_complete() {
        output::warning(&format!(
            "{} files could not be recorded",
            summary.skipped.len()
        ));
    }

    Ok(summary)
}
