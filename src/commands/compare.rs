use crate::TreesumContext;
use crate::compare::{ComparisonReport, compare};
use crate::locate::resolve_pair;
use crate::manifest::read_manifest;
use crate::output;
use crate::utils::display_absolute;
use anyhow::{Context, Result};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Separator between report sections.
const RULE: &str = "*******************************************************";

/// Execute the compare command.
///
/// Resolves both manifests, parses them completely, compares LEFT against
/// RIGHT and prints the report to stdout. Missing files are a result, not
/// a failure.
///
/// # Errors
///
/// Returns a classified [`crate::errors::TreesumError`] when a manifest
/// cannot be located, read or parsed.
pub fn execute(
    ctx: &TreesumContext,
    left: Option<&Path>,
    right: Option<&Path>,
    missing_only: bool,
) -> Result<()> {
    let (left, right) = resolve(ctx, left, right)?;

    let left_manifest = read_manifest(&left)?;
    let right_manifest = read_manifest(&right)?;
    let report = compare(&left_manifest.entries, &right_manifest.entries);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_header(&mut out, &left, &right)?;
    write_report(&mut out, &report, missing_only)?;
    out.flush().context("Failed to write report")?;

    let summary = report.summary;
    output::info(&format!(
        "{} of {} LEFT files found in RIGHT, {} missing, {} with several copies in RIGHT",
        summary.matched, summary.left_total, summary.missing, summary.duplicated
    ));
    Ok(())
}

/// Print which manifests are being compared.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_header<W: Write>(out: &mut W, left: &Path, right: &Path) -> io::Result<()> {
    writeln!(out, "  LEFT:  {}", display_absolute(left))?;
    writeln!(out, "  RIGHT: {}", display_absolute(right))
}

/// Render a comparison report.
///
/// The first section lists LEFT files missing on the right; unless
/// `missing_only` is set, the second lists every LEFT file with all of its
/// RIGHT counterparts.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &ComparisonReport<'_>,
    missing_only: bool,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "These {} files exist in LEFT, but were not found in RIGHT:",
        report.missing.len()
    )?;
    for entry in &report.missing {
        writeln!(
            out,
            "  {} {} {} {}",
            entry.path, entry.modified, entry.size, entry.hash
        )?;
    }
    writeln!(out, "{RULE}")?;

    if missing_only {
        return Ok(());
    }

    writeln!(out, "ALL files from LEFT:")?;
    for c in &report.correspondences {
        writeln!(out, "{}", c.left.hash)?;
        writeln!(out, "  {} (modified)", c.left.modified)?;
        writeln!(out, "  {} (size)", c.left.size)?;
        writeln!(out, "  (LEFT)  {}", c.left.path)?;
        for m in &c.matches {
            writeln!(out, "  (RIGHT) {}", m.path)?;
        }
        if !c.is_found() {
            writeln!(out, "  (RIGHT) NOT FOUND")?;
        }
    }
    Ok(())
}

/// Resolve the manifests `execute` would compare, without reading them.
///
/// # Errors
///
/// Same resolution errors as [`execute`].
pub fn resolve(
    ctx: &TreesumContext,
    left: Option<&Path>,
    right: Option<&Path>,
) -> Result<(PathBuf, PathBuf)> {
    let left = left.map(|p| ctx.resolve(p));
    let right = right.map(|p| ctx.resolve(p));
    let pair = resolve_pair(&ctx.cwd, left.as_deref(), right.as_deref())?;
    Ok((pair.left, pair.right))
}
