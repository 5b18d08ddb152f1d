//! Tree walk and manifest creation.
//!
//! The walk collects every regular file under the root (hidden ones
//! included, prior manifests excluded), hashes them on a bounded worker
//! pool and writes one line per file to a hidden temporary file in the root.
//! Only after every line is written and synced is the temporary file moved
//! to its final `treesum_<timestamp>.txt` name, without ever replacing an
//! existing file. An interrupted run therefore leaves no manifest behind.
//!
//! A tree that changes while it is being walked yields a manifest that
//! mixes states from before and after the change; snapshots are not
//! transactional.

use super::line::{format_line, is_representable};
use super::naming::{
    PARTIAL_PREFIX, PARTIAL_SUFFIX, is_manifest_file_name, is_partial_manifest_name,
    manifest_file_name,
};
use super::{ManifestEntry, Timestamp};
use crate::config::Config;
use crate::errors::TreesumError;
use crate::hash::hash_file;
use crate::output::{self, Progress};
use crate::utils::thread_pool::build_pool;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, span, warn};
use walkdir::WalkDir;

/// A file left out of a manifest, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path that could not be recorded.
    pub path: PathBuf,
    /// Human-readable diagnostic.
    pub reason: String,
}

/// Outcome of one `list` run.
#[derive(Debug, Clone)]
pub struct ListSummary {
    /// Final path of the new manifest.
    pub manifest_path: PathBuf,
    /// Files written to the manifest.
    pub recorded: usize,
    /// Sum of the sizes of all recorded files.
    pub bytes: u64,
    /// Files and directories that could not be recorded, in walk order.
    pub skipped: Vec<SkippedFile>,
}

impl ListSummary {
    /// Whether every file found by the walk made it into the manifest.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Creates manifests for one root directory.
pub struct ManifestWriter<'a> {
    /// Directory to snapshot; the manifest is created inside it.
    root: PathBuf,
    /// Scan, hash and output settings.
    config: &'a Config,
}

impl<'a> ManifestWriter<'a> {
    /// Create a writer for `root`.
    #[must_use]
    pub const fn new(root: PathBuf, config: &'a Config) -> Self {
        Self { root, config }
    }

    /// Snapshot the tree into a manifest stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`ManifestWriter::write_at`].
    pub fn write(&self) -> Result<ListSummary> {
        self.write_at(Timestamp::now())
    }

    /// Snapshot the tree into a manifest stamped `created`.
    ///
    /// Unreadable files are reported in [`ListSummary::skipped`] and the run
    /// still succeeds, unless `scan.strict` is set.
    ///
    /// # Errors
    ///
    /// - [`TreesumError::ManifestWrite`] if a manifest with the same name
    ///   already exists or the file cannot be created or finalized
    /// - [`TreesumError::HashFailure`] in strict mode, as soon as any file
    ///   or directory cannot be read
    pub fn write_at(&self, created: Timestamp) -> Result<ListSummary> {
        let _span = span!(Level::INFO, "list", root = %self.root.display()).entered();

        let final_path = self.root.join(manifest_file_name(&created));
        if final_path.exists() {
            return Err(TreesumError::ManifestWrite {
                path: final_path,
                reason: "a manifest with this timestamp already exists".to_string(),
            }
            .into());
        }

        let (files, mut skipped) = self.collect_files();
        if self.config.scan.strict
            && let Some(first) = skipped.first()
        {
            return Err(TreesumError::HashFailure {
                path: first.path.clone(),
                reason: first.reason.clone(),
            }
            .into());
        }
        debug!(files = files.len(), walk_errors = skipped.len(), "Walk finished");

        let progress = output::start_progress(
            "Hashing files",
            files.len(),
            self.config.output.progress,
        );
        let entries = self.snapshot_all(&files, &progress, &mut skipped)?;
        progress.finish();

        let bytes = entries.iter().map(|e| e.size).sum();
        write_manifest_file(&final_path, &entries)?;

        Ok(ListSummary {
            manifest_path: final_path,
            recorded: entries.len(),
            bytes,
            skipped,
        })
    }

    /// Walk the root and return every regular file to hash, plus the entries
    /// the walk itself could not read.
    ///
    /// Directory entries are visited in file name order so repeated runs over
    /// an unchanged tree produce identical manifests.
    #[must_use]
    pub fn collect_files(&self) -> (Vec<PathBuf>, Vec<SkippedFile>) {
        let _span = span!(Level::DEBUG, "walk").entered();
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(self.config.scan.follow_symlinks)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_str();
                    if name.is_some_and(is_manifest_file_name) {
                        debug!(path = %entry.path().display(), "Skipping prior manifest");
                        continue;
                    }
                    if name.is_some_and(is_partial_manifest_name) {
                        warn!(path = %entry.path().display(), "Skipping leftover partial manifest");
                        continue;
                    }
                    files.push(entry.into_path());
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    warn!(path = %path.display(), error = %err, "Cannot walk entry");
                    skipped.push(SkippedFile {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        (files, skipped)
    }

    /// Hash `files` on the worker pool, preserving walk order.
    fn snapshot_all(
        &self,
        files: &[PathBuf],
        progress: &Progress,
        skipped: &mut Vec<SkippedFile>,
    ) -> Result<Vec<ManifestEntry>> {
        let _span = span!(Level::DEBUG, "hash", files = files.len()).entered();
        let pool = build_pool(self.config.scan.threads)?;
        let mmap_threshold = self.config.hash.mmap_threshold;

        let snapshot = |path: &PathBuf| {
            let result = snapshot_file(path, mmap_threshold).map_err(|e| SkippedFile {
                path: path.clone(),
                reason: format!("{e:#}"),
            });
            progress.tick();
            result
        };

        if self.config.scan.strict {
            return pool
                .install(|| {
                    files
                        .par_iter()
                        .map(snapshot)
                        .collect::<Result<Vec<_>, SkippedFile>>()
                })
                .map_err(|s| {
                    TreesumError::HashFailure {
                        path: s.path,
                        reason: s.reason,
                    }
                    .into()
                });
        }

        let results: Vec<Result<ManifestEntry, SkippedFile>> =
            pool.install(|| files.par_iter().map(snapshot).collect());

        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(entry) => entries.push(entry),
                Err(skip) => {
                    warn!(path = %skip.path.display(), reason = %skip.reason, "Skipping file");
                    skipped.push(skip);
                }
            }
        }
        Ok(entries)
    }
}

/// Build the manifest record for one file.
///
/// # Errors
///
/// Returns an error if the path cannot be stored in a manifest line, or the
/// file's metadata or content cannot be read.
pub fn snapshot_file(path: &Path, mmap_threshold: u64) -> Result<ManifestEntry> {
    let text = path
        .to_str()
        .context("path is not valid UTF-8 and cannot be recorded")?;
    if !is_representable(text) {
        anyhow::bail!("path contains a line break and cannot be recorded");
    }

    let metadata =
        std::fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("No modification time for {}", path.display()))?;
    let modified = Timestamp::try_from_system_time(modified).with_context(|| {
        format!(
            "modification time of {} is outside years 0000-9999 and cannot be recorded",
            path.display()
        )
    })?;
    let hash = hash_file(path, mmap_threshold)?;

    Ok(ManifestEntry {
        hash: hash.parse()?,
        modified,
        size: metadata.len(),
        path: text.to_string(),
    })
}

/// Write `entries` to a temporary file beside `final_path`, then move it into
/// place without replacing anything already there.
fn write_manifest_file(final_path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let write_error = |reason: String| TreesumError::ManifestWrite {
        path: final_path.to_path_buf(),
        reason,
    };
    let dir = final_path
        .parent()
        .ok_or_else(|| write_error("manifest path has no parent directory".to_string()))?;

    let mut temp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| write_error(e.to_string()))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        for entry in entries {
            writeln!(writer, "{}", format_line(entry)).map_err(|e| write_error(e.to_string()))?;
        }
        writer.flush().map_err(|e| write_error(e.to_string()))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;

    temp.persist_noclobber(final_path)
        .map_err(|e| write_error(e.error.to_string()))?;
    debug!(path = %final_path.display(), entries = entries.len(), "Manifest finalized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use crate::manifest::read_manifest;
    use filetime::{FileTime, set_file_mtime};
    use std::fs;
    use tempfile::tempdir;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.output.progress = false;
        config.scan.threads = 2;
        config
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_write_records_every_file() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("a/b"))?;
        fs::write(dir.path().join("top.txt"), "top")?;
        fs::write(dir.path().join("a/b/deep file.txt"), "deep")?;
        fs::write(dir.path().join(".hidden"), "hidden")?;
        fs::create_dir_all(dir.path().join(".config"))?;
        fs::write(dir.path().join(".config/rc"), "rc")?;

        let config = quiet_config();
        let writer = ManifestWriter::new(dir.path().to_path_buf(), &config);
        let summary = writer.write_at(ts("2024-01-01-000000"))?;

        assert_eq!(summary.recorded, 4);
        assert!(summary.is_complete());
        assert_eq!(summary.bytes, 3 + 4 + 6 + 2);
        assert_eq!(
            summary.manifest_path,
            dir.path().join("treesum_2024-01-01-000000.txt")
        );

        let manifest = read_manifest(&summary.manifest_path)?;
        let paths: Vec<&str> = manifest.entries.iter().map(|e| e.file_name()).collect();
        assert!(paths.contains(&".hidden"));
        assert!(paths.contains(&"rc"));
        assert!(paths.contains(&"deep file.txt"));
        Ok(())
    }

    #[test]
    fn test_entry_fields() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("photo.jpg");
        fs::write(&file, "pixels")?;
        set_file_mtime(&file, FileTime::from_unix_time(1_704_067_200, 0))?;

        let entry = snapshot_file(&file, 4096)?;
        assert_eq!(entry.hash.as_str(), hash_bytes(b"pixels"));
        assert_eq!(entry.modified.to_string(), "2024-01-01-000000");
        assert_eq!(entry.size, 6);
        assert_eq!(entry.path, file.to_str().unwrap());
        Ok(())
    }

    #[test]
    fn test_prior_manifests_are_excluded() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("data.bin"), "data")?;
        fs::create_dir_all(dir.path().join("sub"))?;
        fs::write(dir.path().join("sub/treesum_2020-01-01-000000.txt"), "")?;
        fs::write(dir.path().join("treesum_notes.txt"), "not a manifest")?;

        let config = quiet_config();
        let writer = ManifestWriter::new(dir.path().to_path_buf(), &config);
        writer.write_at(ts("2024-01-01-000000"))?;
        let summary = writer.write_at(ts("2024-01-01-000001"))?;

        let manifest = read_manifest(&summary.manifest_path)?;
        let names: Vec<&str> = manifest.entries.iter().map(|e| e.file_name()).collect();
        assert_eq!(names, vec!["data.bin", "treesum_notes.txt"]);
        Ok(())
    }

    #[test]
    fn test_collision_fails_without_overwriting() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "a")?;
        let existing = dir.path().join("treesum_2024-01-01-000000.txt");
        fs::write(&existing, "keep me")?;

        let config = quiet_config();
        let writer = ManifestWriter::new(dir.path().to_path_buf(), &config);
        let err = writer.write_at(ts("2024-01-01-000000")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TreesumError>(),
            Some(TreesumError::ManifestWrite { .. })
        ));
        assert_eq!(fs::read_to_string(&existing)?, "keep me");
        Ok(())
    }

    #[test]
    fn test_no_temporary_files_left_behind() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "a")?;

        let config = quiet_config();
        ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;

        let leftovers: Vec<_> = fs::read_dir(dir.path())?
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_tree_writes_empty_manifest() -> Result<()> {
        let dir = tempdir()?;
        let config = quiet_config();
        let summary = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;
        assert_eq!(summary.recorded, 0);
        assert_eq!(fs::read_to_string(&summary.manifest_path)?, "");
        Ok(())
    }

    #[test]
    fn test_walk_order_is_deterministic() -> Result<()> {
        let dir = tempdir()?;
        for name in ["c.txt", "a.txt", "b.txt"] {
            fs::write(dir.path().join(name), name)?;
        }

        let config = quiet_config();
        let writer = ManifestWriter::new(dir.path().to_path_buf(), &config);
        let (files, skipped) = writer.collect_files();
        assert!(skipped.is_empty());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("real.txt"), "real")?;
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))?;

        let mut config = quiet_config();
        let (files, _) = ManifestWriter::new(dir.path().to_path_buf(), &config).collect_files();
        assert_eq!(files.len(), 1);

        config.scan.follow_symlinks = true;
        let (files, _) = ManifestWriter::new(dir.path().to_path_buf(), &config).collect_files();
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unrepresentable_path_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("fine.txt"), "fine")?;
        fs::write(dir.path().join("bad\nname.txt"), "bad")?;

        let config = quiet_config();
        let summary = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("line break"));
        // The manifest must still parse cleanly.
        assert_eq!(read_manifest(&summary.manifest_path)?.len(), 1);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_strict_mode_aborts_on_unrecordable_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("bad\nname.txt"), "bad")?;

        let mut config = quiet_config();
        config.scan.strict = true;
        let err = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TreesumError>(),
            Some(TreesumError::HashFailure { .. })
        ));
        assert!(!dir.path().join("treesum_2024-01-01-000000.txt").exists());
        Ok(())
    }

    /// Set `file`'s mtime, reporting whether the filesystem stored it as given.
    fn pin_mtime(file: &Path, unix_secs: i64) -> Result<bool> {
        let wanted = FileTime::from_unix_time(unix_secs, 0);
        set_file_mtime(file, wanted)?;
        Ok(FileTime::from_last_modification_time(&fs::metadata(file)?) == wanted)
    }

    #[test]
    fn test_boundary_mtimes_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let cases = [
            ("epoch.txt", 0, "1970-01-01-000000"),
            ("before-epoch.txt", -86_400, "1969-12-31-000000"),
            ("last-second.txt", 253_402_300_799, "9999-12-31-235959"),
        ];
        let mut exact = Vec::new();
        for (name, secs, expected) in cases {
            let file = dir.path().join(name);
            fs::write(&file, name)?;
            if pin_mtime(&file, secs)? {
                exact.push((name, expected));
            }
        }

        let config = quiet_config();
        let summary = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;
        assert_eq!(summary.recorded, 3);

        let manifest = read_manifest(&summary.manifest_path)?;
        for entry in &manifest.entries {
            let on_disk = fs::metadata(entry.path())?.modified()?;
            assert_eq!(Timestamp::try_from_system_time(on_disk), Some(entry.modified));
        }
        for (name, expected) in exact {
            let entry = manifest
                .entries
                .iter()
                .find(|e| e.file_name() == name)
                .unwrap();
            assert_eq!(entry.modified.to_string(), expected);
        }
        Ok(())
    }

    #[test]
    fn test_mtime_past_year_9999_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("normal.txt"), "normal")?;
        let future = dir.path().join("future.txt");
        fs::write(&future, "future")?;
        if !pin_mtime(&future, 253_402_300_800)? {
            // Filesystem clamps timestamps; nothing out of range to record.
            return Ok(());
        }

        let config = quiet_config();
        let summary = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].path, future);
        assert!(summary.skipped[0].reason.contains("0000-9999"));
        assert_eq!(read_manifest(&summary.manifest_path)?.len(), 1);

        let mut strict = quiet_config();
        strict.scan.strict = true;
        let err = ManifestWriter::new(dir.path().to_path_buf(), &strict)
            .write_at(ts("2024-01-01-000001"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TreesumError>(),
            Some(TreesumError::HashFailure { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_leftover_partial_manifest_is_not_recorded() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("data.bin"), "data")?;
        fs::write(dir.path().join(".treesum_k3Jd9a.partial"), "interrupted")?;
        fs::write(dir.path().join(".treesum_notes"), "kept")?;

        let config = quiet_config();
        let summary = ManifestWriter::new(dir.path().to_path_buf(), &config)
            .write_at(ts("2024-01-01-000000"))?;

        let manifest = read_manifest(&summary.manifest_path)?;
        let names: Vec<&str> = manifest.entries.iter().map(|e| e.file_name()).collect();
        assert_eq!(names, vec![".treesum_notes", "data.bin"]);
        Ok(())
    }
}
