#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treesum::hash::hash_bytes;

/// Scratch directory tree plus helpers to run the binary inside it.
pub struct TestTree {
    pub temp_dir: TempDir,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// `treesum` with the tree root as working directory.
    pub fn treesum(&self) -> Result<Command> {
        self.treesum_in(self.path())
    }

    pub fn treesum_in(&self, dir: &Path) -> Result<Command> {
        let mut cmd = Command::cargo_bin("treesum")?;
        cmd.current_dir(dir);
        Ok(cmd)
    }

    /// Every manifest file directly in `dir`, sorted by name.
    pub fn manifests_in(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(treesum::manifest::is_manifest_file_name)
            })
            .collect();
        found.sort();
        Ok(found)
    }

    /// Run `list` and move the manifest it wrote to `treesum_<stamp>.txt`,
    /// so repeated snapshots in one test never collide on the clock.
    pub fn snapshot_as(&self, stamp: &str) -> Result<PathBuf> {
        let before = Self::manifests_in(self.path())?;
        self.treesum()?.arg("list").assert().success();
        let fresh = Self::manifests_in(self.path())?
            .into_iter()
            .find(|p| !before.contains(p))
            .ok_or_else(|| anyhow::anyhow!("list wrote no manifest"))?;
        let target = self.path().join(format!("treesum_{stamp}.txt"));
        fs::rename(&fresh, &target)?;
        Ok(target)
    }
}

/// One manifest line for `content` stored at `path`.
pub fn line_for(content: &str, path: &str) -> String {
    format!(
        "{} 2024-01-01-000000 {} {}",
        hash_bytes(content.as_bytes()),
        content.len(),
        path
    )
}

/// Write a manifest named for `stamp` into `dir` with the given lines.
pub fn write_manifest(dir: &Path, stamp: &str, lines: &[String]) -> Result<PathBuf> {
    let path = dir.join(format!("treesum_{stamp}.txt"));
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(&path, body)?;
    Ok(path)
}
