use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Effective treesum configuration.
///
/// Only ever read from an explicit `--config` file; there is no implicit
/// lookup location.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Tree walk settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Hasher settings.
    #[serde(default)]
    pub hash: HashConfig,

    /// Terminal output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tree walk settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// Follow symbolic links while walking. When false, links are skipped.
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Abort the whole `list` on the first file that cannot be hashed.
    #[serde(default)]
    pub strict: bool,
    /// Number of hashing workers.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

/// Hasher settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HashConfig {
    /// Files at least this many bytes are hashed through a memory map.
    #[serde(default = "default_mmap_threshold")]
    pub mmap_threshold: u64,
}

/// Terminal output settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Show the hashing progress line on a TTY.
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            strict: false,
            threads: default_threads(),
        }
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            mmap_threshold: default_mmap_threshold(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: default_progress(),
        }
    }
}

impl Config {
    /// Smallest accepted `hash.mmap_threshold`.
    pub const MIN_MMAP_THRESHOLD: u64 = 4096;

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid TOML
    /// - A value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or out-of-range values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.scan.threads == 0 {
            anyhow::bail!("scan.threads must be at least 1");
        }
        if self.hash.mmap_threshold < Self::MIN_MMAP_THRESHOLD {
            anyhow::bail!(
                "hash.mmap_threshold must be at least {} bytes",
                Self::MIN_MMAP_THRESHOLD
            );
        }
        Ok(())
    }
}

static NUM_CPUS: std::sync::LazyLock<usize> = std::sync::LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
});

// Default functions for serde
fn default_threads() -> usize {
    (*NUM_CPUS).min(8)
}

const fn default_mmap_threshold() -> u64 {
    1_048_576 // 1MB
}

const fn default_progress() -> bool {
    true
}
