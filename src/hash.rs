//! SHA-256 content digests of individual files.
//!
//! Only the bytes of a file feed the digest; name, timestamps and
//! permissions never do. Digests are rendered as 64 upper-case hex digits,
//! the form stored in manifests.

use anyhow::{Context, Result};
use memmap2::MmapOptions;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Length of a rendered digest in hex characters.
pub const HASH_HEX_LEN: usize = 64;

/// Buffer size for the streaming reader.
const STREAM_BUFFER: usize = 65536;

/// Hash an in-memory buffer.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:X}", Sha256::digest(data))
}

/// Hash a file, memory-mapping it when it is at least `mmap_threshold` bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, mapped or read.
pub fn hash_file(path: &Path, mmap_threshold: u64) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?;

    if metadata.len() == 0 {
        return Ok(hash_bytes(b""));
    }

    if metadata.len() < mmap_threshold {
        hash_reader(file).with_context(|| format!("Failed to read {}", path.display()))
    } else {
        // SAFETY: the map is read-only and dropped before returning. A file
        // truncated concurrently can fault; scanning a tree under mutation is
        // outside what a snapshot guarantees.
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("Failed to map {}", path.display()))?;
        Ok(hash_bytes(&mmap))
    }
}

/// Hash everything a reader yields.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn hash_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; STREAM_BUFFER];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:X}", hasher.finalize()))
}
