//! Hash-based reconciliation of two manifests.
//!
//! A LEFT file "exists in RIGHT" iff at least one RIGHT file has the same
//! content hash, whatever its path, name or timestamp. That is what makes
//! renames and moves invisible to the comparison while deletions show up
//! as "missing on right".

use crate::manifest::{ContentHash, ManifestEntry};
use std::collections::HashMap;
use tracing::{Level, debug, span};

/// A LEFT entry and every RIGHT entry sharing its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correspondence<'a> {
    /// Entry from the LEFT manifest.
    pub left: &'a ManifestEntry,
    /// RIGHT entries with the same hash, in RIGHT's order. Empty when the
    /// content is missing on the right.
    pub matches: Vec<&'a ManifestEntry>,
}

impl Correspondence<'_> {
    /// Whether any RIGHT entry holds this content.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Tallies of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonSummary {
    /// Entries in LEFT.
    pub left_total: usize,
    /// Entries in RIGHT.
    pub right_total: usize,
    /// LEFT entries with at least one match.
    pub matched: usize,
    /// LEFT entries with no match.
    pub missing: usize,
    /// LEFT entries matched by more than one RIGHT entry.
    pub duplicated: usize,
}

/// Result of comparing LEFT against RIGHT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonReport<'a> {
    /// LEFT entries whose hash never occurs in RIGHT, in LEFT's order.
    pub missing: Vec<&'a ManifestEntry>,
    /// One correspondence per LEFT entry, in LEFT's order.
    pub correspondences: Vec<Correspondence<'a>>,
    /// Counts derived from the two lists above.
    pub summary: ComparisonSummary,
}

/// Multiset of RIGHT hashes: every hash maps to all entries carrying it.
struct HashIndex<'a> {
    /// Entries per hash, in insertion order.
    by_hash: HashMap<&'a ContentHash, Vec<&'a ManifestEntry>>,
}

impl<'a> HashIndex<'a> {
    fn build(entries: &'a [ManifestEntry]) -> Self {
        let mut by_hash: HashMap<&ContentHash, Vec<&ManifestEntry>> =
            HashMap::with_capacity(entries.len());
        for entry in entries {
            by_hash.entry(&entry.hash).or_default().push(entry);
        }
        Self { by_hash }
    }

    fn contains(&self, hash: &ContentHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    fn matches(&self, hash: &ContentHash) -> Vec<&'a ManifestEntry> {
        self.by_hash.get(hash).cloned().unwrap_or_default()
    }
}

/// Compare LEFT against RIGHT.
///
/// Performs no I/O and cannot fail; both inputs are already validated.
#[must_use]
pub fn compare<'a>(left: &'a [ManifestEntry], right: &'a [ManifestEntry]) -> ComparisonReport<'a> {
    let _span = span!(Level::DEBUG, "compare", left = left.len(), right = right.len()).entered();
    let index = HashIndex::build(right);

    let missing: Vec<&ManifestEntry> = left.iter().filter(|e| !index.contains(&e.hash)).collect();

    let correspondences: Vec<Correspondence<'a>> = left
        .iter()
        .map(|entry| Correspondence {
            left: entry,
            matches: index.matches(&entry.hash),
        })
        .collect();

    let summary = ComparisonSummary {
        left_total: left.len(),
        right_total: right.len(),
        matched: left.len() - missing.len(),
        missing: missing.len(),
        duplicated: correspondences.iter().filter(|c| c.matches.len() > 1).count(),
    };
    debug!(?summary, "Comparison finished");

    ComparisonReport {
        missing,
        correspondences,
        summary,
    }
}
