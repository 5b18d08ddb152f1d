//! Manifest data model and on-disk format.
//!
//! A manifest is a flat text file named `treesum_<YYYY-MM-DD-HHMMSS>.txt`
//! holding one line per regular file of a snapshotted tree:
//!
//! ```text
//! <64 upper-case hex SHA-256> <YYYY-MM-DD-HHMMSS> <size> <path>
//! ```
//!
//! Fields are separated by single spaces and the path runs to the end of the
//! line, so it may itself contain spaces. Line order is the walk order and
//! carries no meaning. Manifests are created once by [`ManifestWriter`] and
//! never modified afterwards.

/// Line grammar: formatting and structural validation of a single record.
pub mod line;
/// Manifest file naming convention.
pub mod naming;
/// All-or-nothing manifest reader.
pub mod parser;
/// Tree walk and manifest creation.
pub mod writer;

pub use line::LineError;
pub use naming::{is_manifest_file_name, manifest_file_name, parse_manifest_file_name};
pub use parser::{parse_manifest_str, read_manifest};
pub use writer::{ListSummary, ManifestWriter, SkippedFile};

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

/// chrono format of every timestamp treesum writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Length of a rendered timestamp.
pub const TIMESTAMP_LEN: usize = 17;

/// Upper-case hex SHA-256 digest identifying a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// The digest as stored in a manifest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != crate::hash::HASH_HEX_LEN {
            return Err(LineError::HashLength(s.len()));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_digit() || ('A'..='F').contains(c)))
        {
            return Err(LineError::HashCharacter(c));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UTC wall-clock time at one-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current UTC time, truncated to the second.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert a filesystem time (for example an mtime) to UTC seconds,
    /// rounding towards the past.
    ///
    /// Returns `None` when the time falls outside years 0000 through 9999,
    /// which the four-digit year field cannot hold.
    #[must_use]
    pub fn try_from_system_time(time: SystemTime) -> Option<Self> {
        let secs = match time.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_secs()).ok()?,
            Err(before) => {
                let before = before.duration();
                let whole = i64::try_from(before.as_secs()).ok()?;
                let partial = i64::from(before.subsec_nanos() > 0);
                whole.checked_add(partial)?.checked_neg()?
            }
        };
        let time = DateTime::<Utc>::from_timestamp(secs, 0)?;
        (0..=9999)
            .contains(&time.year())
            .then(|| Self(time.naive_utc()))
    }

    fn from_datetime(time: DateTime<Utc>) -> Self {
        let naive = time.naive_utc();
        Self(naive.with_nanosecond(0).unwrap_or(naive))
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }
}

impl FromStr for Timestamp {
    type Err = LineError;

    /// Parse `YYYY-MM-DD-HHMMSS`.
    ///
    /// The shape is checked byte by byte before chrono validates the
    /// calendar, since chrono alone accepts unpadded numeric fields.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == TIMESTAMP_LEN
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 | 10 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(LineError::TimestampShape(s.to_string()));
        }

        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| LineError::TimestampValue(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// One record per file at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    /// Digest of the file's full content.
    pub hash: ContentHash,
    /// Last modification time.
    pub modified: Timestamp,
    /// Byte length at hash time.
    pub size: u64,
    /// Path as encountered during the walk.
    pub path: String,
}

impl ManifestEntry {
    /// Path as a filesystem path.
    #[must_use]
    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// File name component of the path, or the whole path if it has none.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// A parsed manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// File the entries were read from.
    pub path: PathBuf,
    /// Records in on-disk order.
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[test]
    fn test_hash_accepts_uppercase_hex() {
        let hash: ContentHash = "A".repeat(64).parse().unwrap();
        assert_eq!(hash.as_str().len(), 64);
    }

    #[test]
    fn test_hash_rejects_lowercase() {
        let lower = "a".repeat(64);
        assert_eq!(
            lower.parse::<ContentHash>(),
            Err(LineError::HashCharacter('a'))
        );
    }

    #[test]
    fn test_hash_rejects_wrong_length() {
        assert_eq!(
            "ABC".parse::<ContentHash>(),
            Err(LineError::HashLength(3))
        );
        assert!("0".repeat(65).parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts: Timestamp = "2024-06-01-134502".parse().unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(13, 45, 2)
            .unwrap();
        assert_eq!(ts, Timestamp::from(expected));
        assert_eq!(ts.to_string(), "2024-06-01-134502");
    }

    #[test]
    fn test_timestamp_rejects_unpadded_fields() {
        assert!(matches!(
            "2024-6-01-134502".parse::<Timestamp>(),
            Err(LineError::TimestampShape(_))
        ));
        assert!("2024-06-01-13452".parse::<Timestamp>().is_err());
        assert!("2024/06/01-134502".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_rejects_impossible_dates() {
        assert!(matches!(
            "2024-13-01-000000".parse::<Timestamp>(),
            Err(LineError::TimestampValue(_))
        ));
        assert!("2023-02-29-000000".parse::<Timestamp>().is_err());
        assert!("2024-01-01-250000".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_truncates_subseconds() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500);
        let ts = Timestamp::try_from_system_time(time).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01-000001");
    }

    #[test]
    fn test_timestamp_before_epoch_rounds_down() {
        let time = SystemTime::UNIX_EPOCH - Duration::from_millis(1_500);
        let ts = Timestamp::try_from_system_time(time).unwrap();
        assert_eq!(ts.to_string(), "1969-12-31-235958");

        let time = SystemTime::UNIX_EPOCH - Duration::from_secs(86_400);
        let ts = Timestamp::try_from_system_time(time).unwrap();
        assert_eq!(ts.to_string(), "1969-12-31-000000");
    }

    #[test]
    fn test_timestamp_year_range_limits() {
        let last = SystemTime::UNIX_EPOCH + Duration::from_secs(253_402_300_799);
        let ts = Timestamp::try_from_system_time(last).unwrap();
        assert_eq!(ts.to_string(), "9999-12-31-235959");
        assert_eq!(ts.to_string().parse::<Timestamp>(), Ok(ts));

        let first = SystemTime::UNIX_EPOCH - Duration::from_secs(62_167_219_200);
        let ts = Timestamp::try_from_system_time(first).unwrap();
        assert_eq!(ts.to_string(), "0000-01-01-000000");
        assert_eq!(ts.to_string().parse::<Timestamp>(), Ok(ts));
    }

    #[test]
    fn test_timestamp_outside_four_digit_years_is_rejected() {
        let year_10000 = SystemTime::UNIX_EPOCH + Duration::from_secs(253_402_300_800);
        assert_eq!(Timestamp::try_from_system_time(year_10000), None);

        let far_future = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000_000_000_000);
        assert_eq!(Timestamp::try_from_system_time(far_future), None);

        let year_minus_1 = SystemTime::UNIX_EPOCH - Duration::from_secs(62_167_219_201);
        assert_eq!(Timestamp::try_from_system_time(year_minus_1), None);
    }

    #[test]
    fn test_entry_file_name() {
        let entry = ManifestEntry {
            hash: "0".repeat(64).parse().unwrap(),
            modified: "2024-01-01-000000".parse().unwrap(),
            size: 1,
            path: "/photos/2019/beach day.jpg".to_string(),
        };
        assert_eq!(entry.file_name(), "beach day.jpg");
    }
}
