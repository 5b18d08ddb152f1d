use super::Timestamp;

/// File name prefix of every manifest.
pub const MANIFEST_PREFIX: &str = "treesum_";

/// File name suffix of every manifest.
pub const MANIFEST_SUFFIX: &str = ".txt";

/// File name prefix of the temporary file a manifest is written to.
pub const PARTIAL_PREFIX: &str = ".treesum_";

/// File name suffix of the temporary file a manifest is written to.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// File name for a manifest created at `created`.
#[must_use]
pub fn manifest_file_name(created: &Timestamp) -> String {
    format!("{MANIFEST_PREFIX}{created}{MANIFEST_SUFFIX}")
}

/// Creation time embedded in a manifest file name, or `None` if `name` does
/// not follow the convention exactly.
#[must_use]
pub fn parse_manifest_file_name(name: &str) -> Option<Timestamp> {
    name.strip_prefix(MANIFEST_PREFIX)?
        .strip_suffix(MANIFEST_SUFFIX)?
        .parse()
        .ok()
}

/// Whether `name` follows the manifest naming convention.
#[must_use]
pub fn is_manifest_file_name(name: &str) -> bool {
    parse_manifest_file_name(name).is_some()
}

/// Whether `name` is an unfinished manifest left by an interrupted `list`.
#[must_use]
pub fn is_partial_manifest_name(name: &str) -> bool {
    name.len() > PARTIAL_PREFIX.len() + PARTIAL_SUFFIX.len()
        && name.starts_with(PARTIAL_PREFIX)
        && name.ends_with(PARTIAL_SUFFIX)
}
