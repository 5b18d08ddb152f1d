//! Command implementations behind the CLI subcommands.

/// `compare`: locate, parse and reconcile two manifests.
pub mod compare;

/// `list`: snapshot a tree into a new manifest.
pub mod list;
