//! Version handling.
//!
//! Conflict resolution needs one deterministic, total order over the version
//! strings found in artifact metadata. Maven versions are not semver: they mix
//! numeric segments of any width with free-form qualifiers, so the ordering is
//! implemented in [`comparison`].

pub mod comparison;

pub use comparison::{MavenVersion, VersionComparator};
