//! Three-part version triples carried in plugin metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `major.minor.build` version triple.
///
/// The triple has no ordering of its own; comparisons happen on the host by
/// rendering it with [`Display`](fmt::Display) and parsing the result as a
/// semantic version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionType {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Build component.
    pub build: u64,
}

impl VersionType {
    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u64, minor: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}.{}", self.major, self.minor, self.build)
    }
}
