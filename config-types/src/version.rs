use serde::{Deserialize, Serialize};
use std::fmt;

/// Application version, rendered as `v{major}.{minor}.{patches}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patches: u32,
}

impl Version {
    pub const V1: Version = Version::new(1, 0, 0);

    /// Version reported when an application does not pick one explicitly.
    pub const DEFAULT: Version = Version::V1;

    pub const fn new(major: u32, minor: u32, patches: u32) -> Self {
        Self {
            major,
            minor,
            patches,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patches)
    }
}
