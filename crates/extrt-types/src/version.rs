//! Semantic version wrapper (spec §3 "Version").
//!
//! Delegates parsing, ordering and formatting to the `semver` crate, which
//! already implements SemVer precedence (prerelease identifiers ordered,
//! build metadata ignored for ordering) — exactly the behavior spec.md asks
//! the in-repo `plg::*` version library to provide.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(semver::Version);

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// True if `self` and `other` share (major, minor, patch), regardless
    /// of prerelease tag. Used by the prerelease opt-in rule (spec §3).
    pub fn same_release(&self, other: &Version) -> bool {
        self.0.major == other.0.major
            && self.0.minor == other.0.minor
            && self.0.patch == other.0.patch
    }
}

impl FromStr for Version {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(semver::Version::parse(s.trim())?))
    }
}

impl TryFrom<String> for Version {
    type Error = semver::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_orders_by_semver_precedence() {
        let a: Version = "1.0.0".parse().unwrap();
        let b: Version = "1.2.0".parse().unwrap();
        let c: Version = "1.2.0-alpha".parse().unwrap();
        assert!(a < b);
        assert!(c < b, "prerelease sorts before the release it precedes");
    }

    #[test]
    fn same_release_ignores_prerelease_tag() {
        let release: Version = "1.2.0".parse().unwrap();
        let pre: Version = "1.2.0-rc.1".parse().unwrap();
        assert!(release.same_release(&pre));
    }
}
