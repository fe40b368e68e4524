//! Release environment versions (`"7.0"`, `"8.0.1"`).
//!
//! Releases carry two- or three-component dotted versions. They are
//! padded to full semver so they order numerically.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version {0:?}: expected MAJOR.MINOR[.PATCH]")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion(semver::Version);

impl ReleaseVersion {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionError::Malformed(raw.to_string()));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::Malformed(raw.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| VersionError::Malformed(raw.to_string()))?;
        }

        Ok(Self(semver::Version::new(numbers[0], numbers[1], numbers[2])))
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
