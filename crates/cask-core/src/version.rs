//! Three-component version numbers.
//!
//! A [`Version`] is exactly `major.minor.patch` where each component is a
//! non-negative integer. There is no pre-release or build metadata handling;
//! anything other than three plain decimal segments is rejected.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A parsed `major.minor.patch` version.
///
/// Ordering is lexicographic on `(major, minor, patch)`, and
/// `Display` is the exact inverse of `FromStr` for every valid input.
///
/// # Examples
///
/// ```
/// use cask_core::Version;
///
/// let v: Version = "1.4.2".parse().unwrap();
/// assert_eq!(v, Version::new(1, 4, 2));
/// assert_eq!(v.to_string(), "1.4.2");
/// assert!(v < Version::new(1, 10, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

fn parse_segment(text: &str, segment: &str) -> Result<u64, CoreError> {
    // u64::from_str accepts a leading '+', which a version segment must not.
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidVersion(text.to_string()));
    }
    segment
        .parse()
        .map_err(|_| CoreError::InvalidVersion(text.to_string()))
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('.');
        let (major, minor, patch) = match (segments.next(), segments.next(), segments.next()) {
            (Some(major), Some(minor), Some(patch)) => (major, minor, patch),
            _ => return Err(CoreError::InvalidVersion(s.to_string())),
        };
        if segments.next().is_some() {
            return Err(CoreError::InvalidVersion(s.to_string()));
        }

        Ok(Self {
            major: parse_segment(s, major)?,
            minor: parse_segment(s, minor)?,
            patch: parse_segment(s, patch)?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
