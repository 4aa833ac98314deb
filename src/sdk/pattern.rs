//! Requested SDK version patterns
//!
//! A pattern is up to three dot-separated components. Each one is either a
//! number or a wildcard:
//! - `6.x.x` takes minor and patch from the newest stable 6.x SDK
//! - `8.0.x` pins the minor, takes the patch from the index
//! - `9.0.100` pins everything

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One component of a version pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    Fixed(u64),
    Latest,
}

impl VersionComponent {
    /// Anything that is not a non-negative integer is a wildcard
    fn parse(segment: &str) -> Self {
        segment
            .trim()
            .parse()
            .map(Self::Fixed)
            .unwrap_or(Self::Latest)
    }

    /// Returns the fixed value, or `fallback` for a wildcard
    pub fn or(self, fallback: u64) -> u64 {
        match self {
            Self::Fixed(value) => value,
            Self::Latest => fallback,
        }
    }
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{}", value),
            Self::Latest => f.write_str("x"),
        }
    }
}

/// A requested `(major, minor, patch)` triple with optional wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPattern {
    pub major: VersionComponent,
    pub minor: VersionComponent,
    pub patch: VersionComponent,
}

impl VersionPattern {
    /// Parses a pattern; missing components are wildcards, extra ones are ignored
    pub fn parse(text: &str) -> Self {
        let mut segments = text.split('.').map(VersionComponent::parse);
        let mut next = || segments.next().unwrap_or(VersionComponent::Latest);

        Self {
            major: next(),
            minor: next(),
            patch: next(),
        }
    }
}

impl FromStr for VersionPattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
