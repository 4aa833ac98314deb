//! Resolved SDK channels

use std::fmt;

/// Installer tokens switch from `major.minor` to feature bands at this major
const FEATURE_BAND_MAJOR: u64 = 5;

/// A concrete SDK version chosen for installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedChannel {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ResolvedChannel {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Feature band: the leading digit of the patch (404 -> 4)
    pub fn band(&self) -> u64 {
        let mut band = self.patch;
        while band >= 10 {
            band /= 10;
        }
        band
    }

    /// Installer channel token, e.g. "8.0.4xx" or "3.1"
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResolvedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major < FEATURE_BAND_MAJOR {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}xx", self.major, self.minor, self.band())
        }
    }
}
