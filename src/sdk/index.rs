//! The .NET release index (`releases-index.json`)

use semver::Version;
use serde::Deserialize;

use crate::sdk::error::ResolveError;

/// Substrings that mark an SDK version as a pre-release
const PRERELEASE_MARKERS: [&str; 2] = ["preview", "rc"];

/// One release line in the index
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseIndexEntry {
    /// Latest SDK for this release line, e.g. "8.0.404"
    pub latest_sdk: String,
    #[serde(default)]
    pub channel_version: Option<String>,
    #[serde(default)]
    pub support_phase: Option<String>,
    #[serde(default)]
    pub release_type: Option<String>,
    #[serde(default)]
    pub eol_date: Option<String>,
}

impl ReleaseIndexEntry {
    /// True when `latest-sdk` contains "preview" or "rc" (any case)
    pub fn is_prerelease(&self) -> bool {
        let lower = self.latest_sdk.to_ascii_lowercase();
        PRERELEASE_MARKERS.iter().any(|marker| lower.contains(marker))
    }

    /// Parses the numeric core of `latest-sdk` as a three-component version
    ///
    /// Missing minor or patch components count as 0 and any pre-release
    /// suffix is dropped.
    pub fn sdk_version(&self) -> Option<Version> {
        let core = self.latest_sdk.trim().split(['-', '+']).next()?;
        let mut components = core.split('.').map(|part| part.parse::<u64>().ok());

        let major = components.next()??;
        let minor = components.next().unwrap_or(Some(0))?;
        let patch = components.next().unwrap_or(Some(0))?;
        if components.next().is_some() {
            return None;
        }
        Some(Version::new(major, minor, patch))
    }
}

/// The full release index
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReleaseIndex {
    #[serde(rename = "releases-index")]
    pub entries: Vec<ReleaseIndexEntry>,
}

impl ReleaseIndex {
    /// Parses the index JSON
    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(text).map_err(|e| ResolveError::Parse(e.to_string()))
    }

    /// Returns the newest stable SDK whose major version is `major`
    pub fn latest_stable(&self, major: u64) -> Option<Version> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_prerelease())
            .filter_map(ReleaseIndexEntry::sdk_version)
            .filter(|version| version.major == major)
            .max()
    }
}
