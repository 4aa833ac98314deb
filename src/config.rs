use serde::Deserialize;
use std::path::{Path, PathBuf};

use thiserror::Error;

// =============================================================================
// Remote endpoints
// =============================================================================

/// Release index listing the latest SDK per .NET release line
pub const DEFAULT_RELEASES_INDEX_URL: &str =
    "https://dotnetcli.blob.core.windows.net/dotnet/release-metadata/releases-index.json";

/// Default base URL for the GitHub REST API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// User agent sent with every HTTP request
pub const USER_AGENT: &str = "dotnet-ci-helpers";

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Timeout for asset uploads in milliseconds (10 minutes)
pub const UPLOAD_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Tool configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolConfig {
    pub releases_index_url: String,
    pub github: GitHubConfig,
    pub sdk: SdkConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            releases_index_url: DEFAULT_RELEASES_INDEX_URL.to_string(),
            github: GitHubConfig::default(),
            sdk: SdkConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Loads the configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration when a path is given, otherwise returns defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map(Self::load).unwrap_or_else(|| Ok(Self::default()))
    }
}

/// GitHub-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

/// SDK installation configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SdkConfig {
    /// Directory the SDKs are installed into (defaults to `<data dir>/dotnet`)
    pub install_dir: Option<PathBuf>,
    /// Version patterns installed when none are given on the command line
    pub channels: Vec<String>,
}

/// Overrides the data directory when set to a non-empty path
pub const DATA_DIR_ENV: &str = "DOTNET_CI_HELPERS_DATA_DIR";

/// Directory name used below the tool cache or the platform data directory
const APP_DIR: &str = "dotnet-ci-helpers";

/// Returns the directory that holds downloaded scripts and SDKs.
///
/// Lookup order: `$DOTNET_CI_HELPERS_DATA_DIR` as is, then
/// `$RUNNER_TOOL_CACHE/dotnet-ci-helpers` on hosted runners, then the
/// platform data directory, then the system temp directory.
pub fn data_dir() -> PathBuf {
    data_dir_from(|key| std::env::var(key).ok(), dirs::data_dir())
}

/// Returns the default SDK install directory.
pub fn default_install_dir() -> PathBuf {
    data_dir().join("dotnet")
}

fn data_dir_from(
    lookup: impl Fn(&str) -> Option<String>,
    platform_data_dir: Option<PathBuf>,
) -> PathBuf {
    let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(dir) = set(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    set("RUNNER_TOOL_CACHE")
        .map(PathBuf::from)
        .or(platform_data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}
