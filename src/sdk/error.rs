use thiserror::Error;

use crate::http::FetchError;
use crate::process::ProcessError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid release index: {0}")]
    Parse(String),

    #[error("No installable SDK channel for [{}]", .requested.join(", "))]
    NoMatch { requested: Vec<String> },

    #[error("Failed to fetch release index: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to download install script: {0}")]
    Download(#[from] FetchError),

    #[error("Install script {0} is empty")]
    EmptyScript(String),

    #[error("Failed to write install script: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),
}
