//! Helpers for .NET CI pipelines
//!
//! - [`sdk`]: Resolve SDK version patterns to installer channels and install them
//! - [`github`]: Draft, upload to, annotate and publish GitHub releases
//! - [`changelog`]: Turn the commit log into release notes
//! - [`solution`]: Query the projects of a solution by build property
//! - [`ci`]: Read build metadata from the CI environment
//! - [`http`] and [`process`]: The fetcher and process runner everything else is built on

pub mod changelog;
pub mod ci;
pub mod config;
pub mod github;
pub mod http;
pub mod logging;
pub mod process;
pub mod sdk;
pub mod solution;
