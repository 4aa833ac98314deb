//! GitHub release workflow
//!
//! - [`client`]: REST client for releases and release assets
//! - [`types`]: Repository ids and release payloads
//! - [`error`]: Error type for release operations

pub mod client;
pub mod error;
pub mod types;

pub use client::ReleaseClient;
pub use error::ReleaseError;
pub use types::{AssetUpload, NewRelease, Release, ReleaseAsset, RepositoryId};
