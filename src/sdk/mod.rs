//! .NET SDK channel resolution and installation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ TextFetcher │────▶│  Resolver   │────▶│  Installer  │
//! │  (index)    │     │ (channels)  │     │  (script)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Pattern   │     │ProcessRunner│
//!                     │   + Index   │     │ (bash/pwsh) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`pattern`]: Requested version patterns such as `8.0.x`
//! - [`index`]: The remote release index (`releases-index.json`)
//! - [`channel`]: Resolved channels and their installer tokens
//! - [`resolver`]: Matching patterns against the index
//! - [`install`]: Running the dotnet-install script per channel
//! - [`workload`]: `dotnet workload restore`
//! - [`error`]: Error types for resolution and installation

pub mod channel;
pub mod error;
pub mod index;
pub mod install;
pub mod pattern;
pub mod resolver;
pub mod workload;

pub use channel::ResolvedChannel;
pub use error::{InstallError, ResolveError};
pub use index::{ReleaseIndex, ReleaseIndexEntry};
pub use install::{InstallScript, SdkInstaller};
pub use pattern::{VersionComponent, VersionPattern};
pub use resolver::{ChannelResolver, resolve_channels};
pub use workload::restore_workloads;
