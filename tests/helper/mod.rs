//! Shared test utilities

pub mod collaborators;

pub use collaborators::{RecordingRunner, StubFetcher, index_json};
