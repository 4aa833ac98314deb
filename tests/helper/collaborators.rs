//! Stub fetcher and process runner

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use dotnet_ci_helpers::http::{FetchError, TextFetcher};
use dotnet_ci_helpers::process::{CommandSpec, ProcessOutput, ProcessRunner};

/// Build release index JSON with one entry per `latest-sdk` value
pub fn index_json(latest_sdks: &[&str]) -> String {
    let entries: Vec<serde_json::Value> = latest_sdks
        .iter()
        .map(|sdk| serde_json::json!({ "latest-sdk": sdk, "support-phase": "active" }))
        .collect();
    serde_json::json!({ "releases-index": entries }).to_string()
}

/// Fetcher serving canned bodies per URL
pub struct StubFetcher {
    bodies: HashMap<String, String>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
        }
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl TextFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            return Ok(String::new());
        }
        match self.bodies.get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Runner that records commands and succeeds
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        command: &CommandSpec,
    ) -> Result<ProcessOutput, dotnet_ci_helpers::process::ProcessError> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(ProcessOutput::default())
    }
}
