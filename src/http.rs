//! Plain-text HTTP fetching

#[cfg(test)]
use mockall::automock;

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{FETCH_TIMEOUT_MS, USER_AGENT};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
}

/// Trait for fetching the body of a URL as text
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TextFetcher: Send + Sync {
    /// Fetches `url` and returns the response body
    ///
    /// # Returns
    /// * `Ok(String::new())` - If `url` is blank; no request is made
    /// * `Ok(body)` - If the server answered with a success status
    /// * `Err(FetchError)` - On transport failure or non-success status
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// `TextFetcher` backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default user agent and fetch timeout
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl TextFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            debug!("Blank URL, returning empty text");
            return Ok(String::new());
        }

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
