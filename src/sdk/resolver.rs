//! SDK channel resolution
//!
//! Matches requested version patterns against the release index and turns
//! each match into an installer channel.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::http::TextFetcher;
use crate::sdk::channel::ResolvedChannel;
use crate::sdk::error::ResolveError;
use crate::sdk::index::ReleaseIndex;
use crate::sdk::pattern::{VersionComponent, VersionPattern};

/// Resolve requested patterns against the release index JSON
///
/// For each pattern the newest stable SDK of its major line is selected and
/// the pattern's fixed minor/patch are laid over it. A fixed component always
/// wins, even when no such SDK has been published. Channels with the same
/// installer token are emitted once, in request order.
///
/// # Returns
/// * `Ok(channels)` - At least one channel
/// * `Err(ResolveError::Parse)` - If `index_json` is not a release index
/// * `Err(ResolveError::NoMatch)` - If no pattern matched a stable SDK
pub fn resolve_channels<S: AsRef<str>>(
    requests: &[S],
    index_json: &str,
) -> Result<Vec<ResolvedChannel>, ResolveError> {
    let patterns: Vec<VersionPattern> = requests
        .iter()
        .map(|request| VersionPattern::parse(request.as_ref()))
        .collect();
    let index = ReleaseIndex::parse(index_json)?;

    let mut seen = HashSet::new();
    let mut channels = Vec::new();

    for pattern in &patterns {
        let Some(channel) = resolve_pattern(pattern, &index) else {
            debug!("No stable SDK matches {}", pattern);
            continue;
        };

        if !seen.insert(channel.token()) {
            debug!("Skipping duplicate channel {} for {}", channel, pattern);
            continue;
        }

        debug!("Resolved {} to {}", pattern, channel);
        channels.push(channel);
    }

    if channels.is_empty() {
        return Err(ResolveError::NoMatch {
            requested: requests.iter().map(|r| r.as_ref().to_string()).collect(),
        });
    }

    Ok(channels)
}

fn resolve_pattern(pattern: &VersionPattern, index: &ReleaseIndex) -> Option<ResolvedChannel> {
    let VersionComponent::Fixed(major) = pattern.major else {
        return None;
    };
    let latest = index.latest_stable(major)?;

    Some(ResolvedChannel::new(
        major,
        pattern.minor.or(latest.minor),
        pattern.patch.or(latest.patch),
    ))
}

/// Fetches the release index and resolves channels from it
pub struct ChannelResolver {
    fetcher: Arc<dyn TextFetcher>,
    index_url: String,
}

impl ChannelResolver {
    pub fn new(fetcher: Arc<dyn TextFetcher>, index_url: &str) -> Self {
        Self {
            fetcher,
            index_url: index_url.to_string(),
        }
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Fetch the index and resolve `requests` against it
    ///
    /// Failures are logged before they are returned.
    pub async fn resolve<S: AsRef<str> + Sync>(
        &self,
        requests: &[S],
    ) -> Result<Vec<ResolvedChannel>, ResolveError> {
        let index_json = self
            .fetcher
            .fetch_text(&self.index_url)
            .await
            .inspect_err(|e| error!("Failed to fetch {}: {}", self.index_url, e))?;

        let channels = resolve_channels(requests, &index_json)
            .inspect_err(|e| error!("Failed to resolve SDK channels: {}", e))?;

        info!(
            "Resolved SDK channels: {}",
            channels
                .iter()
                .map(ResolvedChannel::token)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(channels)
    }
}
