//! GitHub Releases API client

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_GITHUB_API_URL, UPLOAD_TIMEOUT_MS, USER_AGENT};
use crate::github::error::ReleaseError;
use crate::github::types::{
    AssetUpload, NewRelease, Release, ReleaseAsset, ReleasePatch, RepositoryId,
};

/// Page size used when listing releases and assets
const PER_PAGE: usize = 100;

/// Client for creating, editing and publishing releases
///
/// Holds its own HTTP client and token; pass it to every step that talks to
/// GitHub instead of configuring a shared one.
pub struct ReleaseClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Creates a client for the API at `base_url`
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ReleaseError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(UPLOAD_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Creates a client for api.github.com
    pub fn github(token: Option<String>) -> Result<Self, ReleaseError> {
        Self::new(DEFAULT_GITHUB_API_URL, token)
    }

    fn releases_url(&self, repo: &RepositoryId) -> String {
        format!("{}/repos/{}/{}/releases", self.base_url, repo.owner, repo.name)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        subject: &str,
    ) -> Result<T, ReleaseError> {
        let response = check_status(builder.send().await?, subject)?;

        response.json().await.map_err(|e| {
            warn!("Failed to parse response for {}: {}", subject, e);
            ReleaseError::InvalidResponse(e.to_string())
        })
    }

    /// Create a draft release
    pub async fn create_draft(
        &self,
        repo: &RepositoryId,
        release: NewRelease,
    ) -> Result<Release, ReleaseError> {
        let release = NewRelease {
            draft: true,
            ..release
        };
        info!("Creating draft release {} in {}", release.tag_name, repo);

        let builder = self
            .request(Method::POST, &self.releases_url(repo))
            .json(&release);
        self.send(builder, &format!("{} releases", repo)).await
    }

    /// Fetch a release by id
    pub async fn get_release(
        &self,
        repo: &RepositoryId,
        release_id: u64,
    ) -> Result<Release, ReleaseError> {
        let url = format!("{}/{}", self.releases_url(repo), release_id);
        self.send(self.request(Method::GET, &url), &format!("release {}", release_id))
            .await
    }

    /// Find the release carrying `tag`, including drafts
    ///
    /// Drafts are invisible to the by-tag endpoint, so this walks the release
    /// list instead.
    pub async fn find_release_by_tag(
        &self,
        repo: &RepositoryId,
        tag: &str,
    ) -> Result<Option<Release>, ReleaseError> {
        for page in 1.. {
            let url = format!(
                "{}?per_page={}&page={}",
                self.releases_url(repo),
                PER_PAGE,
                page
            );
            let releases: Vec<Release> = self
                .send(self.request(Method::GET, &url), &format!("{} releases", repo))
                .await?;
            let count = releases.len();

            if let Some(release) = releases.into_iter().find(|r| r.tag_name == tag) {
                return Ok(Some(release));
            }
            if count < PER_PAGE {
                break;
            }
        }

        debug!("No release tagged {} in {}", tag, repo);
        Ok(None)
    }

    /// List all assets of a release, following pagination
    pub async fn list_assets(
        &self,
        repo: &RepositoryId,
        release_id: u64,
    ) -> Result<Vec<ReleaseAsset>, ReleaseError> {
        let mut assets = Vec::new();

        for page in 1.. {
            let url = format!(
                "{}/{}/assets?per_page={}&page={}",
                self.releases_url(repo),
                release_id,
                PER_PAGE,
                page
            );
            let batch: Vec<ReleaseAsset> = self
                .send(
                    self.request(Method::GET, &url),
                    &format!("assets of release {}", release_id),
                )
                .await?;
            let count = batch.len();
            assets.extend(batch);

            if count < PER_PAGE {
                break;
            }
        }

        Ok(assets)
    }

    /// Delete a release asset
    pub async fn delete_asset(
        &self,
        repo: &RepositoryId,
        asset_id: u64,
    ) -> Result<(), ReleaseError> {
        let url = format!("{}/assets/{}", self.releases_url(repo), asset_id);
        let response = self.request(Method::DELETE, &url).send().await?;
        check_status(response, &format!("asset {}", asset_id))?;
        Ok(())
    }

    /// Upload an asset, replacing any existing asset with the same name
    pub async fn upload_asset(
        &self,
        repo: &RepositoryId,
        release: &Release,
        asset: AssetUpload,
    ) -> Result<ReleaseAsset, ReleaseError> {
        let existing = self.list_assets(repo, release.id).await?;
        if let Some(old) = existing.iter().find(|a| a.name == asset.name) {
            info!("Replacing existing asset {} on {}", old.name, release.tag_name);
            self.delete_asset(repo, old.id).await?;
        }

        let url = upload_url(&release.upload_url, &asset.name)?;
        info!(
            "Uploading {} ({} bytes) to {}",
            asset.name,
            asset.data.len(),
            release.tag_name
        );

        let builder = self
            .request(Method::POST, url.as_str())
            .header("Content-Type", asset.content_type.as_str())
            .body(asset.data);
        self.send(builder, &format!("asset {}", asset.name)).await
    }

    /// Replace the body of a release
    pub async fn edit_body(
        &self,
        repo: &RepositoryId,
        release_id: u64,
        body: &str,
    ) -> Result<Release, ReleaseError> {
        let patch = ReleasePatch {
            body: Some(body.to_string()),
            ..Default::default()
        };
        self.patch_release(repo, release_id, &patch).await
    }

    /// Append `notes` to the current body, separated by a blank line
    pub async fn append_notes(
        &self,
        repo: &RepositoryId,
        release_id: u64,
        notes: &str,
    ) -> Result<Release, ReleaseError> {
        let release = self.get_release(repo, release_id).await?;
        let body = append_text(release.body.as_deref().unwrap_or_default(), notes);
        self.edit_body(repo, release_id, &body).await
    }

    /// Turn a draft into a published release
    pub async fn publish(
        &self,
        repo: &RepositoryId,
        release_id: u64,
    ) -> Result<Release, ReleaseError> {
        info!("Publishing release {} in {}", release_id, repo);
        let patch = ReleasePatch {
            draft: Some(false),
            ..Default::default()
        };
        self.patch_release(repo, release_id, &patch).await
    }

    async fn patch_release(
        &self,
        repo: &RepositoryId,
        release_id: u64,
        patch: &ReleasePatch,
    ) -> Result<Release, ReleaseError> {
        let url = format!("{}/{}", self.releases_url(repo), release_id);
        let builder = self.request(Method::PATCH, &url).json(patch);
        self.send(builder, &format!("release {}", release_id)).await
    }
}

fn check_status(response: Response, subject: &str) -> Result<Response, ReleaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .is_some_and(|v| v.as_bytes() == b"0");

    match status {
        StatusCode::NOT_FOUND => Err(ReleaseError::NotFound(subject.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(ReleaseError::RateLimited {
            retry_after_secs: retry_after,
        }),
        StatusCode::FORBIDDEN if quota_exhausted => Err(ReleaseError::RateLimited {
            retry_after_secs: retry_after,
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ReleaseError::Unauthorized(subject.to_string()))
        }
        _ => {
            warn!("GitHub API returned status {} for {}", status, subject);
            Err(ReleaseError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )))
        }
    }
}

/// Expand the `{?name,label}` upload template with the asset name
fn upload_url(template: &str, asset_name: &str) -> Result<Url, ReleaseError> {
    let base = template.split('{').next().unwrap_or(template);
    let mut url = Url::parse(base)
        .map_err(|e| ReleaseError::InvalidResponse(format!("Bad upload URL {}: {}", base, e)))?;
    url.query_pairs_mut().append_pair("name", asset_name);
    Ok(url)
}

fn append_text(body: &str, notes: &str) -> String {
    let body = body.trim_end();
    if body.is_empty() {
        notes.to_string()
    } else {
        format!("{}\n\n{}", body, notes)
    }
}
