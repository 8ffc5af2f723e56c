//! GitHub raw-content client.
//!
//! Maps a repository URL such as `https://github.com/owner/repo` plus an item
//! name to `https://raw.githubusercontent.com/owner/repo/<branch>/<item>` and
//! downloads it with a small internal retry loop.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use super::ContentSource;
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BRANCH, FETCH_ATTEMPTS, FETCH_RETRY_UNIT, MAX_BODY_BYTES,
    RAW_CONTENT_HOST, READ_TIMEOUT_SECS,
};
use super::error::{FetchError, TransportError};

/// Settings for [`GithubSource`].
#[derive(Debug, Clone)]
pub struct GithubSourceConfig {
    /// Branch appended after `owner/repo`.
    pub branch: String,
    /// Replaces `https://raw.githubusercontent.com` when set (mirrors, tests).
    pub raw_base_url: Option<Url>,
    /// Attempts per fetch, including the first (minimum 1).
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n` units before the next try.
    pub retry_unit: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Bodies longer than this are rejected without being buffered whole.
    pub max_body_bytes: u64,
}

impl Default for GithubSourceConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            raw_base_url: None,
            max_attempts: FETCH_ATTEMPTS,
            retry_unit: FETCH_RETRY_UNIT,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// [`ContentSource`] backed by GitHub's raw content host.
///
/// Create once and share; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct GithubSource {
    client: Client,
    config: GithubSourceConfig,
}

impl GithubSource {
    /// Builds a source with the given settings.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if TLS or proxy setup fails.
    pub fn new(config: GithubSourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(user_agent())
            .build()?;

        debug!(
            branch = %config.branch,
            raw_base_url = ?config.raw_base_url.as_ref().map(Url::as_str),
            max_attempts = config.max_attempts,
            "creating GitHub content source"
        );

        Ok(Self { client, config })
    }

    /// Returns the active settings.
    #[must_use]
    pub fn config(&self) -> &GithubSourceConfig {
        &self.config
    }

    /// Resolves the raw content URL for `item` in `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRepository`] when the repository is not an
    /// absolute http(s) URL with an `owner/repo` path, and
    /// [`FetchError::InvalidItem`] for empty or `..` item paths.
    pub fn raw_url(&self, repository: &str, item: &str) -> Result<Url, FetchError> {
        let trimmed = repository.trim().trim_end_matches('/');
        let repo_url = Url::parse(trimmed)
            .map_err(|e| FetchError::invalid_repository(repository, e.to_string()))?;
        if !matches!(repo_url.scheme(), "http" | "https") {
            return Err(FetchError::invalid_repository(
                repository,
                format!("scheme '{}' is not supported", repo_url.scheme()),
            ));
        }

        let item_segments = item_segments(item)?;
        let repo_segments: Vec<&str> = repo_url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let mut raw = match &self.config.raw_base_url {
            Some(base) => {
                let [.., owner, name] = repo_segments.as_slice() else {
                    return Err(FetchError::invalid_repository(
                        repository,
                        "expected an owner/repo path",
                    ));
                };
                let mut raw = base.clone();
                raw.path_segments_mut()
                    .map_err(|()| {
                        FetchError::invalid_repository(repository, "raw base URL cannot be a base")
                    })?
                    .pop_if_empty()
                    .push(owner)
                    .push(name);
                raw
            }
            None => {
                if repo_segments.len() < 2 {
                    return Err(FetchError::invalid_repository(
                        repository,
                        "expected an owner/repo path",
                    ));
                }
                let mut raw = repo_url.clone();
                if matches!(repo_url.host_str(), Some("github.com" | "www.github.com")) {
                    raw.set_host(Some(RAW_CONTENT_HOST))
                        .map_err(|e| FetchError::invalid_repository(repository, e.to_string()))?;
                }
                raw
            }
        };

        raw.path_segments_mut()
            .map_err(|()| FetchError::invalid_repository(repository, "URL cannot be a base"))?
            .pop_if_empty()
            .push(&self.config.branch)
            .extend(item_segments);
        raw.set_query(None);
        raw.set_fragment(None);

        Ok(raw)
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(TransportError::from_request)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::http_status(status.as_u16()));
        }

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|length| length > limit) {
            return Err(TransportError::BodyTooLarge { limit });
        }

        // Content-Length can be absent or wrong, so count while reading
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| TransportError::Body { source })?
        {
            if body.len() as u64 + chunk.len() as u64 > limit {
                return Err(TransportError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentSource for GithubSource {
    #[instrument(skip(self), fields(repository = %repository, item = %item))]
    async fn fetch(&self, repository: &str, item: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.raw_url(repository, item)?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.fetch_once(&url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), url = %url, "fetched item");
                    return Ok(body);
                }
                Err(error) if attempt < max_attempts => {
                    let delay = self.config.retry_unit * attempt;
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis(),
                        url = %url,
                        error = %error,
                        "fetch attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    return Err(FetchError::exhausted(attempt, error));
                }
            }
        }
    }
}

fn item_segments(item: &str) -> Result<Vec<&str>, FetchError> {
    let segments: Vec<&str> = item
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(FetchError::invalid_item(item, "item name is empty"));
    }
    if segments.iter().any(|segment| *segment == ".." || *segment == ".") {
        return Err(FetchError::invalid_item(
            item,
            "relative path segments are not allowed",
        ));
    }
    Ok(segments)
}

fn user_agent() -> String {
    format!("vulnscan/{}", env!("CARGO_PKG_VERSION"))
}
