//! HTTP client for a self-hosted or hosted GitLab-compatible platform.
//!
//! All calls authenticate with a personal access token, time out after
//! [`DEFAULT_TIMEOUT`], and retry transient failures (timeouts, 429, 5xx)
//! with doubling backoff before giving up. List endpoints paginate until
//! a short page.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiCommit, ApiDiff, ApiProject, ApiUser, CommitQuery};

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for list endpoints; a shorter page ends the walk.
const PER_PAGE: usize = 100;

/// Total tries per call, first attempt included.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the second attempt; doubles each retry.
const RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum GitlabError {
    #[error("invalid access token: {reason}")]
    InvalidToken { reason: &'static str },

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid project reference {reference:?}: expected group/project or a full URL")]
    InvalidProjectRef { reference: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("authentication failed: {message}")]
    Auth { message: String },

    #[error("access forbidden: {resource}")]
    Forbidden { resource: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("server error {status} after {attempts} attempts")]
    Server { status: u16, attempts: u32 },

    #[error("request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl GitlabError {
    /// Whether the client rejected the credential outright.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// What to do with a failed attempt.
enum Attempt<T> {
    Done(T),
    /// Worth retrying; carries the error to surface if attempts run out.
    Retry(GitlabError),
    Fail(GitlabError),
}

pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

// Manual impl so the token never lands in logs.
impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for `base_url` (instance root, no `/api/v4`).
    pub fn new(base_url: &str, token: &str) -> Result<Self, GitlabError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GitlabError::InvalidToken {
                reason: "token is empty",
            });
        }
        let mut parsed = Url::parse(base_url.trim()).map_err(|err| GitlabError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(GitlabError::InvalidUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) instance URL".to_string(),
            });
        }
        parsed.set_query(None);
        parsed.set_fragment(None);
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(GitlabError::ClientBuild)?;
        Ok(Self {
            http,
            base_url: parsed,
            token: token.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The authenticated user; doubles as the startup credential check.
    pub async fn current_user(&self) -> Result<ApiUser, GitlabError> {
        let url = self.endpoint(&["user"])?;
        self.get_json(url).await
    }

    /// One project by namespaced path, e.g. `group/app`.
    pub async fn project(&self, path: &str) -> Result<ApiProject, GitlabError> {
        let url = self.endpoint(&["projects", path])?;
        self.get_json(url).await
    }

    /// Every project the token is a member of.
    pub async fn projects(&self) -> Result<Vec<ApiProject>, GitlabError> {
        self.get_paginated(&["projects"], &[("membership".to_string(), "true".to_string())])
            .await
    }

    /// Commits of one project matching `query`, all pages.
    pub async fn commits(
        &self,
        project_id: u64,
        query: &CommitQuery,
    ) -> Result<Vec<ApiCommit>, GitlabError> {
        self.get_paginated(
            &["projects", &project_id.to_string(), "repository", "commits"],
            &query.to_params(),
        )
        .await
    }

    /// Per-file diff of one commit.
    pub async fn commit_diff(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<Vec<ApiDiff>, GitlabError> {
        let url = self.endpoint(&[
            "projects",
            &project_id.to_string(),
            "repository",
            "commits",
            sha,
            "diff",
        ])?;
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitlabError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GitlabError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(["api", "v4"].into_iter().chain(segments.iter().copied()));
        Ok(url)
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(String, String)],
    ) -> Result<Vec<T>, GitlabError> {
        let mut collected = Vec::new();
        let mut page = 1u32;
        loop {
            let mut url = self.endpoint(segments)?;
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, value);
                }
                pairs.append_pair("per_page", &PER_PAGE.to_string());
                pairs.append_pair("page", &page.to_string());
            }
            let batch: Vec<T> = self.get_json(url).await?;
            let len = batch.len();
            collected.extend(batch);
            if len < PER_PAGE {
                return Ok(collected);
            }
            page += 1;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitlabError> {
        let mut attempt = 1u32;
        loop {
            match self.try_get(url.clone(), attempt).await {
                Attempt::Done(body) => {
                    return serde_json::from_str(&body)
                        .map_err(|err| GitlabError::Decode(err.to_string()));
                }
                Attempt::Fail(err) => return Err(err),
                Attempt::Retry(err) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    let delay_ms = RETRY_BASE_DELAY_MS << (attempt - 1);
                    debug!(
                        url = %url,
                        attempt,
                        delay_ms,
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_get(&self, url: Url, attempt: u32) -> Attempt<String> {
        let resource = url.path().to_string();
        let response = match self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return Attempt::Retry(GitlabError::Transport {
                    attempts: attempt,
                    source: err,
                });
            }
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return Attempt::Retry(GitlabError::Transport {
                    attempts: attempt,
                    source: err,
                });
            }
        };
        if status.is_success() {
            return Attempt::Done(body);
        }
        let message = parse_api_message(&body).unwrap_or_else(|| status.to_string());
        match status.as_u16() {
            401 => Attempt::Fail(GitlabError::Auth { message }),
            403 => Attempt::Fail(GitlabError::Forbidden { resource }),
            404 => Attempt::Fail(GitlabError::NotFound { resource }),
            429 => Attempt::Retry(GitlabError::RateLimited { attempts: attempt }),
            status if status >= 500 => Attempt::Retry(GitlabError::Server {
                status,
                attempts: attempt,
            }),
            status => Attempt::Fail(GitlabError::Http { status, message }),
        }
    }
}

/// Error detail from a platform error body, either shape:
/// `{"message": "..."}` or `{"error": "..."}`.
fn parse_api_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ApiError {
        message: Option<serde_json::Value>,
        error: Option<String>,
    }
    let parsed: ApiError = serde_json::from_str(body).ok()?;
    if let Some(message) = parsed.message {
        let text = match message {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        return Some(text);
    }
    parsed.error
}

/// Namespaced project path from a pasted reference: a bare `group/project`
/// or any URL into the project (clone URL, web UI page).
pub fn parse_project_path(reference: &str) -> Result<String, GitlabError> {
    let trimmed = reference.trim();
    let mut path = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let url = Url::parse(trimmed).map_err(|err| GitlabError::InvalidUrl {
            url: trimmed.to_string(),
            reason: err.to_string(),
        })?;
        url.path().trim_matches('/').to_string()
    } else {
        trimmed.trim_matches('/').to_string()
    };
    // Web UI routes nest under /-/ (e.g. group/app/-/commits/main).
    if let Some(index) = path.find("/-/") {
        path.truncate(index);
    }
    if let Some(stripped) = path.strip_suffix(".git") {
        path = stripped.to_string();
    }
    if path.is_empty() || !path.contains('/') {
        return Err(GitlabError::InvalidProjectRef {
            reference: reference.to_string(),
        });
    }
    Ok(path)
}

/// Instance root when the reference is a full URL, `None` for bare paths.
#[must_use]
pub fn instance_base_url(reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    let host = url.host_str()?;
    let mut base = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        base.push_str(&format!(":{port}"));
    }
    Some(base)
}
