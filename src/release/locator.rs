//! Latest-release lookup against the GitHub releases API.

use crate::config::ReleaseConfig;
use crate::error::{Result, UpdaterError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A published release, as far as the updater cares about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Opaque version identifier, compared by exact string equality.
    pub tag: String,
    /// Source archive (zipball) of the release.
    pub archive_url: String,
    /// Free-text release notes; empty when the release has none.
    pub notes: String,
    pub name: Option<String>,
    pub html_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Finds the latest release of a repository.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseLocator {
    /// # Errors
    ///
    /// Returns [`UpdaterError::ReleaseNotFound`] when the repository has no
    /// releases and [`UpdaterError::NetworkError`] when the feed cannot be
    /// reached or answers with something unexpected.
    fn latest_release(&self, owner: &str, repo: &str) -> Result<Release>;
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    zipball_url: String,
    body: Option<String>,
    name: Option<String>,
    html_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl From<GithubRelease> for Release {
    fn from(release: GithubRelease) -> Self {
        Self {
            tag: release.tag_name,
            archive_url: release.zipball_url,
            notes: release.body.unwrap_or_default(),
            name: release.name.filter(|n| !n.is_empty()),
            html_url: release.html_url,
            published_at: release.published_at,
        }
    }
}

/// [`ReleaseLocator`] backed by `GET /repos/{owner}/{repo}/releases/latest`.
pub struct GithubReleaseLocator {
    agent: ureq::Agent,
    api_base_url: String,
    user_agent: String,
    token: Option<String>,
}

impl GithubReleaseLocator {
    pub fn new<S: Into<String>>(api_base_url: S, timeout: Duration) -> Self {
        Self {
            agent: super::http_agent(Some(timeout)),
            api_base_url: api_base_url.into(),
            user_agent: format!("neversink-updater/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        }
    }

    /// Build from configuration, picking up `GITHUB_TOKEN` when it is set.
    pub fn from_config(config: &ReleaseConfig) -> Self {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Self::new(config.api_base_url.clone(), config.timeout_duration())
            .with_user_agent(config.user_agent.clone())
            .with_token(token)
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn latest_release_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base_url.trim_end_matches('/'),
            owner,
            repo
        )
    }
}

impl ReleaseLocator for GithubReleaseLocator {
    fn latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let url = self.latest_release_url(owner, repo);
        log::debug!("requesting {}", url);

        let mut request = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", self.user_agent.as_str());

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.call().map_err(|e| match super::error_status(&e) {
            Some(404) => UpdaterError::ReleaseNotFound {
                repository: format!("{}/{}", owner, repo),
            },
            _ => UpdaterError::NetworkError {
                url: url.clone(),
                message: e.to_string(),
            },
        })?;

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| UpdaterError::NetworkError {
                url: url.clone(),
                message: e.to_string(),
            })?;

        parse_release(&body).map_err(|message| UpdaterError::NetworkError { url, message })
    }
}

/// Decode a release document from the GitHub API.
pub fn parse_release(json: &str) -> std::result::Result<Release, String> {
    serde_json::from_str::<GithubRelease>(json)
        .map(Release::from)
        .map_err(|e| format!("unexpected release feed response: {}", e))
}
