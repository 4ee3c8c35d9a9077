//! Remote metadata sources.
//!
//! [`RepoSource`] covers the code host (repository, releases, contributors,
//! commits) and [`RegistrySource`] the container registry. Implementations
//! return typed summaries and plain errors; caching and fallbacks live in
//! [`crate::stats`].

mod dockerhub;
mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use dockerhub::DockerHubSource;
pub use github::{GitHubSource, last_page};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REGISTRY_API_URL: &str = "https://hub.docker.com";

/// `owner/name` identifier, used for repositories and registry images alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format '{}'. Expected 'owner/name'.", s)
        }
        Ok(RepoId {
            owner: parts[0].to_string(),
            repo: parts[1].to_string(),
        })
    }
}

/// Repository summary shown on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub stars: u64,
    pub forks: u64,
    pub issues: u64,
    pub description: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    pub size: u64,
    pub download_count: u64,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub version: String,
    pub name: String,
    pub description: String,
    pub published_at: String,
    pub assets: Vec<AssetInfo>,
    pub html_url: String,
}

impl ReleaseInfo {
    /// Sum of download counts over all assets.
    pub fn total_downloads(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}

/// Container image summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryInfo {
    pub pulls: u64,
    pub stars: u64,
    pub updated: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn repo_info(&self, repo: &RepoId) -> Result<RepoInfo>;

    async fn latest_release(&self, repo: &RepoId) -> Result<ReleaseInfo>;

    async fn contributor_count(&self, repo: &RepoId) -> Result<u64>;

    /// Commits on the default branch.
    async fn commit_count(&self, repo: &RepoId) -> Result<u64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn image_info(&self, image: &RepoId) -> Result<RegistryInfo>;
}
