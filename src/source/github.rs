//! GitHub source implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use crate::http::HttpClient;

use super::{AssetInfo, ReleaseInfo, RepoId, RepoInfo, RepoSource};

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Repo {
        pub stargazers_count: u64,
        pub forks_count: u64,
        pub open_issues_count: u64,
        pub description: Option<String>,
        pub updated_at: String,
        pub default_branch: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        pub name: Option<String>,
        pub body: Option<String>,
        pub published_at: Option<String>,
        pub html_url: String,
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub size: u64,
        pub download_count: u64,
        pub browser_download_url: String,
    }
}

/// Number of commits sampled when the API gives no pagination hint.
const COMMIT_SAMPLE: usize = 100;

pub struct GitHubSource {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubSource {
    pub fn new(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn repo_url(&self, repo: &RepoId) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.repo)
    }

    async fn fetch_repo(&self, repo: &RepoId) -> Result<api::Repo> {
        let url = self.repo_url(repo);
        debug!("Fetching repo info from {}...", url);
        self.http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch repository {}", repo))
    }

    /// Count items of a paginated listing using a single `per_page=1`
    /// request: the page number of the `rel="last"` link is the total.
    async fn count_by_last_page(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<u64>> {
        let mut query = query.to_vec();
        query.push(("per_page", "1"));
        let page = self
            .http_client
            .get_json_with_link::<Vec<serde_json::Value>>(url, &query)
            .await?;

        Ok(match page.link.as_deref().and_then(last_page) {
            Some(n) => Some(n),
            None if page.body.is_empty() => Some(0),
            // A single page of one item has no Link header
            None => None,
        })
    }
}

/// Extract the page number of the `rel="last"` entry of a `Link` header.
pub fn last_page(link: &str) -> Option<u64> {
    link.split(',')
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            Url::parse(part.get(start..end)?).ok()
        })
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
        })
}

#[async_trait]
impl RepoSource for GitHubSource {
    #[tracing::instrument(skip(self))]
    async fn repo_info(&self, repo: &RepoId) -> Result<RepoInfo> {
        let data = self.fetch_repo(repo).await?;
        Ok(RepoInfo {
            stars: data.stargazers_count,
            forks: data.forks_count,
            issues: data.open_issues_count,
            description: data.description.unwrap_or_default(),
            updated: data.updated_at,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn latest_release(&self, repo: &RepoId) -> Result<ReleaseInfo> {
        let url = format!("{}/releases/latest", self.repo_url(repo));
        debug!("Fetching latest release from {}...", url);
        let data: api::Release = self
            .http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch latest release of {}", repo))?;

        Ok(ReleaseInfo {
            name: data.name.unwrap_or_else(|| data.tag_name.clone()),
            version: data.tag_name,
            description: data.body.unwrap_or_default(),
            published_at: data.published_at.unwrap_or_default(),
            assets: data
                .assets
                .into_iter()
                .map(|a| AssetInfo {
                    name: a.name,
                    size: a.size,
                    download_count: a.download_count,
                    download_url: a.browser_download_url,
                })
                .collect(),
            html_url: data.html_url,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn contributor_count(&self, repo: &RepoId) -> Result<u64> {
        let url = format!("{}/contributors", self.repo_url(repo));
        debug!("Counting contributors at {}...", url);
        let count = self
            .count_by_last_page(&url, &[])
            .await
            .with_context(|| format!("Failed to fetch contributors of {}", repo))?;
        Ok(count.unwrap_or(1))
    }

    #[tracing::instrument(skip(self))]
    async fn commit_count(&self, repo: &RepoId) -> Result<u64> {
        let branch = self.fetch_repo(repo).await?.default_branch;
        let url = format!("{}/commits", self.repo_url(repo));
        debug!("Counting commits on {} at {}...", branch, url);

        let counted = self
            .count_by_last_page(&url, &[("sha", branch.as_str())])
            .await
            .with_context(|| format!("Failed to fetch commits of {}", repo))?;

        match counted {
            Some(n) if n > 0 => Ok(n),
            _ => {
                // No pagination hint: sample one page and count it
                let per_page = COMMIT_SAMPLE.to_string();
                let commits: Vec<serde_json::Value> = self
                    .http_client
                    .get_json_with_query(&url, &[("sha", branch.as_str()), ("per_page", &per_page)])
                    .await
                    .with_context(|| format!("Failed to sample commits of {}", repo))?;
                Ok(commits.len().min(COMMIT_SAMPLE) as u64)
            }
        }
    }
}
