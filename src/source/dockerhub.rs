//! Docker Hub source implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::http::HttpClient;

use super::{RegistryInfo, RegistrySource, RepoId};

#[derive(Deserialize, Debug)]
struct Repository {
    pull_count: u64,
    star_count: u64,
    last_updated: Option<String>,
}

pub struct DockerHubSource {
    http_client: HttpClient,
    api_url: String,
}

impl DockerHubSource {
    pub fn new(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RegistrySource for DockerHubSource {
    #[tracing::instrument(skip(self))]
    async fn image_info(&self, image: &RepoId) -> Result<RegistryInfo> {
        let url = format!(
            "{}/v2/repositories/{}/{}",
            self.api_url, image.owner, image.repo
        );
        debug!("Fetching image info from {}...", url);

        let data: Repository = self
            .http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch registry info for {}", image))?;

        Ok(RegistryInfo {
            pulls: data.pull_count,
            stars: data.star_count,
            updated: data.last_updated.unwrap_or_default(),
        })
    }
}
