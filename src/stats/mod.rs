//! Cached metadata fetchers.
//!
//! Every fetcher follows the same path: cache lookup by a fixed key, then
//! the source on a miss (storing the result), then a fixed fallback value
//! if the source fails. Callers always get a usable value.

mod fallback;

use anyhow::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use crate::cache::{Clock, Storage, TtlCache};
use crate::observe::{FailureHook, LogHook};
use crate::source::{RegistryInfo, RegistrySource, ReleaseInfo, RepoId, RepoInfo, RepoSource};

pub use fallback::{
    FALLBACK_COMMITS, FALLBACK_CONTRIBUTORS, FALLBACK_DESCRIPTION, iso_timestamp,
};

/// Cache keys, one per fetcher.
pub mod keys {
    pub const REPO_INFO: &str = "github_repo_info";
    pub const LATEST_RELEASE: &str = "github_latest_release";
    pub const CONTRIBUTORS: &str = "github_contributors";
    pub const COMMITS: &str = "github_commits";
    pub const REGISTRY_INFO: &str = "docker_repo_info";

    pub const ALL: [&str; 5] = [REPO_INFO, LATEST_RELEASE, CONTRIBUTORS, COMMITS, REGISTRY_INFO];
}

/// Everything the site shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    pub repo: RepoInfo,
    pub release: ReleaseInfo,
    pub contributors: u64,
    pub commits: u64,
    pub registry: RegistryInfo,
}

pub struct StatsFetcher<G: RepoSource, D: RegistrySource, S: Storage, C: Clock> {
    github: G,
    registry: D,
    cache: TtlCache<S, C>,
    repo: RepoId,
    image: RepoId,
    hook: Arc<dyn FailureHook>,
}

impl<G: RepoSource, D: RegistrySource, S: Storage, C: Clock> StatsFetcher<G, D, S, C> {
    pub fn new(github: G, registry: D, cache: TtlCache<S, C>, repo: RepoId, image: RepoId) -> Self {
        Self {
            github,
            registry,
            cache,
            repo,
            image,
            hook: Arc::new(LogHook),
        }
    }

    /// Route fetch failures to `hook`. The cache keeps its own hook.
    pub fn with_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn cache(&self) -> &TtlCache<S, C> {
        &self.cache
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    async fn cached_or<T, F, Fut>(&self, key: &str, fetch: F, fallback: impl FnOnce() -> T) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(key) {
            return hit;
        }

        match fetch().await {
            Ok(value) => {
                self.cache.set(key, &value);
                value
            }
            Err(e) => {
                self.hook.report(key, &e);
                debug!("{}: using fallback value", key);
                fallback()
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn repo_info(&self) -> RepoInfo {
        self.cached_or(
            keys::REPO_INFO,
            || self.github.repo_info(&self.repo),
            || fallback::repo_info(self.cache.now_millis()),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn latest_release(&self) -> ReleaseInfo {
        self.cached_or(
            keys::LATEST_RELEASE,
            || self.github.latest_release(&self.repo),
            || fallback::latest_release(&self.repo, self.cache.now_millis()),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn contributors(&self) -> u64 {
        self.cached_or(
            keys::CONTRIBUTORS,
            || self.github.contributor_count(&self.repo),
            || FALLBACK_CONTRIBUTORS,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn commit_count(&self) -> u64 {
        self.cached_or(
            keys::COMMITS,
            || self.github.commit_count(&self.repo),
            || FALLBACK_COMMITS,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn registry_info(&self) -> RegistryInfo {
        self.cached_or(
            keys::REGISTRY_INFO,
            || self.registry.image_info(&self.image),
            || fallback::registry_info(self.cache.now_millis()),
        )
        .await
    }

    /// Fetch everything. Repository info, the latest release and the
    /// contributor count are requested together.
    #[tracing::instrument(skip(self))]
    pub async fn gather(&self) -> SiteStats {
        let (repo, release, contributors) =
            tokio::join!(self.repo_info(), self.latest_release(), self.contributors());
        let commits = self.commit_count().await;
        let registry = self.registry_info().await;

        SiteStats {
            repo,
            release,
            contributors,
            commits,
            registry,
        }
    }
}
