use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{FileStorage, MemoryStorage, Storage, SystemClock, TtlCache},
    http::HttpClient,
    observe::CollectingHook,
    runtime::Runtime,
    source::{
        DEFAULT_GITHUB_API_URL, DEFAULT_REGISTRY_API_URL, DockerHubSource, GitHubSource, RepoId,
    },
    stats::StatsFetcher,
};

pub const DEFAULT_REPO: &str = "hndrwn-dk/s3-migration-scheduler";
pub const DEFAULT_IMAGE: &str = "hndrwn/s3-migration-scheduler";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

const CACHE_DIR_NAME: &str = "s3ms-site";
const USER_AGENT: &str = concat!("s3ms-site/", env!("S3MS_VERSION"));

/// Options shared by every command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repo: String,
    pub image: String,
    pub api_url: Option<String>,
    pub registry_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub no_cache: bool,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            api_url: None,
            registry_url: None,
            cache_dir: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            no_cache: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub type SiteFetcher = StatsFetcher<GitHubSource, DockerHubSource, Box<dyn Storage>, SystemClock>;

pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub fetcher: SiteFetcher,
    pub hook: Arc<CollectingHook>,
    /// `None` when entries only live in memory.
    pub cache_dir: Option<PathBuf>,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn new(runtime: R, settings: &Settings) -> Result<Self> {
        let repo: RepoId = settings
            .repo
            .parse()
            .context("Invalid repository setting")?;
        let image: RepoId = settings.image.parse().context("Invalid image setting")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let http_client = HttpClient::new(client);

        let github = GitHubSource::new(
            http_client.clone(),
            settings.api_url.as_deref().unwrap_or(DEFAULT_GITHUB_API_URL),
        );
        let registry = DockerHubSource::new(
            http_client,
            settings
                .registry_url
                .as_deref()
                .unwrap_or(DEFAULT_REGISTRY_API_URL),
        );

        let runtime = Arc::new(runtime);
        let (storage, cache_dir): (Box<dyn Storage>, Option<PathBuf>) = if settings.no_cache {
            debug!("Cache disabled, keeping entries in memory");
            (Box::new(MemoryStorage::new()) as Box<dyn Storage>, None)
        } else {
            let dir = resolve_cache_dir(runtime.as_ref(), settings.cache_dir.clone())?;
            debug!("Using cache directory: {:?}", dir);
            (
                Box::new(FileStorage::new(Arc::clone(&runtime), dir.clone())) as Box<dyn Storage>,
                Some(dir),
            )
        };

        let hook = CollectingHook::new();
        let cache = TtlCache::new(storage, settings.cache_ttl).with_hook(hook.clone());
        let fetcher =
            StatsFetcher::new(github, registry, cache, repo, image).with_hook(hook.clone());

        Ok(Self {
            runtime,
            fetcher,
            hook,
            cache_dir,
        })
    }
}

/// The explicit directory, or `s3ms-site` under the user's cache directory.
pub fn resolve_cache_dir<R: Runtime + ?Sized>(
    runtime: &R,
    explicit: Option<PathBuf>,
) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => runtime
            .cache_dir()
            .map(|dir| dir.join(CACHE_DIR_NAME))
            .context("Could not determine a cache directory, use --cache-dir or --no-cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};
    use std::path::Path;

    fn settings_for(url: &str) -> Settings {
        Settings {
            repo: "owner/repo".into(),
            image: "ns/image".into(),
            api_url: Some(url.to_string()),
            registry_url: Some(url.to_string()),
            no_cache: true,
            ..Settings::default()
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.repo, "hndrwn-dk/s3-migration-scheduler");
        assert_eq!(settings.image, "hndrwn/s3-migration-scheduler");
        assert_eq!(settings.cache_ttl, Duration::from_millis(300_000));
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_resolve_cache_dir_prefers_explicit() {
        let mut runtime = MockRuntime::new();
        runtime.expect_cache_dir().never();

        let dir = resolve_cache_dir(&runtime, Some(PathBuf::from("/tmp/site"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/site"));
    }

    #[test]
    fn test_resolve_cache_dir_under_user_cache() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_cache_dir()
            .returning(|| Some(PathBuf::from("/home/user/.cache")));

        let dir = resolve_cache_dir(&runtime, None).unwrap();
        assert_eq!(dir, Path::new("/home/user/.cache").join("s3ms-site"));
    }

    #[test]
    fn test_resolve_cache_dir_unavailable() {
        let mut runtime = MockRuntime::new();
        runtime.expect_cache_dir().returning(|| None);

        let err = resolve_cache_dir(&runtime, None).unwrap_err();
        assert!(err.to_string().contains("--cache-dir"));
    }

    #[test]
    fn test_config_rejects_bad_repo() {
        let settings = Settings {
            repo: "not-a-repo".into(),
            no_cache: true,
            ..Settings::default()
        };
        let result = Config::new(MockRuntime::new(), &settings);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_without_cache_keeps_entries_in_memory() {
        let mut runtime = MockRuntime::new();
        runtime.expect_cache_dir().never();
        runtime.expect_write().never();

        let config = Config::new(runtime, &settings_for("http://localhost")).unwrap();
        assert_eq!(config.cache_dir, None);

        config.fetcher.cache().set("github_commits", &12u64);
        assert_eq!(config.fetcher.cache().get::<u64>("github_commits"), Some(12));
    }

    #[tokio::test]
    async fn test_config_sends_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/owner/repo")
            .match_header("user-agent", Matcher::Regex("^s3ms-site/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"stargazers_count": 7, "forks_count": 1, "open_issues_count": 0,
                    "description": null, "updated_at": "2025-01-01T00:00:00Z",
                    "default_branch": "main"}"#,
            )
            .create_async()
            .await;

        let config = Config::new(MockRuntime::new(), &settings_for(&server.url())).unwrap();
        let info = config.fetcher.repo_info().await;

        mock.assert_async().await;
        assert_eq!(info.stars, 7);
        assert!(config.hook.failures().is_empty());
    }
}
