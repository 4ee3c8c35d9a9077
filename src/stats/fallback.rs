//! Values shown when a live source is unavailable.

use chrono::{DateTime, SecondsFormat};

use crate::source::{RegistryInfo, ReleaseInfo, RepoId, RepoInfo};

pub const FALLBACK_DESCRIPTION: &str = "Enterprise S3 Migration Made Simple";
pub const FALLBACK_CONTRIBUTORS: u64 = 1;
pub const FALLBACK_COMMITS: u64 = 50;

const FALLBACK_VERSION: &str = "v1.0.0";
const FALLBACK_RELEASE_NAME: &str = "Latest Release";
const FALLBACK_RELEASE_DESCRIPTION: &str = "Latest stable release of S3 Migration Scheduler";

/// Epoch millis as `2025-01-01T00:00:00.000Z`.
pub fn iso_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(super) fn repo_info(now: i64) -> RepoInfo {
    RepoInfo {
        stars: 0,
        forks: 0,
        issues: 0,
        description: FALLBACK_DESCRIPTION.to_string(),
        updated: iso_timestamp(now),
    }
}

pub(super) fn latest_release(repo: &RepoId, now: i64) -> ReleaseInfo {
    ReleaseInfo {
        version: FALLBACK_VERSION.to_string(),
        name: FALLBACK_RELEASE_NAME.to_string(),
        description: FALLBACK_RELEASE_DESCRIPTION.to_string(),
        published_at: iso_timestamp(now),
        assets: Vec::new(),
        html_url: format!("https://github.com/{}/releases", repo),
    }
}

pub(super) fn registry_info(now: i64) -> RegistryInfo {
    RegistryInfo {
        pulls: 0,
        stars: 0,
        updated: iso_timestamp(now),
    }
}
