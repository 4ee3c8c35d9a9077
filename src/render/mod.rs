//! Rendering fetched data into page insertion points.

mod assets;
mod format;
mod page;

pub use assets::{DOWNLOAD_PLATFORMS, assets_for, find_by_pattern, platform_patterns, source_asset};
pub use format::{format_bytes, format_date, format_number};
pub use page::{LOADING, Page, ids};

use crate::platform::{Os, PlatformGuess};
use crate::stats::SiteStats;

/// Shown when a release has no notes.
pub const DEFAULT_RELEASE_DESCRIPTION: &str =
    "Latest stable release with bug fixes and improvements.";

/// Fill every statistics insertion point the page has.
pub fn render_stats(page: &mut Page, stats: &SiteStats) {
    let release = &stats.release;

    page.set(ids::GITHUB_STARS, format_number(stats.repo.stars));
    page.set(ids::TOTAL_DOWNLOADS, format_number(release.total_downloads()));
    page.set(ids::CONTRIBUTORS_COUNT, stats.contributors.to_string());
    page.set(ids::COMMITS_COUNT, format_number(stats.commits));
    page.set(ids::DOCKER_PULLS, format_number(stats.registry.pulls));

    for id in [ids::LATEST_VERSION, ids::DESKTOP_VERSION, ids::RELEASE_VERSION] {
        page.set(id, release.version.as_str());
    }
    page.set(ids::RELEASE_DATE, format_date(&release.published_at));
    page.set(ids::RELEASE_NOTES_LINK, release.html_url.as_str());
    page.set(
        ids::RELEASE_DESCRIPTION,
        if release.description.trim().is_empty() {
            DEFAULT_RELEASE_DESCRIPTION
        } else {
            release.description.as_str()
        },
    );

    for (os, id) in [
        (Os::Windows, ids::DOWNLOAD_WINDOWS_MAIN),
        (Os::Linux, ids::DOWNLOAD_LINUX_MAIN),
    ] {
        if let Some(asset) = assets_for(&release.assets, os).first() {
            page.set(id, asset.download_url.as_str());
        }
    }

    if let Some(asset) = source_asset(&release.assets) {
        page.set(ids::SOURCE_ZIP, asset.download_url.as_str());
    }
}

/// Fill the detection banner. Unknown platforms leave it untouched.
pub fn render_platform(page: &mut Page, guess: &PlatformGuess) {
    if !guess.is_known() {
        return;
    }
    page.set(ids::DETECTED_PLATFORM_TEXT, guess.display());
    page.set(ids::SMART_DOWNLOAD, guess.download_url());
}
