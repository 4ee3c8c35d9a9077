//! Matching release assets to platforms.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

use crate::platform::Os;
use crate::source::AssetInfo;

const WINDOWS_PATTERNS: &[&str] = &["windows", "win64", "x64", ".msi", ".exe"];
const LINUX_PATTERNS: &[&str] = &["linux", ".deb", ".rpm", ".appimage", ".tar.gz"];

/// Platforms that get their own download section.
pub const DOWNLOAD_PLATFORMS: [Os; 2] = [Os::Windows, Os::Linux];

/// Name fragments that mark an asset as belonging to `os`.
pub fn platform_patterns(os: Os) -> &'static [&'static str] {
    match os {
        Os::Windows => WINDOWS_PATTERNS,
        Os::Linux => LINUX_PATTERNS,
        Os::MacOs | Os::Unknown => &[],
    }
}

/// Assets for `os`, in release order. Matching is a case-insensitive
/// substring test against the asset name.
pub fn assets_for(assets: &[AssetInfo], os: Os) -> Vec<&AssetInfo> {
    let patterns = platform_patterns(os);
    assets
        .iter()
        .filter(|asset| {
            let name = asset.name.to_lowercase();
            patterns.iter().any(|p| name.contains(p))
        })
        .collect()
}

/// The source archive, if the release ships one.
pub fn source_asset(assets: &[AssetInfo]) -> Option<&AssetInfo> {
    assets
        .iter()
        .find(|asset| asset.name.contains("source") || asset.name.contains(".zip"))
}

/// First asset whose name matches the glob `pattern`, ignoring case.
pub fn find_by_pattern<'a>(assets: &'a [AssetInfo], pattern: &str) -> Result<Option<&'a AssetInfo>> {
    let pattern =
        Pattern::new(pattern).with_context(|| format!("Invalid asset pattern '{}'", pattern))?;
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    Ok(assets
        .iter()
        .find(|asset| pattern.matches_with(&asset.name, options)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> AssetInfo {
        AssetInfo {
            name: name.to_string(),
            size: 1024,
            download_count: 1,
            download_url: format!("https://example.com/{}", name),
        }
    }

    fn release_assets() -> Vec<AssetInfo> {
        vec![
            asset("S3.Migration.Scheduler-1.1.0-win-x64.exe"),
            asset("S3.Migration.Scheduler-1.1.0.AppImage"),
            asset("s3-migration-scheduler_1.1.0_amd64.deb"),
            asset("S3.Migration.Scheduler-1.1.0-win-x64-portable.zip"),
            asset("latest.yml"),
        ]
    }

    fn names(assets: Vec<&AssetInfo>) -> Vec<&str> {
        assets.into_iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_assets_for_windows() {
        let assets = release_assets();
        assert_eq!(
            names(assets_for(&assets, Os::Windows)),
            vec![
                "S3.Migration.Scheduler-1.1.0-win-x64.exe",
                "S3.Migration.Scheduler-1.1.0-win-x64-portable.zip",
            ]
        );
    }

    #[test]
    fn test_assets_for_linux_is_case_insensitive() {
        let assets = release_assets();
        assert_eq!(
            names(assets_for(&assets, Os::Linux)),
            vec![
                "S3.Migration.Scheduler-1.1.0.AppImage",
                "s3-migration-scheduler_1.1.0_amd64.deb",
            ]
        );
    }

    #[test]
    fn test_assets_for_platform_without_section() {
        let assets = release_assets();
        assert!(assets_for(&assets, Os::MacOs).is_empty());
        assert!(assets_for(&assets, Os::Unknown).is_empty());
    }

    #[test]
    fn test_source_asset() {
        let assets = release_assets();
        assert_eq!(
            source_asset(&assets).map(|a| a.name.as_str()),
            Some("S3.Migration.Scheduler-1.1.0-win-x64-portable.zip")
        );
        assert!(source_asset(&[asset("app.exe")]).is_none());
    }

    #[test]
    fn test_find_by_pattern() {
        let assets = release_assets();
        let found = find_by_pattern(&assets, "*.appimage").unwrap();
        assert_eq!(
            found.map(|a| a.name.as_str()),
            Some("S3.Migration.Scheduler-1.1.0.AppImage")
        );

        assert!(find_by_pattern(&assets, "*.dmg").unwrap().is_none());
        assert!(find_by_pattern(&assets, "[").is_err());
    }
}
