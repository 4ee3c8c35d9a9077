use anyhow::Result;
use std::fmt::Write;

use crate::{
    render::{
        DOWNLOAD_PLATFORMS, assets_for, find_by_pattern, format_bytes, format_date, format_number,
        source_asset,
    },
    runtime::Runtime,
    source::{AssetInfo, ReleaseInfo},
};

use super::config::{Config, Settings};
use super::stats::report_fallbacks;

/// List the latest release's assets grouped by platform. Each `pattern`
/// additionally selects one asset by glob.
#[tracing::instrument(skip(runtime, settings))]
pub async fn downloads<R: Runtime + 'static>(
    runtime: R,
    settings: &Settings,
    patterns: &[String],
) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    let release = config.fetcher.latest_release().await;
    print!("{}", listing(&release, patterns)?);
    report_fallbacks(&config.hook);
    Ok(())
}

pub(crate) fn listing(release: &ReleaseInfo, patterns: &[String]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", release.name)?;
    writeln!(
        out,
        "Version {} released {}",
        release.version,
        format_date(&release.published_at)
    )?;

    if release.assets.is_empty() {
        writeln!(out, "\nNo release assets available. See {}", release.html_url)?;
        return Ok(out);
    }

    for os in DOWNLOAD_PLATFORMS {
        let assets = assets_for(&release.assets, os);
        writeln!(out, "\n{}:", os.display_name())?;
        if assets.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for asset in assets {
            write_asset(&mut out, asset)?;
        }
    }

    if let Some(asset) = source_asset(&release.assets) {
        writeln!(out, "\nSource:")?;
        write_asset(&mut out, asset)?;
    }

    if !patterns.is_empty() {
        writeln!(out, "\nSelected:")?;
        for pattern in patterns {
            match find_by_pattern(&release.assets, pattern)? {
                Some(asset) => write_asset(&mut out, asset)?,
                None => writeln!(out, "  {}: no matching asset", pattern)?,
            }
        }
    }

    writeln!(
        out,
        "\nTotal downloads: {}",
        format_number(release.total_downloads())
    )?;
    Ok(out)
}

fn write_asset(out: &mut String, asset: &AssetInfo) -> std::fmt::Result {
    writeln!(
        out,
        "  {} ({}, {} downloads)\n    {}",
        asset.name,
        format_bytes(asset.size),
        asset.download_count,
        asset.download_url
    )
}
