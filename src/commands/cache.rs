use anyhow::Result;
use log::debug;
use std::fmt::Write;
use std::path::Path;

use crate::{
    cache::{Clock, Storage, TtlCache},
    runtime::Runtime,
};

use super::config::{Config, Settings};

/// Print every cached entry with its age.
#[tracing::instrument(skip(runtime, settings))]
pub fn cache_show<R: Runtime + 'static>(runtime: R, settings: &Settings) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    print!(
        "{}",
        show_entries(config.fetcher.cache(), config.cache_dir.as_deref())?
    );
    Ok(())
}

/// Remove every cached entry, asking first unless `yes` is set.
#[tracing::instrument(skip(runtime, settings))]
pub fn cache_clear<R: Runtime + 'static>(runtime: R, settings: &Settings, yes: bool) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    print!(
        "{}",
        clear_entries(config.runtime.as_ref(), config.fetcher.cache(), yes)?
    );
    Ok(())
}

pub(crate) fn show_entries<S: Storage, C: Clock>(
    cache: &TtlCache<S, C>,
    dir: Option<&Path>,
) -> Result<String> {
    let mut out = String::new();
    match dir {
        Some(dir) => writeln!(out, "Cache directory: {}", dir.display())?,
        None => writeln!(out, "Cache disabled, nothing is kept between runs")?,
    }

    let entries = cache.entries()?;
    if entries.is_empty() {
        writeln!(out, "Cache is empty.")?;
        return Ok(out);
    }

    let width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
    for entry in entries {
        let age = match entry.age_ms {
            Some(ms) => format_age(ms),
            None => "unreadable".to_string(),
        };
        let state = if entry.expired { "expired" } else { "fresh" };
        writeln!(out, "  {:<width$}  {:>8}  {}", entry.key, age, state, width = width)?;
    }
    Ok(out)
}

pub(crate) fn clear_entries<R: Runtime + ?Sized, S: Storage, C: Clock>(
    runtime: &R,
    cache: &TtlCache<S, C>,
    yes: bool,
) -> Result<String> {
    let count = cache.entries()?.len();
    if count == 0 {
        return Ok("Cache is empty.\n".to_string());
    }

    if !yes && !runtime.confirm(&format!("Remove {} cached entries?", count))? {
        return Ok("Cancelled.\n".to_string());
    }

    let removed = cache.clear()?;
    debug!("Removed {} cache entries", removed);
    Ok(format!("Removed {} cached entries.\n", removed))
}

/// `45s`, `5m 3s`, `2h 10m`
fn format_age(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
    }
}
