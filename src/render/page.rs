//! Named insertion points the site renders into.

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

pub mod ids {
    pub const GITHUB_STARS: &str = "github-stars";
    pub const TOTAL_DOWNLOADS: &str = "total-downloads";
    pub const CONTRIBUTORS_COUNT: &str = "contributors-count";
    pub const COMMITS_COUNT: &str = "commits-count";
    pub const LATEST_VERSION: &str = "latest-version";
    pub const DESKTOP_VERSION: &str = "desktop-version";
    pub const RELEASE_VERSION: &str = "release-version";
    pub const RELEASE_DATE: &str = "release-date";
    pub const RELEASE_NOTES_LINK: &str = "release-notes-link";
    pub const RELEASE_DESCRIPTION: &str = "release-description";
    pub const DOCKER_PULLS: &str = "docker-pulls";
    pub const DOWNLOAD_WINDOWS_MAIN: &str = "download-windows-main";
    pub const DOWNLOAD_LINUX_MAIN: &str = "download-linux-main";
    pub const SOURCE_ZIP: &str = "source-zip";
    pub const DETECTED_PLATFORM_TEXT: &str = "detected-platform-text";
    pub const SMART_DOWNLOAD: &str = "smart-download";

    pub const STANDARD: [&str; 16] = [
        GITHUB_STARS,
        TOTAL_DOWNLOADS,
        CONTRIBUTORS_COUNT,
        COMMITS_COUNT,
        LATEST_VERSION,
        DESKTOP_VERSION,
        RELEASE_VERSION,
        RELEASE_DATE,
        RELEASE_NOTES_LINK,
        RELEASE_DESCRIPTION,
        DOCKER_PULLS,
        DOWNLOAD_WINDOWS_MAIN,
        DOWNLOAD_LINUX_MAIN,
        SOURCE_ZIP,
        DETECTED_PLATFORM_TEXT,
        SMART_DOWNLOAD,
    ];
}

/// Shown in counters until data arrives.
pub const LOADING: &str = "...";

const COUNTER_SUFFIXES: [&str; 4] = ["-count", "-stars", "-pulls", "-downloads"];

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    id: String,
    value: String,
}

/// Ordered set of insertion points and their current contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    slots: Vec<Slot>,
}

impl Page {
    /// A page with exactly the given insertion points. Counters start in
    /// the loading state, everything else empty.
    pub fn with_targets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                let value = if COUNTER_SUFFIXES.iter().any(|s| id.ends_with(s)) {
                    LOADING.to_string()
                } else {
                    String::new()
                };
                Slot { id, value }
            })
            .collect();
        Self { slots }
    }

    pub fn standard() -> Self {
        Self::with_targets(ids::STANDARD)
    }

    /// Write `value` into `id`. A page without that insertion point is left
    /// untouched; returns whether anything was written.
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => {
                slot.value = value.into();
                true
            }
            None => {
                debug!("No insertion point '{}', skipping", id);
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.value.as_str())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.slots.iter().map(|s| s.id.len()).max().unwrap_or(0);
        for slot in &self.slots {
            if slot.value.is_empty() {
                continue;
            }
            writeln!(f, "{:<width$}  {}", slot.id, slot.value, width = width)?;
        }
        Ok(())
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for slot in &self.slots {
            map.serialize_entry(&slot.id, &slot.value)?;
        }
        map.end()
    }
}
