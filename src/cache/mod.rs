//! Time-boxed read-through cache.
//!
//! Entries are stored as JSON `{"data": ..., "timestamp": <epoch millis>}`
//! under string keys. An entry older than the TTL is never returned; it is
//! removed by the read that finds it. Storage and parse failures are
//! reported to the failure hook and behave like a miss.

mod clock;
mod storage;

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::observe::{FailureHook, LogHook};

pub use clock::{Clock, SystemClock};
pub use storage::{FileStorage, MemoryStorage, Storage};

#[cfg(test)]
pub use clock::MockClock;
#[cfg(test)]
pub use storage::MockStorage;

/// Five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

/// What is persisted for every key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

/// Age and freshness of a stored entry, for inspection.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EntryStatus {
    pub key: String,
    /// `None` when the stored value cannot be decoded.
    pub age_ms: Option<i64>,
    pub expired: bool,
}

pub struct TtlCache<S: Storage, C: Clock = SystemClock> {
    storage: S,
    clock: C,
    ttl_ms: i64,
    hook: Arc<dyn FailureHook>,
}

impl<S: Storage> TtlCache<S, SystemClock> {
    pub fn new(storage: S, ttl: Duration) -> Self {
        Self::with_clock(storage, SystemClock, ttl)
    }
}

impl<S: Storage, C: Clock> TtlCache<S, C> {
    pub fn with_clock(storage: S, clock: C, ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            hook: Arc::new(LogHook),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fresh value for `key`, or `None`.
    #[tracing::instrument(skip(self))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                self.hook.report(&format!("cache read {}", key), &e);
                return None;
            }
        };

        // Check freshness before committing to a shape, so stale entries of
        // an outdated shape are still evicted.
        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw)
            .with_context(|| format!("Malformed cache entry for {}", key))
        {
            Ok(entry) => entry,
            Err(e) => {
                self.hook.report(&format!("cache read {}", key), &e);
                return None;
            }
        };

        if self.is_expired(entry.timestamp) {
            debug!("Cache entry {} expired, evicting", key);
            if let Err(e) = self.storage.remove_item(key) {
                self.hook.report(&format!("cache evict {}", key), &e);
            }
            return None;
        }

        match serde_json::from_value(entry.data)
            .with_context(|| format!("Unexpected cache data for {}", key))
        {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                self.hook.report(&format!("cache read {}", key), &e);
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    #[tracing::instrument(skip(self, value))]
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value) {
            self.hook.report(&format!("cache write {}", key), &e);
        }
    }

    fn try_set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry {
            data: value,
            timestamp: self.clock.now_millis(),
        };
        let raw = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;
        self.storage.set_item(key, &raw)
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            self.hook.report(&format!("cache remove {}", key), &e);
        }
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let keys = self.storage.keys()?;
        for key in &keys {
            self.storage.remove_item(key)?;
        }
        Ok(keys.len())
    }

    /// Inspect stored entries without evicting anything.
    pub fn entries(&self) -> Result<Vec<EntryStatus>> {
        let now = self.clock.now_millis();
        let mut statuses = Vec::new();
        for key in self.storage.keys()? {
            let timestamp = self
                .storage
                .get_item(&key)?
                .and_then(|raw| serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw).ok())
                .map(|entry| entry.timestamp);
            statuses.push(EntryStatus {
                age_ms: timestamp.map(|ts| now.saturating_sub(ts)),
                expired: timestamp.is_none_or(|ts| self.is_expired(ts)),
                key,
            });
        }
        Ok(statuses)
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        self.clock.now_millis().saturating_sub(timestamp) > self.ttl_ms
    }
}
