//! Key-value backends for the cache.
//!
//! The interface mirrors browser local storage: string keys, string
//! values, no structure. Entry encoding is the cache's business.

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    /// All keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Process-local storage. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items()?.keys().cloned().collect())
    }
}

/// One `<key>.json` file per entry under a directory.
pub struct FileStorage<R: Runtime> {
    runtime: R,
    dir: PathBuf,
}

const EXTENSION: &str = "json";

impl<R: Runtime> FileStorage<R> {
    pub fn new(runtime: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Cache key must not be empty");
    }
    if key.starts_with('.')
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        bail!("Invalid cache key '{}'", key);
    }
    Ok(())
}

impl<R: Runtime> Storage for FileStorage<R> {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !self.runtime.exists(&path) {
            return Ok(None);
        }
        let contents = self
            .runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry {}", path.display()))?;
        Ok(Some(contents))
    }

    #[tracing::instrument(skip(self, value))]
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.runtime
            .create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory {}", self.dir.display()))?;

        // Write then rename so a reader never sees half an entry
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        self.runtime.write(&tmp, value.as_bytes())?;
        if let Err(err) = self.runtime.rename(&tmp, &path) {
            if let Err(cleanup) = self.runtime.remove_file(&tmp) {
                debug!("Failed to remove {}: {:#}", tmp.display(), cleanup);
            }
            return Err(err.context(format!("Failed to store cache entry {}", path.display())));
        }
        debug!("Stored cache entry {}", path.display());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if self.runtime.exists(&path) {
            self.runtime.remove_file(&path)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn keys(&self) -> Result<Vec<String>> {
        if !self.runtime.exists(&self.dir) {
            return Ok(Vec::new());
        }
        let mut keys: Vec<String> = self
            .runtime
            .read_dir(&self.dir)?
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(EXTENSION))
            .filter_map(|p| p.file_stem()?.to_str().map(String::from))
            .filter(|k| validate_key(k).is_ok())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
