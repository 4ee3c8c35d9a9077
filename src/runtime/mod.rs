//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over the few system
//! operations the crate needs, so the cache and commands can be tested
//! against a mock.
//!
//! # Structure
//!
//! - `env` - Well-known directories
//! - `fs` - File system operations (read, write, directory)
//! - `user` - User interaction (confirmation prompts)

mod env;
mod fs;
mod user;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    // Directories
    fn cache_dir(&self) -> Option<PathBuf>;

    // User interaction
    /// Prompt user for confirmation. Returns true if user confirms (y/yes), false otherwise.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir_impl()
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirm_impl(prompt)
    }
}

/// Lets the cache storage and a command share one runtime.
impl<R: Runtime + ?Sized> Runtime for Arc<R> {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        (**self).write(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        (**self).read_to_string(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (**self).create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        (**self).cache_dir()
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        (**self).confirm(prompt)
    }
}
