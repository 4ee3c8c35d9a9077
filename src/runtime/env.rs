//! Well-known directories.

use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn cache_dir_impl(&self) -> Option<PathBuf> {
        dirs::cache_dir()
    }
}
