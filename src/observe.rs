//! Failure reporting.
//!
//! Fetchers and the cache never propagate errors to their callers; they
//! substitute a default and hand the error to a [`FailureHook`] instead, so
//! how loudly failures surface is decided by whoever wires things up.

use log::warn;
use std::sync::{Arc, Mutex};

#[cfg_attr(test, mockall::automock)]
pub trait FailureHook: Send + Sync {
    /// `source` names the operation that failed, e.g. `github_repo_info`.
    fn report(&self, source: &str, error: &anyhow::Error);
}

/// Reports failures through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHook;

impl FailureHook for LogHook {
    fn report(&self, source: &str, error: &anyhow::Error) {
        warn!("{}: {:#}", source, error);
    }
}

/// Logs failures and also keeps them, so a command can summarize what
/// fell back to defaults.
#[derive(Debug, Default)]
pub struct CollectingHook {
    failures: Mutex<Vec<Failure>>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Failure {
    pub source: String,
    pub message: String,
}

impl CollectingHook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<Failure> {
        match self.failures.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FailureHook for CollectingHook {
    fn report(&self, source: &str, error: &anyhow::Error) {
        LogHook.report(source, error);
        let failure = Failure {
            source: source.to_string(),
            message: format!("{:#}", error),
        };
        match self.failures.lock() {
            Ok(mut guard) => guard.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
    }
}
