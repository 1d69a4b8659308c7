//! Sync result and error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::types::{PluginName, ProcessId};
use crate::execution::{FetchAction, Outcome};

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A plugin directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A plugin directory could not be listed or an entry removed.
    #[error("failed to clean '{path}': {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be loaded.
    #[error("manifest error: {0}")]
    Config(#[from] ConfigError),
}

/// Result of fetching one plugin.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Plugin that was fetched.
    pub plugin: PluginName,
    /// Process that ran the fetch.
    pub process: ProcessId,
    /// Clone, update or re-clone.
    pub action: FetchAction,
    /// How the fetch process ended.
    pub outcome: Outcome,
    /// Combined output of the fetch.
    pub output: String,
    /// Time the fetch took.
    pub duration: Duration,
}

impl FetchResult {
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Short description of why the fetch failed, if it did.
    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Exited { code: Some(0) } => None,
            Outcome::Exited { code: Some(code) } => Some(format!("exited with code {}", code)),
            Outcome::Exited { code: None } => Some("terminated by signal".to_string()),
            Outcome::SpawnFailed { error } => Some(format!("failed to start: {}", error)),
        }
    }
}

/// Result of one post-fetch hook.
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Plugin the hook belongs to.
    pub plugin: PluginName,
    /// Shell command.
    pub command: String,
    /// `None` when the hook was skipped because the checkout is missing.
    pub outcome: Option<Outcome>,
    /// Combined output of the hook.
    pub output: String,
}

impl HookResult {
    pub fn skipped(&self) -> bool {
        self.outcome.is_none()
    }

    /// Skipped hooks count as successful.
    pub fn success(&self) -> bool {
        self.outcome.as_ref().is_none_or(Outcome::is_success)
    }
}

/// A directory entry removed (or, in a dry run, that would be removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedPlugin {
    /// Entry name.
    pub name: PluginName,
    /// Full path of the entry.
    pub path: PathBuf,
}

/// Everything that happened during a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// One result per plugin, in completion order.
    pub fetches: Vec<FetchResult>,
    /// One result per hook, in manifest order.
    pub hooks: Vec<HookResult>,
    /// Stale entries deleted from the plugin directories.
    pub removed: Vec<RemovedPlugin>,
    /// Total duration of the run.
    pub duration: Duration,
}

impl SyncReport {
    /// Whether every fetch and every hook succeeded.
    pub fn success(&self) -> bool {
        self.fetches.iter().all(FetchResult::success) && self.hooks.iter().all(HookResult::success)
    }

    /// Fetches that failed.
    pub fn failed(&self) -> Vec<&FetchResult> {
        self.fetches.iter().filter(|f| !f.success()).collect()
    }

    /// Look up the fetch result for a plugin.
    pub fn fetch(&self, plugin: &str) -> Option<&FetchResult> {
        self.fetches.iter().find(|f| f.plugin.as_str() == plugin)
    }
}
