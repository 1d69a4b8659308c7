//! Sync engine.
//!
//! A sync run:
//! - Creates the plugin directories
//! - Launches one fetch per plugin, all concurrently
//! - Runs post-fetch hooks once every fetch has finished
//! - Removes directories of plugins dropped from the manifest
//! - Emits events for each step

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::load_manifest;
use crate::core::manifest::Manifest;
use crate::events::{Event, EventBus};
use crate::execution::{FetchAction, FetchPlan, TaskCommand, TaskManager};

use super::cleanup::{find_stale, remove_entry};
use super::types::{FetchResult, HookResult, RemovedPlugin, SyncError, SyncReport};

/// Brings the plugin directories under `root` in line with a manifest.
pub struct Syncer {
    root: PathBuf,
    manifest: Manifest,
    event_bus: Arc<EventBus>,
    clean: bool,
}

impl Syncer {
    /// Create a syncer that installs into directories under `root`.
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            root: root.into(),
            manifest,
            event_bus: Arc::new(EventBus::new()),
            clean: true,
        }
    }

    /// Load the manifest at `path` and create a syncer for it.
    pub fn from_manifest_file(
        root: impl Into<PathBuf>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SyncError> {
        Ok(Self::new(root, load_manifest(path)?))
    }

    /// Set the event bus for lifecycle events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Enable or disable removal of stale plugins after fetching.
    pub fn with_cleanup(mut self, enabled: bool) -> Self {
        self.clean = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Get a reference to the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Run a full sync.
    ///
    /// Individual fetch or hook failures are recorded in the report; only
    /// directory errors abort the run.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        info!(
            plugins = self.manifest.len(),
            root = %self.root.display(),
            "starting sync"
        );
        self.event_bus
            .emit(Event::sync_started(self.manifest.len()))
            .await;

        self.bootstrap().await?;

        let mut report = SyncReport {
            fetches: self.fetch_all().await,
            ..SyncReport::default()
        };
        report.hooks = self.run_hooks().await;

        if self.clean {
            report.removed = self.clean_stale().await?;
        }
        report.duration = started.elapsed();

        let failed = report.failed().len();
        info!(
            fetched = report.fetches.len() - failed,
            failed,
            removed = report.removed.len(),
            duration_ms = report.duration.as_millis() as u64,
            "sync finished"
        );
        self.event_bus
            .emit(Event::sync_completed(
                report.success(),
                report.fetches.len() - failed,
                failed,
                report.removed.len(),
                report.duration,
            ))
            .await;

        Ok(report)
    }

    /// Create the bundle and deferred directories.
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        for dir in self.manifest.target_dirs() {
            let path = self.root.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| SyncError::Bootstrap {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Launch every fetch and collect the results as they finish.
    async fn fetch_all(&self) -> Vec<FetchResult> {
        // Plans hold root-relative paths; the manager resolves them.
        let mut manager = TaskManager::new(&self.root)
            .with_environment(self.manifest.environment().clone());
        let mut plans = HashMap::with_capacity(self.manifest.len());

        for plugin in self.manifest.plugins() {
            let target_dir = self.manifest.target_dir(plugin);
            let present = self
                .root
                .join(target_dir)
                .join(plugin.name().as_str())
                .is_dir();
            let plan = FetchPlan::new(plugin, target_dir, present);

            if plan.action() == FetchAction::Reclone {
                let checkout = self.root.join(plan.checkout_dir());
                if let Err(e) = tokio::fs::remove_dir_all(&checkout).await {
                    // The clone will fail on the leftover directory and be reported.
                    warn!(
                        plugin = %plugin.name(),
                        path = %checkout.display(),
                        error = %e,
                        "failed to remove checkout before re-cloning"
                    );
                }
            }

            let id = manager.launch(plan.command().clone());
            self.event_bus
                .emit(Event::fetch_launched(plugin.name().clone(), id, plan.action()))
                .await;
            plans.insert(id, plan);
        }

        let mut results = Vec::with_capacity(plans.len());
        while let Some(completion) = manager.next_completion().await {
            let Some(plan) = plans.remove(&completion.id()) else {
                continue;
            };

            let result = FetchResult {
                plugin: plan.plugin().name().clone(),
                process: completion.id(),
                action: plan.action(),
                outcome: completion.outcome().clone(),
                output: completion.output_text().into_owned(),
                duration: completion.duration(),
            };

            let event = match result.error() {
                None => Event::fetch_completed(
                    result.plugin.clone(),
                    result.process,
                    result.output.clone(),
                    result.duration,
                ),
                Some(error) => Event::fetch_failed(
                    result.plugin.clone(),
                    result.process,
                    error,
                    result.output.clone(),
                    result.outcome.exit_code(),
                ),
            };
            self.event_bus.emit(event).await;
            results.push(result);
        }

        results
    }

    /// Run post-fetch hooks one at a time, in manifest order.
    async fn run_hooks(&self) -> Vec<HookResult> {
        let mut manager = TaskManager::new(&self.root)
            .with_environment(self.manifest.environment().clone());
        let mut results = Vec::with_capacity(self.manifest.hooks().len());

        for hook in self.manifest.hooks() {
            let Some(plugin) = self.manifest.plugin(&hook.plugin) else {
                continue;
            };
            let checkout = self
                .manifest
                .target_dir(plugin)
                .join(plugin.name().as_str());

            if !self.root.join(&checkout).is_dir() {
                debug!(plugin = %hook.plugin, "no checkout, skipping hook");
                results.push(HookResult {
                    plugin: hook.plugin.clone(),
                    command: hook.command.clone(),
                    outcome: None,
                    output: String::new(),
                });
                continue;
            }

            manager.launch_in(TaskCommand::shell(hook.command.as_str()), checkout);
            let Some(completion) = manager.next_completion().await else {
                continue;
            };

            let result = HookResult {
                plugin: hook.plugin.clone(),
                command: hook.command.clone(),
                outcome: Some(completion.outcome().clone()),
                output: completion.output_text().into_owned(),
            };
            self.event_bus
                .emit(Event::hook_completed(
                    result.plugin.clone(),
                    result.command.clone(),
                    result.success(),
                    result.output.clone(),
                ))
                .await;
            results.push(result);
        }

        results
    }

    /// Entries in the plugin directories that the manifest does not name.
    ///
    /// A target directory nested inside another is never reported as stale.
    pub async fn stale_plugins(&self) -> Result<Vec<RemovedPlugin>, SyncError> {
        let target_dirs: Vec<PathBuf> = self
            .manifest
            .target_dirs()
            .into_iter()
            .map(|dir| self.root.join(dir))
            .collect();

        let mut stale = Vec::new();
        for dir in self.manifest.target_dirs() {
            let expected = self.manifest.names_in(dir);
            let found = find_stale(&self.root.join(dir), &expected).await?;
            stale.extend(
                found
                    .into_iter()
                    .filter(|entry| !target_dirs.contains(&entry.path)),
            );
        }
        Ok(stale)
    }

    /// Delete every stale entry and report what was removed.
    pub async fn clean_stale(&self) -> Result<Vec<RemovedPlugin>, SyncError> {
        let stale = self.stale_plugins().await?;
        for entry in &stale {
            remove_entry(entry).await?;
            info!(plugin = %entry.name, "removed plugin no longer in manifest");
            self.event_bus
                .emit(Event::plugin_removed(entry.name.clone(), entry.path.clone()))
                .await;
        }
        Ok(stale)
    }
}
