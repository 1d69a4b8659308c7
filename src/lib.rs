//! # plugsync
//!
//! Concurrently fetches, updates, and prunes editor plugin checkouts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use plugsync::{Syncer, load_manifest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = load_manifest("plugins.yaml")?;
//! let report = Syncer::new(".", manifest).run().await?;
//!
//! for fetch in &report.fetches {
//!     println!("{}: {}", fetch.plugin, fetch.success());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The process layer can be used on its own:
//!
//! ```no_run
//! use plugsync::TaskManager;
//!
//! # async fn example() {
//! let mut manager = TaskManager::new(".");
//! manager.on_completion(|c| println!("@{} {}", c.id(), c.output_text().trim()));
//! manager.launch("echo A");
//! manager.launch("sleep 0.1 && echo C");
//! manager.wait().await;
//! # }
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod execution;
pub mod sync;

pub use config::{
    ConfigError, ManifestBuilder, ManifestConfig, ManifestFormat, YamlLoader, load_manifest,
    parse_entry, parse_plugin_list,
};
pub use core::environment::Environment;
pub use core::manifest::{DEFAULT_BUNDLE_DIR, DEFAULT_DEFERRED_DIR, Hook, Manifest};
pub use core::plugin::{PluginError, PluginFlag, PluginSpec, Vcs};
pub use core::types::{PluginName, ProcessId};
pub use events::{Event, EventBus, EventHandler};
pub use execution::{
    CommandLine, Completion, FetchAction, FetchPlan, Outcome, ProcessRecord, ProcessState,
    TaskCommand, TaskManager, WaitSummary,
};
pub use sync::{FetchResult, HookResult, RemovedPlugin, SyncError, SyncReport, Syncer};
