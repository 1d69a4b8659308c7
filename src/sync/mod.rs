//! Plugin synchronization.
//!
//! Drives a [`TaskManager`](crate::execution::TaskManager) over a
//! [`Manifest`](crate::core::manifest::Manifest): fetch everything
//! concurrently, run hooks, then prune what the manifest no longer names.

mod cleanup;
mod engine;
mod types;

pub use cleanup::{find_stale, remove_entry};
pub use engine::Syncer;
pub use types::{FetchResult, HookResult, RemovedPlugin, SyncError, SyncReport};
