//! Lifecycle events and event handling.
//!
//! This module provides event emission for the stages of a sync run, so
//! the binary (or a test) can observe fetches as they finish.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::types::{PluginName, ProcessId};
use crate::execution::FetchAction;

/// Lifecycle events emitted during a sync.
#[derive(Debug, Clone)]
pub enum Event {
    /// A sync run has started.
    SyncStarted {
        plugin_count: usize,
        timestamp: Instant,
    },

    /// A fetch process was launched for a plugin.
    FetchLaunched {
        plugin: PluginName,
        process: ProcessId,
        action: FetchAction,
        timestamp: Instant,
    },

    /// A fetch exited with status 0.
    FetchCompleted {
        plugin: PluginName,
        process: ProcessId,
        output: String,
        duration: Duration,
        timestamp: Instant,
    },

    /// A fetch could not be started or exited with a nonzero status.
    FetchFailed {
        plugin: PluginName,
        process: ProcessId,
        error: String,
        output: String,
        exit_code: Option<i32>,
        timestamp: Instant,
    },

    /// A post-fetch hook finished.
    HookCompleted {
        plugin: PluginName,
        command: String,
        success: bool,
        output: String,
        timestamp: Instant,
    },

    /// A plugin no longer in the manifest was deleted from disk.
    PluginRemoved {
        plugin: PluginName,
        path: PathBuf,
        timestamp: Instant,
    },

    /// A sync run finished.
    SyncCompleted {
        success: bool,
        fetched: usize,
        failed: usize,
        removed: usize,
        duration: Duration,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::SyncStarted { timestamp, .. } => *timestamp,
            Event::FetchLaunched { timestamp, .. } => *timestamp,
            Event::FetchCompleted { timestamp, .. } => *timestamp,
            Event::FetchFailed { timestamp, .. } => *timestamp,
            Event::HookCompleted { timestamp, .. } => *timestamp,
            Event::PluginRemoved { timestamp, .. } => *timestamp,
            Event::SyncCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Create a SyncStarted event.
    pub fn sync_started(plugin_count: usize) -> Self {
        Event::SyncStarted {
            plugin_count,
            timestamp: Instant::now(),
        }
    }

    /// Create a FetchLaunched event.
    pub fn fetch_launched(plugin: PluginName, process: ProcessId, action: FetchAction) -> Self {
        Event::FetchLaunched {
            plugin,
            process,
            action,
            timestamp: Instant::now(),
        }
    }

    /// Create a FetchCompleted event.
    pub fn fetch_completed(
        plugin: PluginName,
        process: ProcessId,
        output: String,
        duration: Duration,
    ) -> Self {
        Event::FetchCompleted {
            plugin,
            process,
            output,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a FetchFailed event.
    pub fn fetch_failed(
        plugin: PluginName,
        process: ProcessId,
        error: String,
        output: String,
        exit_code: Option<i32>,
    ) -> Self {
        Event::FetchFailed {
            plugin,
            process,
            error,
            output,
            exit_code,
            timestamp: Instant::now(),
        }
    }

    /// Create a HookCompleted event.
    pub fn hook_completed(
        plugin: PluginName,
        command: String,
        success: bool,
        output: String,
    ) -> Self {
        Event::HookCompleted {
            plugin,
            command,
            success,
            output,
            timestamp: Instant::now(),
        }
    }

    /// Create a PluginRemoved event.
    pub fn plugin_removed(plugin: PluginName, path: PathBuf) -> Self {
        Event::PluginRemoved {
            plugin,
            path,
            timestamp: Instant::now(),
        }
    }

    /// Create a SyncCompleted event.
    pub fn sync_completed(
        success: bool,
        fetched: usize,
        failed: usize,
        removed: usize,
        duration: Duration,
    ) -> Self {
        Event::SyncCompleted {
            success,
            fetched,
            failed,
            removed,
            duration,
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
