//! Core identifier types.
//!
//! These types provide type-safe identifiers for launched processes and
//! the plugins they fetch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a process at launch time.
///
/// Allocated from a monotonically increasing counter owned by a
/// [`TaskManager`](crate::execution::TaskManager); never reused within one
/// manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(u64);

/// Name of a plugin, which is also the name of its directory on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginName(String);

impl ProcessId {
    /// Create a ProcessId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl PluginName {
    /// Create a new PluginName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PluginName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PluginName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_display() {
        let id = ProcessId::new(42);
        assert_eq!(format!("{}", id), "42");
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn test_process_ids_are_ordered() {
        assert!(ProcessId::new(1) < ProcessId::new(2));
    }

    #[test]
    fn test_plugin_name_creation() {
        let name = PluginName::new("vim-surround");
        assert_eq!(name.as_str(), "vim-surround");
        assert_eq!(format!("{}", name), "vim-surround");
    }

    #[test]
    fn test_plugin_name_from_str() {
        let n1: PluginName = "nerdtree".into();
        let n2 = PluginName::new("nerdtree");
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_ids_are_hashable() {
        use std::collections::HashSet;

        let mut ids: HashSet<ProcessId> = HashSet::new();
        ids.insert(ProcessId::new(1));
        ids.insert(ProcessId::new(2));
        ids.insert(ProcessId::new(1)); // duplicate

        assert_eq!(ids.len(), 2);
    }
}
