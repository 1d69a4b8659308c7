//! The plugin manifest.
//!
//! A [`Manifest`] is the explicit configuration value handed to the sync
//! orchestrator: where plugins live, which plugins to install (in order),
//! which fixups to run after fetching, and which extra environment variables
//! the fetch commands see.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::environment::Environment;
use super::plugin::PluginSpec;
use super::types::PluginName;

/// Default directory for regular plugins, relative to the sync root.
pub const DEFAULT_BUNDLE_DIR: &str = "bundle";

/// Default directory for deferred plugins, relative to the sync root.
pub const DEFAULT_DEFERRED_DIR: &str = "ipi";

/// A post-fetch command run inside one plugin's checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    /// Plugin whose checkout the command runs in.
    pub plugin: PluginName,
    /// Shell command.
    pub command: String,
}

/// Everything needed to sync one plugin tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    bundle_dir: PathBuf,
    deferred_dir: PathBuf,
    plugins: Vec<PluginSpec>,
    hooks: Vec<Hook>,
    environment: Environment,
}

impl Manifest {
    /// Create a manifest with the default directories.
    pub fn new(plugins: Vec<PluginSpec>) -> Self {
        Self {
            bundle_dir: PathBuf::from(DEFAULT_BUNDLE_DIR),
            deferred_dir: PathBuf::from(DEFAULT_DEFERRED_DIR),
            plugins,
            hooks: Vec::new(),
            environment: Environment::new(),
        }
    }

    /// Set the directory regular plugins are installed into.
    pub fn with_bundle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundle_dir = dir.into();
        self
    }

    /// Set the directory deferred plugins are installed into.
    pub fn with_deferred_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.deferred_dir = dir.into();
        self
    }

    /// Add a post-fetch hook.
    pub fn with_hook(mut self, plugin: impl Into<PluginName>, command: impl Into<String>) -> Self {
        self.hooks.push(Hook {
            plugin: plugin.into(),
            command: command.into(),
        });
        self
    }

    /// Set extra environment variables for fetch and hook commands.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    pub fn deferred_dir(&self) -> &Path {
        &self.deferred_dir
    }

    pub fn plugins(&self) -> &[PluginSpec] {
        &self.plugins
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Directory a plugin is installed into, relative to the sync root.
    pub fn target_dir(&self, plugin: &PluginSpec) -> &Path {
        if plugin.is_deferred() {
            &self.deferred_dir
        } else {
            &self.bundle_dir
        }
    }

    /// Look up a plugin by name.
    pub fn plugin(&self, name: &PluginName) -> Option<&PluginSpec> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Distinct target directories, bundle directory first.
    pub fn target_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![self.bundle_dir.as_path()];
        if self.deferred_dir != self.bundle_dir {
            dirs.push(self.deferred_dir.as_path());
        }
        dirs
    }

    /// Names of the plugins installed into `dir`.
    pub fn names_in(&self, dir: &Path) -> BTreeSet<PluginName> {
        self.plugins
            .iter()
            .filter(|p| self.target_dir(p) == dir)
            .map(|p| p.name().clone())
            .collect()
    }

    /// Number of plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the manifest lists no plugins.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
