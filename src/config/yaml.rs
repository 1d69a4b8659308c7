//! YAML manifest parsing.
//!
//! Parses the plugin manifest (`plugins.yaml`):
//!
//! ```yaml
//! bundle_dir: bundle
//! deferred_dir: ipi
//! environment:
//!   GIT_TERMINAL_PROMPT: "0"
//! plugins:
//!   - git://github.com/tpope/vim-surround.git
//!   - https://bitbucket.org/kotarak/vimclojure force-clone
//!   - url: git://github.com/kevinw/pyflakes-vim.git
//!     flags: [with-submodules]
//! post_fetch:
//!   - plugin: vimclojure
//!     command: cp -R vim/* .
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path};

use crate::core::plugin::{PluginFlag, Vcs};

use super::error::ConfigError;

/// Manifest file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Directory for regular plugins.
    pub bundle_dir: Option<String>,
    /// Directory for deferred plugins.
    pub deferred_dir: Option<String>,
    /// Extra environment variables for fetch commands.
    pub environment: HashMap<String, String>,
    /// Plugins to install, in order.
    pub plugins: Vec<PluginConfig>,
    /// Commands to run after all fetches finish.
    pub post_fetch: Vec<HookConfig>,
}

/// One plugin entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginConfig {
    /// `url [flag ...]` on one line.
    Simple(String),
    /// Mapping with explicit fields.
    Detailed {
        /// Repository URL.
        url: String,
        /// Fetch flags.
        #[serde(default)]
        flags: Vec<PluginFlag>,
        /// Directory name, if it should differ from the one in the URL.
        name: Option<String>,
        /// VCS, if it should differ from the one inferred from the URL.
        vcs: Option<Vcs>,
    },
}

/// Post-fetch hook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Plugin whose checkout the command runs in.
    pub plugin: String,
    /// Shell command to run.
    pub command: String,
}

/// YAML manifest loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load a manifest from a YAML file.
    pub fn load_manifest_config(path: impl AsRef<Path>) -> Result<ManifestConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config: ManifestConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate_manifest_config(&config)?;
        Ok(config)
    }

    /// Parse a manifest from a YAML string.
    pub fn parse_manifest_config(yaml: &str) -> Result<ManifestConfig, ConfigError> {
        let config: ManifestConfig = serde_yaml::from_str(yaml)?;
        Self::validate_manifest_config(&config)?;
        Ok(config)
    }

    /// Field-level checks; cross-entry checks happen when the manifest is built.
    /// Plugin directories are relative paths made only of normal
    /// components, so they always land below the sync root.
    fn validate_target_dir(field: &str, dir: &str) -> Result<(), ConfigError> {
        if dir.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(format!("{} cannot be empty", field)));
        }

        if !Path::new(dir)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ConfigError::InvalidConfig(format!(
                "{} '{}' must be a relative path below the sync root",
                field, dir
            )));
        }

        Ok(())
    }

    fn validate_manifest_config(config: &ManifestConfig) -> Result<(), ConfigError> {
        if let Some(dir) = &config.bundle_dir {
            Self::validate_target_dir("bundle_dir", dir)?;
        }

        if let Some(dir) = &config.deferred_dir {
            Self::validate_target_dir("deferred_dir", dir)?;
        }

        for plugin in &config.plugins {
            if let PluginConfig::Detailed { url, .. } = plugin
                && url.trim().is_empty()
            {
                return Err(ConfigError::MissingField("url".into()));
            }
        }

        for hook in &config.post_fetch {
            if hook.plugin.trim().is_empty() {
                return Err(ConfigError::MissingField("post_fetch.plugin".into()));
            }
            if hook.command.trim().is_empty() {
                return Err(ConfigError::MissingField("post_fetch.command".into()));
            }
        }

        Ok(())
    }
}
