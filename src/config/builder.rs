//! Manifest builder.
//!
//! Converts a [`ManifestConfig`] into a validated [`Manifest`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::environment::Environment;
use crate::core::manifest::Manifest;
use crate::core::plugin::PluginSpec;
use crate::core::types::PluginName;

use super::error::ConfigError;
use super::list::{parse_entry, parse_plugin_list};
use super::yaml::{ManifestConfig, PluginConfig, YamlLoader};

/// Builder for creating a Manifest from configuration.
pub struct ManifestBuilder;

impl ManifestBuilder {
    /// Build a Manifest from a ManifestConfig.
    pub fn build(config: ManifestConfig) -> Result<Manifest, ConfigError> {
        let plugins = config
            .plugins
            .iter()
            .map(Self::build_plugin)
            .collect::<Result<Vec<_>, _>>()?;

        let mut manifest =
            Manifest::new(plugins).with_environment(Environment::from_map(config.environment));

        if let Some(dir) = config.bundle_dir {
            manifest = manifest.with_bundle_dir(dir);
        }
        if let Some(dir) = config.deferred_dir {
            manifest = manifest.with_deferred_dir(dir);
        }
        for hook in config.post_fetch {
            manifest = manifest.with_hook(hook.plugin, hook.command);
        }

        Self::validate(&manifest)?;
        Ok(manifest)
    }

    /// Build a PluginSpec from a PluginConfig.
    fn build_plugin(config: &PluginConfig) -> Result<PluginSpec, ConfigError> {
        match config {
            PluginConfig::Simple(entry) => Ok(parse_entry(entry)?),
            PluginConfig::Detailed {
                url,
                flags,
                name,
                vcs,
            } => {
                let mut plugin = PluginSpec::new(url, flags.iter().copied())?;
                if let Some(name) = name {
                    plugin = plugin.with_name(name.as_str())?;
                }
                if let Some(vcs) = vcs {
                    plugin = plugin.with_vcs(*vcs);
                }
                Ok(plugin)
            }
        }
    }

    /// Checks that need the whole manifest.
    fn validate(manifest: &Manifest) -> Result<(), ConfigError> {
        // Two plugins sharing a directory would clobber each other's checkout
        let mut seen: HashSet<(&Path, &PluginName)> = HashSet::new();
        for plugin in manifest.plugins() {
            if !seen.insert((manifest.target_dir(plugin), plugin.name())) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate plugin '{}' in '{}'",
                    plugin.name(),
                    manifest.target_dir(plugin).display()
                )));
            }
        }

        for hook in manifest.hooks() {
            if manifest.plugin(&hook.plugin).is_none() {
                return Err(ConfigError::InvalidConfig(format!(
                    "post_fetch hook references unknown plugin '{}'",
                    hook.plugin
                )));
            }
        }

        Ok(())
    }
}

/// Manifest file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// YAML manifest.
    Yaml,
    /// Plain-text `url [flag ...]` list.
    List,
}

impl ManifestFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => ManifestFormat::Yaml,
            _ => ManifestFormat::List,
        }
    }
}

/// Load a manifest from a YAML or plain-text file.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest, ConfigError> {
    let path = path.as_ref();

    let config = match ManifestFormat::from_path(path) {
        ManifestFormat::Yaml => YamlLoader::load_manifest_config(path)?,
        ManifestFormat::List => {
            let content =
                std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
                    path: PathBuf::from(path),
                    source,
                })?;
            parse_plugin_list(&content)?
        }
    };

    ManifestBuilder::build(config)
}
