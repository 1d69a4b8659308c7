//! Manifest loading and parsing.
//!
//! This module reads the plugin manifest from YAML or from a plain-text
//! list and turns it into a validated [`Manifest`](crate::core::manifest::Manifest).

mod builder;
mod error;
mod list;
mod yaml;

pub use builder::{ManifestBuilder, ManifestFormat, load_manifest};
pub use error::ConfigError;
pub use list::{parse_entry, parse_plugin_list};
pub use yaml::{HookConfig, ManifestConfig, PluginConfig, YamlLoader};
