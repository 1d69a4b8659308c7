//! Plain-text plugin lists.
//!
//! One plugin per line, `url [flag ...]`. Blank lines and lines starting
//! with `#` are ignored:
//!
//! ```text
//! # Align stuff in a powerful way
//! git://github.com/godlygeek/tabular.git
//!
//! # have to force clone this one
//! https://bitbucket.org/kotarak/vimclojure force-clone
//! ```

use crate::core::plugin::{PluginError, PluginFlag, PluginSpec};

use super::error::ConfigError;
use super::yaml::ManifestConfig;
use super::yaml::PluginConfig;

/// Parse one `url [flag ...]` entry.
pub fn parse_entry(entry: &str) -> Result<PluginSpec, PluginError> {
    let mut words = entry.split_whitespace();
    let url = words.next().ok_or(PluginError::EmptyUrl)?;
    let flags = words
        .map(str::parse::<PluginFlag>)
        .collect::<Result<Vec<_>, _>>()?;
    PluginSpec::new(url, flags)
}

/// Parse a plain-text list into a manifest config with default directories.
pub fn parse_plugin_list(text: &str) -> Result<ManifestConfig, ConfigError> {
    let mut plugins = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Parse eagerly so errors carry the line number.
        parse_entry(line).map_err(|source| ConfigError::ListLineError {
            line: index + 1,
            source,
        })?;
        plugins.push(PluginConfig::Simple(line.to_string()));
    }

    Ok(ManifestConfig {
        plugins,
        ..ManifestConfig::default()
    })
}
