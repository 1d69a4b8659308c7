//! Configuration error types.
//!
//! This module defines error types for manifest loading and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::plugin::PluginError;

/// Errors that can occur when loading a manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the manifest file.
    #[error("failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Failed to parse YAML from a specific file.
    #[error("YAML parse error in '{path}': {source}")]
    YamlFileError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A line of a plain-text plugin list could not be parsed.
    #[error("line {line}: {source}")]
    ListLineError {
        line: usize,
        #[source]
        source: PluginError,
    },

    /// A plugin entry is invalid.
    #[error("invalid plugin: {0}")]
    Plugin(#[from] PluginError),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(String),
}
