//! Plugin records.
//!
//! A [`PluginSpec`] is one entry of the manifest: the repository URL, the
//! directory name derived from it, the version-control system used to fetch
//! it, and the flags that alter how it is fetched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;
use thiserror::Error;

use super::types::PluginName;

/// Errors that can occur when building a plugin record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    /// The URL does not end in a usable directory name.
    #[error("cannot derive a plugin name from url '{0}'")]
    NoName(String),

    /// A name override is not a single directory name.
    #[error("invalid plugin name '{0}'")]
    InvalidName(String),

    /// The URL is empty.
    #[error("plugin url is empty")]
    EmptyUrl,

    /// Unrecognised flag.
    #[error("unknown plugin flag '{0}'")]
    UnknownFlag(String),
}

/// Per-plugin fetch flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginFlag {
    /// Remove any existing checkout and clone from scratch.
    ForceClone,
    /// Fetch git submodules as well.
    WithSubmodules,
    /// Install into the deferred directory instead of the bundle directory.
    Deferred,
}

impl PluginFlag {
    /// The spelling used in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginFlag::ForceClone => "force-clone",
            PluginFlag::WithSubmodules => "with-submodules",
            PluginFlag::Deferred => "deferred",
        }
    }
}

impl FromStr for PluginFlag {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force-clone" => Ok(PluginFlag::ForceClone),
            "with-submodules" => Ok(PluginFlag::WithSubmodules),
            "deferred" => Ok(PluginFlag::Deferred),
            other => Err(PluginError::UnknownFlag(other.to_string())),
        }
    }
}

impl fmt::Display for PluginFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version-control system a plugin is fetched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vcs {
    Git,
    Mercurial,
}

impl Vcs {
    /// Infer the VCS from a repository URL.
    ///
    /// `git://`, `git@`, `*.git` and GitHub URLs are git; anything else
    /// (e.g. bare bitbucket URLs) is treated as mercurial.
    pub fn infer(url: &str) -> Self {
        let trimmed = url.trim_end_matches('/');
        if trimmed.ends_with(".git")
            || trimmed.starts_with("git://")
            || trimmed.starts_with("git@")
            || trimmed.contains("github.com")
        {
            Vcs::Git
        } else {
            Vcs::Mercurial
        }
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vcs::Git => f.write_str("git"),
            Vcs::Mercurial => f.write_str("hg"),
        }
    }
}

/// A plugin to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    url: String,
    name: PluginName,
    vcs: Vcs,
    flags: BTreeSet<PluginFlag>,
}

impl PluginSpec {
    /// Build a plugin record from a URL, deriving its name and VCS.
    pub fn new(
        url: impl Into<String>,
        flags: impl IntoIterator<Item = PluginFlag>,
    ) -> Result<Self, PluginError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(PluginError::EmptyUrl);
        }
        let name = derive_name(&url).ok_or_else(|| PluginError::NoName(url.clone()))?;
        let vcs = Vcs::infer(&url);

        Ok(Self {
            url,
            name,
            vcs,
            flags: flags.into_iter().collect(),
        })
    }

    /// Override the VCS inferred from the URL.
    pub fn with_vcs(mut self, vcs: Vcs) -> Self {
        self.vcs = vcs;
        self
    }

    /// Override the directory name derived from the URL.
    ///
    /// The name must be a single path component, the same rule derived
    /// names follow.
    pub fn with_name(mut self, name: impl Into<PluginName>) -> Result<Self, PluginError> {
        let name = name.into();
        if !is_valid_name(name.as_str()) {
            return Err(PluginError::InvalidName(name.as_str().to_string()));
        }
        self.name = name;
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &PluginName {
        &self.name
    }

    pub fn vcs(&self) -> Vcs {
        self.vcs
    }

    pub fn flags(&self) -> &BTreeSet<PluginFlag> {
        &self.flags
    }

    /// Check whether a flag is set.
    pub fn has_flag(&self, flag: PluginFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the plugin goes into the deferred directory.
    pub fn is_deferred(&self) -> bool {
        self.has_flag(PluginFlag::Deferred)
    }
}

/// Last path segment of the URL without a trailing `.git`.
fn derive_name(url: &str) -> Option<PluginName> {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    is_valid_name(name).then(|| PluginName::new(name))
}

/// Exactly one normal path component, with no separators.
fn is_valid_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}
