//! Fetch-command construction.
//!
//! Maps a [`PluginSpec`] and the state of its target directory to the
//! command that brings the checkout up to date:
//!
//! | VCS | checkout present | command | runs in |
//! |-----|------------------|---------|---------|
//! | git | no  | `git clone [--recursive] <url> <name>` | target dir |
//! | git | yes | `git pull [&& git submodule update --init --recursive]` | checkout |
//! | hg  | no  | `hg clone <url> <name>` | target dir |
//! | hg  | yes | `hg pull -u` | checkout |
//!
//! `force-clone` always plans a fresh clone; the caller removes the existing
//! checkout first (see [`FetchAction::Reclone`]).

use std::path::{Path, PathBuf};

use crate::core::plugin::{PluginFlag, PluginSpec, Vcs};

use super::command::TaskCommand;

/// What a fetch does to the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAction {
    /// No checkout yet; clone it.
    Clone,
    /// Existing checkout; pull into it.
    Update,
    /// Existing checkout that must be deleted before cloning again.
    Reclone,
}

/// A planned fetch for one plugin.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    plugin: PluginSpec,
    target_dir: PathBuf,
    action: FetchAction,
    command: TaskCommand,
}

impl FetchPlan {
    /// Plan a fetch, checking the disk for an existing checkout.
    pub fn inspect(plugin: &PluginSpec, target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = target_dir.into();
        let present = target_dir.join(plugin.name().as_str()).is_dir();
        Self::new(plugin, target_dir, present)
    }

    /// Plan a fetch given whether the checkout already exists.
    pub fn new(plugin: &PluginSpec, target_dir: impl Into<PathBuf>, present: bool) -> Self {
        let target_dir = target_dir.into();
        let action = match (present, plugin.has_flag(PluginFlag::ForceClone)) {
            (false, _) => FetchAction::Clone,
            (true, true) => FetchAction::Reclone,
            (true, false) => FetchAction::Update,
        };

        let checkout = target_dir.join(plugin.name().as_str());
        let command = match action {
            FetchAction::Clone | FetchAction::Reclone => {
                clone_command(plugin).working_dir(&target_dir)
            }
            FetchAction::Update => update_command(plugin).working_dir(checkout),
        };

        Self {
            plugin: plugin.clone(),
            target_dir,
            action,
            command,
        }
    }

    pub fn plugin(&self) -> &PluginSpec {
        &self.plugin
    }

    pub fn action(&self) -> FetchAction {
        self.action
    }

    pub fn command(&self) -> &TaskCommand {
        &self.command
    }

    /// Directory the plugin is installed into.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Path of the plugin's checkout.
    pub fn checkout_dir(&self) -> PathBuf {
        self.target_dir.join(self.plugin.name().as_str())
    }
}

fn clone_command(plugin: &PluginSpec) -> TaskCommand {
    let name = plugin.name().as_str();
    match plugin.vcs() {
        Vcs::Git if plugin.has_flag(PluginFlag::WithSubmodules) => {
            TaskCommand::argv(["git", "clone", "--recursive", plugin.url(), name])
        }
        Vcs::Git => TaskCommand::argv(["git", "clone", plugin.url(), name]),
        Vcs::Mercurial => TaskCommand::argv(["hg", "clone", plugin.url(), name]),
    }
}

fn update_command(plugin: &PluginSpec) -> TaskCommand {
    match plugin.vcs() {
        Vcs::Git if plugin.has_flag(PluginFlag::WithSubmodules) => {
            TaskCommand::shell("git pull && git submodule update --init --recursive")
        }
        Vcs::Git => TaskCommand::argv(["git", "pull"]),
        Vcs::Mercurial => TaskCommand::argv(["hg", "pull", "-u"]),
    }
}
