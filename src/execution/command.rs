//! External command descriptions.
//!
//! A [`TaskCommand`] is what the [`TaskManager`](super::TaskManager) launches:
//! either a shell string handed to the host shell, or an explicit argument
//! vector executed directly, plus an optional working directory that
//! overrides the manager's base directory.
//!
//! ```rust
//! use plugsync::TaskCommand;
//!
//! // Runs through `sh -c` (or `cmd /C` on Windows)
//! let update = TaskCommand::shell("git pull").working_dir("bundle/vim-surround");
//!
//! // Runs `git` directly, no shell involved
//! let clone = TaskCommand::argv(["git", "clone", "https://github.com/tpope/vim-surround.git"]);
//!
//! assert_eq!(update.to_string(), "git pull");
//! assert_eq!(clone.to_string(), "git clone https://github.com/tpope/vim-surround.git");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::environment::Environment;

/// How the command line is handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Interpreted by the host shell.
    Shell(String),
    /// Program followed by its arguments.
    Argv(Vec<String>),
}

/// A command to launch as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    line: CommandLine,
    working_dir: Option<PathBuf>,
}

impl TaskCommand {
    /// A command interpreted by the host shell.
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            line: CommandLine::Shell(command.into()),
            working_dir: None,
        }
    }

    /// A program and its arguments, executed without a shell.
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line: CommandLine::Argv(args.into_iter().map(Into::into).collect()),
            working_dir: None,
        }
    }

    /// Run in `dir` instead of the manager's base directory.
    ///
    /// Relative paths are resolved against the base directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Get the command line.
    pub fn line(&self) -> &CommandLine {
        &self.line
    }

    /// Get the working-directory override, if any.
    pub fn working_dir_override(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Directory the process runs in, given the manager's base directory.
    pub fn resolve_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }

    /// Build the tokio command with both output streams piped.
    ///
    /// Returns `None` for an empty argument vector.
    pub(crate) fn to_command(&self, dir: &Path, environment: &Environment) -> Option<Command> {
        let mut cmd = match &self.line {
            CommandLine::Shell(line) => shell_command(line),
            CommandLine::Argv(args) => {
                let (program, rest) = args.split_first()?;
                let mut cmd = Command::new(program);
                cmd.args(rest);
                cmd
            }
        };

        for (key, value) in environment.iter() {
            cmd.env(key, value);
        }

        cmd.current_dir(dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        Some(cmd)
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

impl From<&str> for TaskCommand {
    fn from(s: &str) -> Self {
        Self::shell(s)
    }
}

impl From<String> for TaskCommand {
    fn from(s: String) -> Self {
        Self::shell(s)
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            CommandLine::Shell(line) => f.write_str(line),
            CommandLine::Argv(args) => f.write_str(&args.join(" ")),
        }
    }
}
