//! Common test utilities shared across integration tests.

use async_trait::async_trait;
use plugsync::{Event, EventHandler};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Recording event handler for verifying events.
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}

/// Whether a usable `git` is on the PATH.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "plugsync")
        .env("GIT_AUTHOR_EMAIL", "plugsync@example.com")
        .env("GIT_COMMITTER_NAME", "plugsync")
        .env("GIT_COMMITTER_EMAIL", "plugsync@example.com")
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
}

/// Create an upstream repository `<parent>/<name>.git` with one committed file.
///
/// Returns the repository path, usable directly as a plugin URL.
pub fn upstream_repo(parent: &Path, name: &str) -> PathBuf {
    let repo = parent.join(format!("{}.git", name));
    std::fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-q"]);
    commit_file(&repo, "plugin.vim", &format!("\" {}\n", name));
    repo
}

/// Write `file` in `repo` and commit it.
pub fn commit_file(repo: &Path, file: &str, contents: &str) {
    std::fs::write(repo.join(file), contents).unwrap();
    git(repo, &["add", file]);
    git(repo, &["commit", "-q", "-m", file]);
}
