//! End-to-end sync tests.
//!
//! Syncs against git repositories created in a temporary directory. Tests
//! that need git return early when it is not installed.

#![cfg(unix)]

use crate::common::{RecordingHandler, commit_file, git_available, upstream_repo};
use plugsync::{
    Event, EventBus, FetchAction, Manifest, PluginSpec, Syncer, load_manifest, parse_entry,
};
use std::io::Write;
use std::path::Path;

fn local_plugin(url: &Path, flags: &str) -> PluginSpec {
    parse_entry(&format!("{} {}", url.display(), flags)).unwrap()
}

#[tokio::test]
async fn test_sync_clones_then_updates() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let surround = upstream_repo(upstream.path(), "vim-surround");
    let pad = upstream_repo(upstream.path(), "vim-pad");

    let manifest = Manifest::new(vec![
        local_plugin(&surround, ""),
        local_plugin(&pad, "deferred"),
    ]);

    let report = Syncer::new(root.path(), manifest.clone())
        .run()
        .await
        .unwrap();
    assert!(report.success(), "{:?}", report.failed());
    assert_eq!(report.fetch("vim-surround").unwrap().action, FetchAction::Clone);
    assert!(root.path().join("bundle/vim-surround/plugin.vim").is_file());
    assert!(root.path().join("ipi/vim-pad/plugin.vim").is_file());

    commit_file(&surround, "autoload.vim", "\" new\n");

    let report = Syncer::new(root.path(), manifest).run().await.unwrap();
    assert!(report.success(), "{:?}", report.failed());
    assert_eq!(report.fetch("vim-surround").unwrap().action, FetchAction::Update);
    assert_eq!(report.fetch("vim-pad").unwrap().action, FetchAction::Update);
    assert!(root.path().join("bundle/vim-surround/autoload.vim").is_file());
}

#[tokio::test]
async fn test_force_clone_replaces_checkout() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let clojure = upstream_repo(upstream.path(), "vimclojure");
    let manifest = Manifest::new(vec![local_plugin(&clojure, "force-clone")]);

    Syncer::new(root.path(), manifest.clone())
        .run()
        .await
        .unwrap();
    let local_edit = root.path().join("bundle/vimclojure/local-edit");
    std::fs::write(&local_edit, "scratch").unwrap();

    let report = Syncer::new(root.path(), manifest).run().await.unwrap();

    assert!(report.success(), "{:?}", report.failed());
    assert_eq!(report.fetch("vimclojure").unwrap().action, FetchAction::Reclone);
    assert!(!local_edit.exists());
    assert!(root.path().join("bundle/vimclojure/plugin.vim").is_file());
}

#[tokio::test]
async fn test_failed_fetch_does_not_stop_others() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let good = upstream_repo(upstream.path(), "nerdtree");
    let missing = upstream.path().join("vanished.git");

    let manifest = Manifest::new(vec![local_plugin(&missing, ""), local_plugin(&good, "")]);
    let report = Syncer::new(root.path(), manifest).run().await.unwrap();

    assert!(!report.success());
    assert_eq!(report.fetches.len(), 2);
    let failed = report.fetch("vanished").unwrap();
    assert!(!failed.success());
    assert!(failed.error().is_some());
    assert!(!failed.output.is_empty());
    assert!(report.fetch("nerdtree").unwrap().success());
    assert!(root.path().join("bundle/nerdtree/plugin.vim").is_file());
}

#[tokio::test]
async fn test_sync_removes_dropped_plugins_and_runs_hooks() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let tabular = upstream_repo(upstream.path(), "tabular");
    std::fs::create_dir_all(root.path().join("bundle/AutoClose")).unwrap();
    std::fs::create_dir_all(root.path().join("ipi/old-deferred")).unwrap();
    std::fs::create_dir_all(root.path().join("bundle/.cache")).unwrap();

    let manifest = Manifest::new(vec![local_plugin(&tabular, "")])
        .with_hook("tabular", "cp plugin.vim copied.vim");

    let handler = RecordingHandler::new();
    let bus = EventBus::new();
    bus.register(handler.clone()).await;

    let report = Syncer::new(root.path(), manifest)
        .with_event_bus(bus)
        .run()
        .await
        .unwrap();

    assert!(report.success());
    let removed: Vec<&str> = report.removed.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(removed, ["AutoClose", "old-deferred"]);
    assert!(!root.path().join("bundle/AutoClose").exists());
    assert!(root.path().join("bundle/.cache").is_dir());
    assert!(root.path().join("bundle/tabular/copied.vim").is_file());

    let events = handler.events().await;
    assert!(matches!(events.first(), Some(Event::SyncStarted { plugin_count: 1, .. })));
    assert!(matches!(
        events.last(),
        Some(Event::SyncCompleted { success: true, removed: 2, .. })
    ));
    let launched = events
        .iter()
        .filter(|e| matches!(e, Event::FetchLaunched { .. }))
        .count();
    let hooks = events
        .iter()
        .filter(|e| matches!(e, Event::HookCompleted { success: true, .. }))
        .count();
    assert_eq!(launched, 1);
    assert_eq!(hooks, 1);
}

#[tokio::test]
async fn test_sync_from_plain_text_list() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let repeat = upstream_repo(upstream.path(), "vim-repeat");
    let endwise = upstream_repo(upstream.path(), "vim-endwise");

    let list = root.path().join("plugins.txt");
    let mut file = std::fs::File::create(&list).unwrap();
    writeln!(file, "# repeat plugin maps with .").unwrap();
    writeln!(file, "{}", repeat.display()).unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{} deferred", endwise.display()).unwrap();
    drop(file);

    let manifest = load_manifest(&list).unwrap();
    let report = Syncer::new(root.path(), manifest)
        .with_cleanup(false)
        .run()
        .await
        .unwrap();

    assert!(report.success(), "{:?}", report.failed());
    assert!(root.path().join("bundle/vim-repeat").is_dir());
    assert!(root.path().join("ipi/vim-endwise").is_dir());
    assert!(report.removed.is_empty());
}

#[tokio::test]
async fn test_manifest_environment_reaches_hooks() {
    if !git_available() {
        return;
    }
    let upstream = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let repo = upstream_repo(upstream.path(), "vim-fugitive");

    let manifest = Manifest::new(vec![local_plugin(&repo, "")])
        .with_environment(plugsync::Environment::new().with_var("PLUGSYNC_MARK", "from-manifest"))
        .with_hook("vim-fugitive", "echo \"$PLUGSYNC_MARK\"");

    let report = Syncer::new(root.path(), manifest).run().await.unwrap();

    assert!(report.success(), "{:?}", report.failed());
    assert_eq!(report.hooks.len(), 1);
    assert_eq!(report.hooks[0].output, "from-manifest\n");
}
