//! Task manager integration tests.
//!
//! Exercises the public launch/wait API against real shell processes.

#![cfg(unix)]

use plugsync::{Completion, ProcessId, TaskCommand, TaskManager};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Collects every completion handed to the callback.
fn collect(manager: &mut TaskManager) -> Arc<Mutex<Vec<Completion>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.on_completion(move |c| sink.lock().unwrap().push(c.clone()));
    seen
}

#[tokio::test]
async fn test_each_launch_gets_one_callback_with_its_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let ids: Vec<ProcessId> = (0..8)
        .map(|i| manager.launch(format!("echo task-{}", i)))
        .collect();
    let summary = manager.wait().await;

    assert_eq!(summary.completed, 8);
    assert!(summary.all_succeeded());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 8);
    let seen_ids: HashSet<ProcessId> = seen.iter().map(Completion::id).collect();
    assert_eq!(seen_ids, ids.iter().copied().collect());

    for completion in seen.iter() {
        let index = ids.iter().position(|id| *id == completion.id()).unwrap();
        assert_eq!(completion.output_text(), format!("task-{}\n", index));
    }
}

#[tokio::test]
async fn test_ids_never_reused_across_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let mut all = HashSet::new();

    for _ in 0..3 {
        for _ in 0..100 {
            assert!(all.insert(manager.launch("true")));
        }
        let summary = manager.wait().await;
        assert_eq!(summary.completed, 100);
    }

    assert_eq!(all.len(), 300);
    assert_eq!(manager.launched(), 300);
    assert_eq!(manager.pending(), 0);
}

#[tokio::test]
async fn test_fast_task_reported_before_slow_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let slow = manager.launch("sleep 1");
    let fast = manager.launch("true");

    let started = Instant::now();
    manager.wait().await;

    assert!(started.elapsed() >= Duration::from_millis(900));
    let order: Vec<ProcessId> = seen.lock().unwrap().iter().map(Completion::id).collect();
    assert_eq!(order, [fast, slow]);
}

#[tokio::test]
async fn test_missing_program_fails_without_affecting_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let before = manager.launch("echo before");
    let missing = manager.launch(TaskCommand::argv(["plugsync-no-such-program"]));
    let missing_shell = manager.launch("plugsync-no-such-program");
    let after = manager.launch("echo after");

    let summary = manager.wait().await;

    assert_eq!(summary.completed, 4);
    let failed: HashSet<ProcessId> = summary.failed.iter().copied().collect();
    assert_eq!(failed, HashSet::from([missing, missing_shell]));

    let seen = seen.lock().unwrap();
    let by_id = |id| seen.iter().find(|c| c.id() == id).unwrap();
    assert!(by_id(missing).outcome().is_spawn_failure());
    assert!(by_id(missing).output().is_empty());
    assert_eq!(by_id(missing_shell).outcome().exit_code(), Some(127));
    assert_eq!(by_id(before).output_text(), "before\n");
    assert_eq!(by_id(after).output_text(), "after\n");
}

#[tokio::test]
async fn test_concurrent_large_outputs_stay_separate() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());

    // Each process writes well past a pipe buffer to both streams.
    let ids: Vec<ProcessId> = (0..20)
        .map(|i| {
            manager.launch(format!(
                "yes out-{i} | head -n 20000; yes err-{i} | head -n 2000 >&2"
            ))
        })
        .collect();

    let summary = manager.wait().await;
    assert!(summary.all_succeeded());

    for (i, id) in ids.into_iter().enumerate() {
        let output = manager.output(id).unwrap();
        let text = String::from_utf8_lossy(&output);
        let out_line = format!("out-{}", i);
        let err_line = format!("err-{}", i);

        assert_eq!(text.lines().filter(|l| *l == out_line).count(), 20000);
        assert_eq!(text.lines().filter(|l| *l == err_line).count(), 2000);
        assert_eq!(text.lines().count(), 22000);
    }
}

#[tokio::test]
async fn test_wait_with_nothing_launched_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let summary = tokio::time::timeout(Duration::from_millis(100), manager.wait())
        .await
        .unwrap();

    assert_eq!(summary.completed, 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_echo_and_delayed_echo() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let a = manager.launch("echo A");
    let b = manager.launch("echo B");
    let c = manager.launch("sleep 0.1 && echo C");
    manager.wait().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].id(), c);
    assert_eq!(seen[2].output_text(), "C\n");

    let first_two: HashSet<ProcessId> = seen[..2].iter().map(Completion::id).collect();
    assert_eq!(first_two, HashSet::from([a, b]));
    for completion in &seen[..2] {
        let expected = if completion.id() == a { "A\n" } else { "B\n" };
        assert_eq!(completion.output_text(), expected);
    }
}

#[tokio::test]
async fn test_next_completion_bypasses_callback() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = TaskManager::new(dir.path());
    let seen = collect(&mut manager);

    let first = manager.launch("echo first");
    let completion = manager.next_completion().await.unwrap();
    assert_eq!(completion.id(), first);

    manager.launch("echo second");
    manager.wait().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].output_text(), "second\n");
    assert!(manager.next_completion().await.is_none());
}

#[tokio::test]
async fn test_processes_run_in_base_dir_unless_overridden() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("marker"), "").unwrap();
    std::fs::write(dir.path().join("sub/inner"), "").unwrap();

    let mut manager = TaskManager::new(dir.path());
    let base = manager.launch("ls");
    let sub = manager.launch_in("ls", "sub");
    manager.wait().await;

    assert_eq!(String::from_utf8_lossy(&manager.output(base).unwrap()), "marker\nsub\n");
    assert_eq!(String::from_utf8_lossy(&manager.output(sub).unwrap()), "inner\n");
}
