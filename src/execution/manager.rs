//! Concurrent task manager.
//!
//! The [`TaskManager`] launches external commands as independent child
//! processes, tracks each by a [`ProcessId`], captures each process's
//! combined output, and reports exactly one [`Completion`] per process.
//!
//! Every launched process gets its own watcher task on the tokio runtime.
//! The watcher drains stdout and stderr into a single buffer in arrival
//! order, waits for the exit status, marks the handle done, and only then
//! pushes the completion onto a channel. [`TaskManager::wait`] drains that
//! channel and invokes the registered callback from the caller's task, so a
//! slow callback never runs inside a watcher and completions that arrive
//! before `wait` (or before the callback is registered) are queued, not lost.
//!
//! A command that cannot be spawned at all does not make `launch` fail: it
//! gets an id like any other task and an immediately-queued completion with
//! [`Outcome::SpawnFailed`].
//!
//! ```no_run
//! use plugsync::TaskManager;
//!
//! # async fn run() {
//! let mut manager = TaskManager::new("bundle");
//! manager.on_completion(|done| {
//!     println!("@{} {}", done.id(), done.output_text().trim());
//! });
//!
//! manager.launch("git clone https://github.com/tpope/vim-surround.git");
//! manager.launch("git clone https://github.com/tpope/vim-repeat.git");
//!
//! let summary = manager.wait().await;
//! assert_eq!(summary.completed, 2);
//! # }
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, warn};

use crate::core::environment::Environment;
use crate::core::types::ProcessId;

use super::command::TaskCommand;

const READ_CHUNK_SIZE: usize = 8192;

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The process ran and exited. `code` is `None` when it was terminated
    /// by a signal or its status could not be collected.
    Exited { code: Option<i32> },
    /// The process could not be started.
    SpawnFailed { error: String },
}

impl Outcome {
    /// Whether the process ran and exited with status 0.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Exited { code: Some(0) })
    }

    /// Whether the process never started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Outcome::SpawnFailed { .. })
    }

    /// Exit code, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Outcome::Exited { code } => *code,
            Outcome::SpawnFailed { .. } => None,
        }
    }
}

/// Lifecycle state of a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Done,
}

/// Notification that one process has finished.
#[derive(Debug, Clone)]
pub struct Completion {
    id: ProcessId,
    outcome: Outcome,
    output: Arc<[u8]>,
    duration: Duration,
}

impl Completion {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Combined stdout and stderr. Empty when the process printed nothing
    /// or never started.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output decoded as UTF-8, with invalid sequences replaced.
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Time from launch to completion.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// The manager's record of a launched process.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    /// Identifier assigned at launch.
    pub id: ProcessId,
    /// What was launched.
    pub command: TaskCommand,
    /// Directory the process ran in.
    pub working_dir: PathBuf,
    /// OS process id, if the spawn succeeded.
    pub os_pid: Option<u32>,
    /// Running or done.
    pub state: ProcessState,
    /// Set once the process is done.
    pub outcome: Option<Outcome>,
    /// Combined output; empty while running.
    pub output: Arc<[u8]>,
    /// Set once the process is done.
    pub duration: Option<Duration>,
}

/// Totals returned by [`TaskManager::wait`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitSummary {
    /// Completions delivered by this call.
    pub completed: usize,
    /// Processes among them that did not exit with status 0.
    pub failed: Vec<ProcessId>,
}

impl WaitSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

type CompletionCallback = Box<dyn FnMut(&Completion) + Send>;
type RecordMap = Arc<Mutex<HashMap<ProcessId, ProcessRecord>>>;

/// Launches child processes concurrently and reports their completion.
pub struct TaskManager {
    base_dir: PathBuf,
    environment: Environment,
    next_id: u64,
    records: RecordMap,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    callback: Option<CompletionCallback>,
    launched: usize,
    delivered: usize,
}

impl TaskManager {
    /// Create a manager whose processes run in `base_dir` by default.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            base_dir: base_dir.into(),
            environment: Environment::new(),
            next_id: 1,
            records: Arc::new(Mutex::new(HashMap::new())),
            completion_tx,
            completion_rx,
            callback: None,
            launched: 0,
            delivered: 0,
        }
    }

    /// Add variables on top of the inherited environment of every process.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Get the base working directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Register the completion callback.
    ///
    /// The callback runs inside [`wait`](Self::wait), once per completion, in
    /// completion order. Registering again replaces the previous callback;
    /// completions not yet delivered go to the new one.
    pub fn on_completion<F>(&mut self, callback: F)
    where
        F: FnMut(&Completion) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Launch `command` in the base directory (or its own override).
    ///
    /// Returns as soon as the process is spawned. Must be called from within
    /// a tokio runtime.
    pub fn launch(&mut self, command: impl Into<TaskCommand>) -> ProcessId {
        let command = command.into();
        let id = ProcessId::new(self.next_id);
        self.next_id += 1;
        self.launched += 1;

        let working_dir = command.resolve_dir(&self.base_dir);
        let started = Instant::now();

        let spawned = match command.to_command(&working_dir, &self.environment) {
            Some(mut cmd) => cmd.spawn().map_err(|e| spawn_error(&e, &working_dir)),
            None => Err("empty command".to_string()),
        };

        let os_pid = spawned.as_ref().ok().and_then(|child| child.id());
        debug!(process = %id, command = %command, dir = %working_dir.display(), "launching");

        lock(&self.records).insert(
            id,
            ProcessRecord {
                id,
                command: command.clone(),
                working_dir,
                os_pid,
                state: ProcessState::Running,
                outcome: None,
                output: Arc::from(Vec::new()),
                duration: None,
            },
        );

        match spawned {
            Ok(child) => {
                let records = Arc::clone(&self.records);
                let tx = self.completion_tx.clone();
                let span = info_span!("watcher", process = %id);
                tokio::spawn(watch(id, child, started, records, tx).instrument(span));
            }
            Err(error) => {
                warn!(process = %id, command = %command, error = %error, "failed to spawn");
                finish(
                    &self.records,
                    &self.completion_tx,
                    id,
                    Outcome::SpawnFailed { error },
                    Vec::new(),
                    started.elapsed(),
                );
            }
        }

        id
    }

    /// Launch `command` in `dir`, resolved against the base directory.
    pub fn launch_in(
        &mut self,
        command: impl Into<TaskCommand>,
        dir: impl Into<PathBuf>,
    ) -> ProcessId {
        self.launch(command.into().working_dir(dir))
    }

    /// Wait for the next process to finish.
    ///
    /// Returns `None` once every launched process has been delivered. A
    /// completion taken here is not passed to the registered callback.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.delivered == self.launched {
            return None;
        }
        // The manager holds a sender, so the channel never closes while
        // completions are outstanding.
        let completion = self.completion_rx.recv().await?;
        self.delivered += 1;
        Some(completion)
    }

    /// Block until every launched process has finished and its completion
    /// has been handed to the callback.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait(&mut self) -> WaitSummary {
        let mut summary = WaitSummary::default();

        while let Some(completion) = self.next_completion().await {
            summary.completed += 1;
            if !completion.is_success() {
                summary.failed.push(completion.id());
            }
            if let Some(callback) = self.callback.as_mut() {
                callback(&completion);
            }
        }

        debug!(
            completed = summary.completed,
            failed = summary.failed.len(),
            "all processes finished"
        );
        summary
    }

    /// Snapshot of a process record.
    pub fn record(&self, id: ProcessId) -> Option<ProcessRecord> {
        lock(&self.records).get(&id).cloned()
    }

    /// Combined output captured for a process. Empty while it is running.
    pub fn output(&self, id: ProcessId) -> Option<Arc<[u8]>> {
        lock(&self.records).get(&id).map(|r| Arc::clone(&r.output))
    }

    /// Whether a process has reached the done state.
    pub fn is_done(&self, id: ProcessId) -> bool {
        lock(&self.records)
            .get(&id)
            .is_some_and(|r| r.state == ProcessState::Done)
    }

    /// Number of processes launched over the manager's lifetime.
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Number of completions not yet delivered.
    pub fn pending(&self) -> usize {
        self.launched - self.delivered
    }
}

/// Watcher body: drain output, reap the process, report completion.
async fn watch(
    id: ProcessId,
    mut child: Child,
    started: Instant,
    records: RecordMap,
    tx: mpsc::UnboundedSender<Completion>,
) {
    let output = drain_merged(child.stdout.take(), child.stderr.take()).await;

    let outcome = match child.wait().await {
        Ok(status) => Outcome::Exited {
            code: status.code(),
        },
        Err(e) => {
            warn!(process = %id, error = %e, "failed to collect exit status");
            Outcome::Exited { code: None }
        }
    };

    debug!(process = %id, ?outcome, bytes = output.len(), "process finished");
    finish(&records, &tx, id, outcome, output, started.elapsed());
}

/// Mark the record done, then queue its completion.
fn finish(
    records: &RecordMap,
    tx: &mpsc::UnboundedSender<Completion>,
    id: ProcessId,
    outcome: Outcome,
    output: Vec<u8>,
    duration: Duration,
) {
    let output: Arc<[u8]> = Arc::from(output);

    if let Some(record) = lock(records).get_mut(&id) {
        record.state = ProcessState::Done;
        record.outcome = Some(outcome.clone());
        record.output = Arc::clone(&output);
        record.duration = Some(duration);
    }

    // The receiver lives in the manager; a send error means the manager is
    // gone and nobody is waiting.
    let _ = tx.send(Completion {
        id,
        outcome,
        output,
        duration,
    });
}

/// Read both pipes to EOF, appending chunks to one buffer as they arrive.
async fn drain_merged<O, E>(stdout: Option<O>, stderr: Option<E>) -> Vec<u8>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = stdout;
    let mut stderr = stderr;
    let mut buffer = Vec::new();
    let mut out_chunk = [0u8; READ_CHUNK_SIZE];
    let mut err_chunk = [0u8; READ_CHUNK_SIZE];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_chunk), if stdout.is_some() => {
                match read {
                    Ok(0) => stdout = None,
                    Ok(n) => buffer.extend_from_slice(&out_chunk[..n]),
                    Err(e) => {
                        debug!(error = %e, "stdout read failed");
                        stdout = None;
                    }
                }
            }
            read = read_chunk(&mut stderr, &mut err_chunk), if stderr.is_some() => {
                match read {
                    Ok(0) => stderr = None,
                    Ok(n) => buffer.extend_from_slice(&err_chunk[..n]),
                    Err(e) => {
                        debug!(error = %e, "stderr read failed");
                        stderr = None;
                    }
                }
            }
        }
    }

    buffer
}

async fn read_chunk<R>(reader: &mut Option<R>, chunk: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(chunk).await,
        None => std::future::pending().await,
    }
}

fn spawn_error(error: &io::Error, dir: &Path) -> String {
    if error.kind() == io::ErrorKind::NotFound && !dir.is_dir() {
        format!("working directory '{}' does not exist", dir.display())
    } else {
        error.to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
