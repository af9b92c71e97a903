//! One worker slot: a real OS child process running this same binary under
//! the hidden `--internal-worker` entry point, piped over stdin/stdout.
//!
//! Follows this workspace's process-actor convention
//! (`airssys-rt/src/osl/actors/process.rs`, since removed from this crate's
//! final tree): a task spawns and owns an OS child via
//! `std::process::Command`. Generalized here from a single fire-and-forget
//! process into a supervised, restartable, bidirectionally-piped worker
//! built on `tokio::process::Command`.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::PoolError;
use crate::model::{TaskStatus, WorkerKind, WorkerRecord, WorkerStatus};
use crate::wire::{WireResult, WireTask};

/// One supervised worker process plus its I/O pump tasks.
///
/// `spawn`/`restart` are the only ways to bring a process up; the previous
/// one (if any) is always torn down first, so the same `WorkerSlot` value
/// can live across many restarts while keeping its `worker_id` stable.
pub struct WorkerSlot {
    worker_id: u32,
    kind: WorkerKind,
    pid: Option<u32>,
    stdin_tx: mpsc::UnboundedSender<WireTask>,
    kill_tx: Option<oneshot::Sender<()>>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
    waiter_task: JoinHandle<()>,
    shared: WorkerShared,
}

/// Fields shared by reference between the slot's background tasks and
/// whatever owns the slot (the pool), so liveness/busy reads never need
/// `&mut` access to the process handle itself.
#[derive(Clone)]
struct WorkerShared {
    alive: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    produced_result: Arc<AtomicBool>,
    tasks_processed: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    last_activity: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            produced_result: Arc::new(AtomicBool::new(false)),
            tasks_processed: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
            last_activity: Arc::new(Mutex::new(None)),
        }
    }
}

impl WorkerSlot {
    /// Spawns worker `worker_id` of `kind` by re-invoking the current
    /// executable with the hidden internal-worker flags. `result_tx` is the
    /// pool-wide result channel; every worker's stdout reader forwards into
    /// it, tagged with its own `worker_id` (already present on `WireResult`).
    pub async fn spawn(
        worker_id: u32,
        kind: WorkerKind,
        result_tx: mpsc::UnboundedSender<WireResult>,
    ) -> Result<Self, PoolError> {
        let shared = WorkerShared::new();
        let spawned = spawn_process(worker_id, kind, result_tx, shared.clone()).await?;

        Ok(Self {
            worker_id,
            kind,
            pid: spawned.pid,
            stdin_tx: spawned.stdin_tx,
            kill_tx: Some(spawned.kill_tx),
            writer_task: spawned.writer_task,
            reader_task: spawned.reader_task,
            waiter_task: spawned.waiter_task,
            shared,
        })
    }

    /// Tears down the current process and pump tasks, then spawns a fresh
    /// one in their place, preserving the slot's `worker_id` and resetting
    /// its counters.
    pub async fn restart(&mut self, result_tx: mpsc::UnboundedSender<WireResult>) -> Result<(), PoolError> {
        self.terminate().await;

        let shared = WorkerShared::new();
        let spawned = spawn_process(self.worker_id, self.kind, result_tx, shared.clone()).await?;

        self.pid = spawned.pid;
        self.stdin_tx = spawned.stdin_tx;
        self.kill_tx = Some(spawned.kill_tx);
        self.writer_task = spawned.writer_task;
        self.reader_task = spawned.reader_task;
        self.waiter_task = spawned.waiter_task;
        self.shared = shared;
        Ok(())
    }

    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    pub fn produced_result(&self) -> bool {
        self.shared.produced_result.load(Ordering::SeqCst)
    }

    pub fn tasks_processed(&self) -> u64 {
        self.shared.tasks_processed.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> u64 {
        self.shared.errors.load(Ordering::SeqCst)
    }

    /// Dispatches a task to this worker's stdin pipe. Marks the worker busy
    /// immediately; the reader task clears it when the matching result
    /// arrives.
    pub fn dispatch(&self, task: WireTask) -> Result<(), PoolError> {
        self.shared.busy.store(true, Ordering::SeqCst);
        self.stdin_tx.send(task).map_err(|_| PoolError::WorkerSpawnFailed {
            worker_id: self.worker_id,
            kind: self.kind,
            source: std::io::Error::other("worker stdin pipe closed"),
        })
    }

    pub async fn record(&self) -> WorkerRecord {
        let status = if !self.is_alive() {
            WorkerStatus::Dead
        } else if self.is_busy() {
            WorkerStatus::Busy
        } else {
            WorkerStatus::Idle
        };
        WorkerRecord {
            worker_id: self.worker_id,
            kind: self.kind,
            status,
            tasks_processed: self.tasks_processed(),
            errors: self.errors(),
            last_activity: *self.shared.last_activity.lock().await,
        }
    }

    /// Best-effort graceful termination: drops the stdin sender (closing the
    /// pipe, which a worker blocked in its read loop observes as EOF), waits
    /// up to half of `grace`, escalates to `SIGTERM` on Unix for the
    /// remainder, then force-kills if the process still hasn't exited.
    pub async fn shutdown(&mut self, grace: std::time::Duration) {
        // Replacing the sender with a fresh, receiver-less one drops the
        // real stdin channel, closing the pipe so a worker blocked in its
        // read loop observes EOF.
        self.stdin_tx = mpsc::unbounded_channel().0;

        let half = grace / 2;
        let closed_pipe = tokio::time::timeout(half, async {
            while self.is_alive() {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await;

        if closed_pipe.is_ok() {
            self.abort_tasks();
            return;
        }

        self.send_sigterm();
        let termed = tokio::time::timeout(grace - half, async {
            while self.is_alive() {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await;

        if termed.is_err() {
            self.terminate().await;
        } else {
            self.abort_tasks();
        }
    }

    #[cfg(unix)]
    fn send_sigterm(&self) {
        let Some(pid) = self.pid else { return };
        let pid = nix::unistd::Pid::from_raw(pid as i32);
        if let Err(e) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
            tracing::warn!(worker_id = self.worker_id, error = %e, "SIGTERM delivery failed");
        }
    }

    #[cfg(not(unix))]
    fn send_sigterm(&self) {}

    async fn terminate(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        let _ = (&mut self.waiter_task).await;
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        self.writer_task.abort();
        self.reader_task.abort();
    }
}

struct SpawnedProcess {
    pid: Option<u32>,
    stdin_tx: mpsc::UnboundedSender<WireTask>,
    kill_tx: oneshot::Sender<()>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
    waiter_task: JoinHandle<()>,
}

async fn spawn_process(
    worker_id: u32,
    kind: WorkerKind,
    result_tx: mpsc::UnboundedSender<WireResult>,
    shared: WorkerShared,
) -> Result<SpawnedProcess, PoolError> {
    let exe = std::env::current_exe().map_err(|source| PoolError::WorkerSpawnFailed {
        worker_id,
        kind,
        source,
    })?;

    let mut child = Command::new(exe)
        .arg("--internal-worker")
        .arg(kind.as_str())
        .arg("--worker-id")
        .arg(worker_id.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PoolError::WorkerSpawnFailed { worker_id, kind, source })?;

    shared.alive.store(true, Ordering::SeqCst);
    let pid = child.id();

    let pipe_err = || PoolError::WorkerSpawnFailed {
        worker_id,
        kind,
        source: std::io::Error::other("spawned child is missing a piped stdio handle"),
    };
    let mut stdin = child.stdin.take().ok_or_else(pipe_err)?;
    let stdout = child.stdout.take().ok_or_else(pipe_err)?;

    let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<WireTask>();
    let writer_task = tokio::spawn(async move {
        while let Some(task) = stdin_rx.recv().await {
            let Ok(mut line) = serde_json::to_string(&task) else {
                continue;
            };
            line.push('\n');
            if stdin.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdin.flush().await.is_err() {
                break;
            }
        }
    });

    let reader_shared = shared.clone();
    let reader_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WireResult>(&line) {
                        Ok(result) => {
                            reader_shared.produced_result.store(true, Ordering::SeqCst);
                            reader_shared.busy.store(false, Ordering::SeqCst);
                            reader_shared.tasks_processed.fetch_add(1, Ordering::SeqCst);
                            if matches!(result.status, TaskStatus::Error) {
                                reader_shared.errors.fetch_add(1, Ordering::SeqCst);
                            }
                            *reader_shared.last_activity.lock().await = Some(Utc::now());
                            if result_tx.send(result).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(worker_id, error = %e, "worker emitted unparseable line");
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(worker_id, error = %e, "error reading worker stdout");
                    break;
                }
            }
        }
    });

    let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
    let waiter_shared = shared;
    let waiter_task = tokio::spawn(async move {
        tokio::select! {
            _ = &mut kill_rx => {
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
            status = child.wait() => {
                if let Err(e) = status {
                    tracing::warn!(worker_id, error = %e, "error waiting on worker process");
                }
            }
        }
        waiter_shared.alive.store(false, Ordering::SeqCst);
        waiter_shared.busy.store(false, Ordering::SeqCst);
    });

    Ok(SpawnedProcess {
        pid,
        stdin_tx,
        kill_tx,
        writer_task,
        reader_task,
        waiter_task,
    })
}
