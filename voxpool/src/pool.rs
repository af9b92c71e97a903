//! Owns N workers of one [`WorkerKind`], the bounded inbound queue, the
//! result channel, counters, and the restart/health-check path.
//!
//! Internal composition is grounded in `airssys_rt::supervisor::RestartBackoff`
//! (restart rate limiting, reused as-is rather than re-implemented) and
//! `airssys_rt::mailbox::metrics::AtomicMetrics` (atomic counter shape).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use airssys_rt::monitoring::{Monitor, SupervisionEvent, SupervisionEventKind};
use airssys_rt::supervisor::RestartBackoff;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;

use crate::error::PoolError;
use crate::model::{PoolState, Task, TaskStatus, WorkerKind, WorkerRecord};
use crate::monitor::TracingMonitor;
use crate::wire::{WireResult, WireTask};
use crate::worker_process::WorkerSlot;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub num_workers: u32,
    pub kind: WorkerKind,
    /// Bounded inbound queue capacity (default 1000).
    pub queue_capacity: usize,
    /// Consecutive initialization failures before a slot becomes
    /// permanently dead (default 5).
    pub max_init_failures: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 2,
            kind: WorkerKind::Stt,
            queue_capacity: 1000,
            max_init_failures: 5,
        }
    }
}

#[derive(Debug, Default)]
struct PoolCounters {
    tasks_submitted: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
}

/// A cloneable handle onto the pool's result stream, independent of the
/// `Pool` value itself. Callers waiting on a result hold only this, so a
/// slow wait never blocks other holders of the pool's own lock (metrics,
/// submission, the health sweep).
#[derive(Clone)]
pub struct ResultHandle {
    result_rx: Arc<TokioMutex<mpsc::UnboundedReceiver<WireResult>>>,
    counters: Arc<PoolCounters>,
}

impl ResultHandle {
    /// Pops one result, waiting up to `timeout`. Returns `None` (the
    /// protocol's `no_result` sentinel) if nothing arrives in time.
    pub async fn wait(&self, timeout: Duration) -> Option<crate::model::TaskResult> {
        let mut rx = self.result_rx.lock().await;
        let wire = tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()?;
        match wire.status {
            TaskStatus::Success => self.counters.tasks_completed.fetch_add(1, Ordering::SeqCst),
            TaskStatus::Error => self.counters.tasks_failed.fetch_add(1, Ordering::SeqCst),
        };
        Some(wire.into())
    }
}

/// The bounded inbound queue. A plain `std::sync::Mutex` around a `VecDeque`
/// rather than a channel: `submit` needs an honest, immediate "is it full"
/// answer against the *true* outstanding depth, not just the transient gap
/// before the next dispatch tick drains a channel buffer.
struct SharedQueue {
    capacity: usize,
    deque: StdMutex<VecDeque<Task>>,
}

impl SharedQueue {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            deque: StdMutex::new(VecDeque::new()),
        }
    }

    fn try_push(&self, task: Task) -> Result<(), PoolError> {
        let mut deque = self.deque.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if deque.len() >= self.capacity {
            return Err(PoolError::QueueFull { capacity: self.capacity });
        }
        deque.push_back(task);
        Ok(())
    }

    fn len(&self) -> usize {
        self.deque.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

pub struct Pool {
    config: PoolConfig,
    queue: Arc<SharedQueue>,
    result_tx: mpsc::UnboundedSender<WireResult>,
    slots: Arc<TokioMutex<Vec<WorkerSlot>>>,
    backoffs: Vec<RestartBackoff>,
    dead_permanently: Vec<bool>,
    dispatch_task: JoinHandle<()>,
    counters: Arc<PoolCounters>,
    result_handle: ResultHandle,
    monitor: TracingMonitor,
    supervisor_id: String,
}

impl Pool {
    /// Spawns `config.num_workers` workers and returns only after every
    /// worker has been spawned, though not necessarily initialized.
    pub async fn start(config: PoolConfig, monitor: TracingMonitor, supervisor_id: String) -> Result<Self, PoolError> {
        let (result_tx, result_rx) = mpsc::unbounded_channel::<WireResult>();

        let mut slots_vec = Vec::with_capacity(config.num_workers as usize);
        for worker_id in 0..config.num_workers {
            let slot = WorkerSlot::spawn(worker_id, config.kind, result_tx.clone()).await?;
            let _ = monitor.record(started_event(&supervisor_id, worker_id)).await;
            slots_vec.push(slot);
        }

        let slots = Arc::new(TokioMutex::new(slots_vec));
        let queue = Arc::new(SharedQueue::new(config.queue_capacity));
        let dispatch_task = tokio::spawn(dispatch_loop(queue.clone(), slots.clone()));

        let backoffs = (0..config.num_workers)
            .map(|_| RestartBackoff::new(5, Duration::from_secs(60)))
            .collect();
        let dead_permanently = vec![false; config.num_workers as usize];
        let counters = Arc::new(PoolCounters::default());
        let result_handle = ResultHandle {
            result_rx: Arc::new(TokioMutex::new(result_rx)),
            counters: counters.clone(),
        };

        Ok(Self {
            config,
            queue,
            result_tx,
            slots,
            backoffs,
            dead_permanently,
            dispatch_task,
            counters,
            result_handle,
            monitor,
            supervisor_id,
        })
    }

    /// Returns a cloneable handle for waiting on results independent of the
    /// pool's own lock, so a caller blocked in a long wait never starves
    /// other holders of `Arc<Mutex<Pool>>` (the health sweep in particular).
    pub fn result_handle(&self) -> ResultHandle {
        self.result_handle.clone()
    }

    pub fn kind(&self) -> WorkerKind {
        self.config.kind
    }

    pub fn num_workers(&self) -> u32 {
        self.config.num_workers
    }

    /// Enqueues a task non-blockingly. Returns submission latency in
    /// milliseconds. Fails with `QueueFull` if the inbound queue is at
    /// capacity — never blocks, so submission stays fast.
    pub fn submit(&self, task_id: String, payload: serde_json::Value, priority: u32) -> Result<f64, PoolError> {
        let started = std::time::Instant::now();
        let task = Task {
            task_id,
            kind: self.config.kind,
            payload,
            priority,
            submitted_at: Utc::now(),
        };
        self.queue.try_push(task)?;
        self.counters.tasks_submitted.fetch_add(1, Ordering::SeqCst);
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    /// Reads counters and probes worker liveness. Never blocks on a queue.
    pub async fn metrics(&self) -> PoolState {
        let slots = self.slots.lock().await;
        let alive_workers = slots.iter().filter(|s| s.is_alive()).count() as u32;
        PoolState {
            tasks_submitted: self.counters.tasks_submitted.load(Ordering::SeqCst),
            tasks_completed: self.counters.tasks_completed.load(Ordering::SeqCst),
            tasks_failed: self.counters.tasks_failed.load(Ordering::SeqCst),
            queue_depth: self.queue.len(),
            alive_workers,
        }
    }

    pub async fn worker_records(&self) -> Vec<WorkerRecord> {
        let slots = self.slots.lock().await;
        let mut out = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.iter().enumerate() {
            let mut record = slot.record().await;
            if self.dead_permanently[idx] {
                record.status = crate::model::WorkerStatus::DeadPermanently;
            }
            out.push(record);
        }
        out
    }

    /// For each dead worker: replaces it with a fresh process at the same
    /// `worker_id`. Consecutive initialization failures (the worker died
    /// without ever producing a result) escalate an exponential backoff;
    /// after `max_init_failures` such failures the slot becomes permanently
    /// dead and is no longer auto-restarted.
    pub async fn health_check(&mut self) {
        let mut slots = self.slots.lock().await;
        for idx in 0..slots.len() {
            if self.dead_permanently[idx] {
                continue;
            }
            if slots[idx].is_alive() {
                continue;
            }

            let worker_id = slots[idx].worker_id();
            let had_result = slots[idx].produced_result();

            if had_result {
                // Died after operating successfully at least once: not a
                // deterministic init failure, restart promptly and reset
                // this slot's backoff bookkeeping.
                self.backoffs[idx] = RestartBackoff::new(5, Duration::from_secs(60));
            } else {
                if self.backoffs[idx].is_limit_exceeded() {
                    self.dead_permanently[idx] = true;
                    tracing::error!(worker_id, "worker permanently dead after repeated init failures");
                    let _ = self
                        .monitor
                        .record(restart_limit_event(&self.supervisor_id, worker_id))
                        .await;
                    continue;
                }
                let delay = self.backoffs[idx].calculate_delay();
                self.backoffs[idx].record_restart();
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
            }

            match slots[idx].restart(self.result_tx.clone()).await {
                Ok(()) => {
                    tracing::info!(worker_id, "worker restarted");
                    let _ = self
                        .monitor
                        .record(restarted_event(&self.supervisor_id, worker_id, idx as u32))
                        .await;
                }
                Err(e) => {
                    tracing::warn!(worker_id, error = %e, "failed to restart worker, will retry next sweep");
                }
            }
        }
    }

    /// Tears down every worker within `grace`, escalating to forceful
    /// termination. Idempotent: a second call just finds every worker
    /// already dead.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<(), PoolError> {
        self.dispatch_task.abort();
        let mut slots = self.slots.lock().await;
        let shutdowns = slots.iter_mut().map(|slot| slot.shutdown(grace));
        futures::future::join_all(shutdowns).await;
        Ok(())
    }
}

/// Assigns queued tasks to idle workers. Real OS processes each own a
/// private, unshared stdin pipe, so "workers race to dequeue" is realized
/// here as the pool actively matching queue head to the next idle worker,
/// rather than a literal multi-consumer channel.
async fn dispatch_loop(queue: Arc<SharedQueue>, slots: Arc<TokioMutex<Vec<WorkerSlot>>>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(5));
    loop {
        ticker.tick().await;

        if queue.len() == 0 {
            continue;
        }

        let slots_guard = slots.lock().await;
        loop {
            let idle = slots_guard.iter().find(|s| s.is_alive() && !s.is_busy());
            let Some(slot) = idle else { break };

            let task = {
                let mut deque = queue.deque.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                deque.pop_front()
            };
            let Some(task) = task else { break };

            let wire = WireTask {
                task_id: task.task_id,
                kind: task.kind,
                payload: task.payload,
                submitted_at: task.submitted_at,
            };
            if let Err(e) = slot.dispatch(wire) {
                tracing::warn!(error = %e, "failed to dispatch task to worker");
            }
        }
    }
}

fn started_event(supervisor_id: &str, worker_id: u32) -> SupervisionEvent {
    SupervisionEvent {
        timestamp: Utc::now(),
        supervisor_id: supervisor_id.to_string(),
        child_id: Some(worker_id.to_string()),
        event_kind: SupervisionEventKind::ChildStarted,
        metadata: HashMap::new(),
    }
}

fn restarted_event(supervisor_id: &str, worker_id: u32, restart_count: u32) -> SupervisionEvent {
    SupervisionEvent {
        timestamp: Utc::now(),
        supervisor_id: supervisor_id.to_string(),
        child_id: Some(worker_id.to_string()),
        event_kind: SupervisionEventKind::ChildRestarted { restart_count },
        metadata: HashMap::new(),
    }
}

fn restart_limit_event(supervisor_id: &str, worker_id: u32) -> SupervisionEvent {
    SupervisionEvent {
        timestamp: Utc::now(),
        supervisor_id: supervisor_id.to_string(),
        child_id: Some(worker_id.to_string()),
        event_kind: SupervisionEventKind::RestartLimitExceeded {
            restart_count: 5,
            window: Duration::from_secs(60),
        },
        metadata: HashMap::new(),
    }
}
